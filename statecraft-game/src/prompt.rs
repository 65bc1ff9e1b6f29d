//! Prompt assembly for the generation and analysis endpoints.
//!
//! Every prompt ends with a strict single-JSON-object contract so replies
//! from any backend (including the static composer) go through one parser.
use crate::constants::{
    BOUND_APPROVAL, BOUND_DEBT, BOUND_DIPLOMACY, BOUND_ENVIRONMENT, BOUND_EXCHANGE_RATE,
    BOUND_GDP, BOUND_MARKET_INDEX, BOUND_TECHNOLOGY, MAX_EVENT_OPTIONS, MIN_EVENT_OPTIONS,
    PROMPT_HISTORY_WINDOW,
};
use crate::event::CrisisArchetype;
use crate::state::{ChoiceRecord, NationalState, TrendSnapshot};

const EVENT_CONTRACT: &str = concat!(
    "Return ONLY a JSON object: {\"title\": string, \"description\": string, ",
    "\"category\": string, \"urgency\": \"low|medium|high|critical\", ",
    "\"complexity\": \"simple|moderate|complex\", \"options\": [{\"text\": string, ",
    "\"ideology\": string, \"stance\": \"aggressive|moderate|cautious\", ",
    "\"effects\": {\"approval\": int, \"gdp\": int, \"debt\": int, \"technology\": int, ",
    "\"environment\": int, \"market_index\": int, \"exchange_rate\": int, ",
    "\"diplomacy\": int}}]}\n",
);

const ANALYSIS_CONTRACT: &str = concat!(
    "Return ONLY a JSON object: {\"effects\": {\"approval\": int, \"gdp\": int, ",
    "\"debt\": int, \"technology\": int, \"environment\": int, \"market_index\": int, ",
    "\"exchange_rate\": int, \"diplomacy\": int}, \"reasoning\": string, ",
    "\"confidence\": int, \"timeframe\": \"immediate|short_term|long_term\", ",
    "\"risks\": [string], \"opportunities\": [string]}\n",
);

/// Which reply shape a prompt demands. The static composer keys off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptKind {
    Event,
    Analysis,
}

pub(crate) fn classify(prompt: &str) -> PromptKind {
    if prompt.contains("\"options\"") {
        PromptKind::Event
    } else {
        PromptKind::Analysis
    }
}

/// Everything the generation prompts are allowed to see.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub state: &'a NationalState,
    pub trend: TrendSnapshot,
    pub history: &'a [ChoiceRecord],
}

fn push_bounds_line(s: &mut String) {
    s.push_str(&format!(
        "Keep every effect delta within: approval +/-{BOUND_APPROVAL}, gdp +/-{BOUND_GDP}, \
         debt +/-{BOUND_DEBT}, technology +/-{BOUND_TECHNOLOGY}, \
         environment +/-{BOUND_ENVIRONMENT}, market_index +/-{BOUND_MARKET_INDEX}, \
         exchange_rate +/-{BOUND_EXCHANGE_RATE}, diplomacy +/-{BOUND_DIPLOMACY}.\n"
    ));
}

fn push_state_block(s: &mut String, state: &NationalState, trend: TrendSnapshot) {
    s.push_str("STATE:\n");
    s.push_str(&format!(
        "approval={} gdp={} debt={} technology={} environment={}\n",
        state.approval, state.gdp, state.debt, state.technology, state.environment
    ));
    s.push_str(&format!(
        "market_index={} exchange_rate={} diplomacy={}\n",
        state.market_index, state.exchange_rate, state.diplomacy
    ));
    s.push_str(&format!(
        "turn={}/{} phase={}\n",
        state.turn,
        state.turn_limit,
        state.phase()
    ));
    s.push_str("TRENDS:\n");
    s.push_str(&format!(
        "approval={} economy={} risk={}\n",
        trend.approval_trend, trend.economic_trend, trend.risk
    ));
}

fn push_history_block(s: &mut String, history: &[ChoiceRecord]) {
    let window = history
        .len()
        .saturating_sub(PROMPT_HISTORY_WINDOW);
    let recent = &history[window..];
    if recent.is_empty() {
        return;
    }
    s.push_str("RECENT DECISIONS:\n");
    for record in recent {
        s.push_str(&format!(
            "turn {}: {} -> {} ({})\n",
            record.turn, record.title, record.option_text, record.ideology
        ));
    }
}

/// Prompt for an ordinary generated event.
#[must_use]
pub fn build_event_prompt(ctx: &PromptContext<'_>) -> String {
    let mut s = String::with_capacity(1024);
    s.push_str("You are the scenario writer for a political leadership simulation.\n");
    s.push_str(
        "Your task: draft the next domestic or international event the administration faces.\n",
    );
    s.push_str(EVENT_CONTRACT);
    s.push_str(&format!(
        "Provide between {MIN_EVENT_OPTIONS} and {MAX_EVENT_OPTIONS} options with distinct ideological angles.\n"
    ));
    push_bounds_line(&mut s);
    s.push_str("Do not include any other text.\n\n");
    push_state_block(&mut s, ctx.state, ctx.trend);
    push_history_block(&mut s, ctx.history);
    s.push_str("\nAvoid repeating the topics of the recent decisions above.\n");
    s
}

/// Prompt for an emergency event biased toward one crisis family.
#[must_use]
pub fn build_emergency_prompt(ctx: &PromptContext<'_>, archetype: CrisisArchetype) -> String {
    let mut s = String::with_capacity(1024);
    s.push_str("You are the scenario writer for a political leadership simulation.\n");
    s.push_str("Your task: draft a breaking emergency the administration must answer now.\n");
    s.push_str(EVENT_CONTRACT);
    s.push_str(&format!(
        "Provide between {MIN_EVENT_OPTIONS} and {MAX_EVENT_OPTIONS} options with distinct ideological angles.\n"
    ));
    push_bounds_line(&mut s);
    s.push_str("Set urgency to high or critical.\n");
    s.push_str("Do not include any other text.\n\n");
    s.push_str(&format!(
        "EMERGENCY: {} - {}\n\n",
        archetype.display_name(),
        archetype.prompt_theme()
    ));
    push_state_block(&mut s, ctx.state, ctx.trend);
    push_history_block(&mut s, ctx.history);
    s
}

/// Prompt asking for the projected impact of a free-text policy decision.
#[must_use]
pub fn build_analysis_prompt(ctx: &PromptContext<'_>, policy_text: &str) -> String {
    let mut s = String::with_capacity(1024);
    s.push_str("You are the chief policy analyst for a political leadership simulation.\n");
    s.push_str("Your task: project the national impact of the policy decision below.\n");
    s.push_str(ANALYSIS_CONTRACT);
    push_bounds_line(&mut s);
    s.push_str("List at most 3 risks and at most 3 opportunities.\n");
    s.push_str("Do not include any other text.\n\n");
    push_state_block(&mut s, ctx.state, ctx.trend);
    push_history_block(&mut s, ctx.history);
    s.push_str("POLICY:\n");
    s.push_str(policy_text.trim());
    s.push('\n');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectVector;
    use crate::event::Ideology;

    fn record(turn: u32, title: &str) -> ChoiceRecord {
        ChoiceRecord {
            turn,
            event_id: format!("evt-{turn}"),
            title: title.to_string(),
            option_text: "hold course".to_string(),
            ideology: Ideology::Centrist,
            effects: EffectVector::default(),
        }
    }

    #[test]
    fn prompts_classify_by_contract() {
        let state = NationalState::default();
        let trend = TrendSnapshot::default();
        let ctx = PromptContext {
            state: &state,
            trend,
            history: &[],
        };
        assert_eq!(classify(&build_event_prompt(&ctx)), PromptKind::Event);
        assert_eq!(
            classify(&build_emergency_prompt(&ctx, CrisisArchetype::CivilUnrest)),
            PromptKind::Event
        );
        assert_eq!(
            classify(&build_analysis_prompt(&ctx, "freeze rents")),
            PromptKind::Analysis
        );
    }

    #[test]
    fn event_prompt_embeds_state_and_caps_history() {
        let state = NationalState {
            approval: 33,
            market_index: 11_500,
            ..NationalState::default()
        };
        let history: Vec<ChoiceRecord> =
            (1..=8).map(|t| record(t, &format!("Event {t}"))).collect();
        let ctx = PromptContext {
            state: &state,
            trend: TrendSnapshot::default(),
            history: &history,
        };
        let prompt = build_event_prompt(&ctx);
        assert!(prompt.contains("approval=33"));
        assert!(prompt.contains("market_index=11500"));
        assert!(!prompt.contains("Event 3"), "window too wide");
        assert!(prompt.contains("Event 4"));
        assert!(prompt.contains("Event 8"));
    }

    #[test]
    fn emergency_prompt_names_the_archetype() {
        let state = NationalState::default();
        let ctx = PromptContext {
            state: &state,
            trend: TrendSnapshot::default(),
            history: &[],
        };
        let prompt = build_emergency_prompt(&ctx, CrisisArchetype::EconomicShock);
        assert!(prompt.contains("Economic Shock"));
        assert!(prompt.contains("financial shock"));
    }
}
