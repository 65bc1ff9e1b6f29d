//! Reply parsing for provider output.
//!
//! Replies are treated as hostile input: JSON is extracted from surrounding
//! prose, fields are defaulted when absent, labels are matched loosely, and
//! numbers are rounded from whatever the model sent. Anything that still
//! fails here becomes the caller's fallback path, never a crash.
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{MAX_EVENT_OPTIONS, MIN_EVENT_OPTIONS};
use crate::effect::{EffectVector, Timeframe};
use crate::event::{Complexity, EventOption, Ideology, Stance, Urgency};
use crate::numbers::round_f64_to_i32;

/// Extract the first JSON object `{...}` from a string that may contain
/// surrounding text.
#[must_use]
pub fn extract_first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&s[start..=end])
}

/// Ways a provider reply can fail validation.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJsonObject,
    #[error("reply JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reply missing required field {field}")]
    MissingField { field: &'static str },
    #[error("option slate out of range: {count}")]
    OptionCount { count: usize },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct EffectDto {
    approval: f64,
    gdp: f64,
    debt: f64,
    technology: f64,
    environment: f64,
    market_index: f64,
    exchange_rate: f64,
    diplomacy: f64,
}

impl EffectDto {
    fn rounded(self) -> EffectVector {
        EffectVector {
            approval: round_f64_to_i32(self.approval),
            gdp: round_f64_to_i32(self.gdp),
            debt: round_f64_to_i32(self.debt),
            technology: round_f64_to_i32(self.technology),
            environment: round_f64_to_i32(self.environment),
            market_index: round_f64_to_i32(self.market_index),
            exchange_rate: round_f64_to_i32(self.exchange_rate),
            diplomacy: round_f64_to_i32(self.diplomacy),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OptionDto {
    text: String,
    ideology: String,
    stance: String,
    effects: EffectDto,
    policy_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EventDto {
    title: String,
    description: String,
    category: String,
    urgency: String,
    complexity: String,
    background: String,
    stakeholders: Vec<String>,
    time_constraint: Option<String>,
    options: Vec<OptionDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AnalysisDto {
    effects: EffectDto,
    reasoning: String,
    confidence: f64,
    timeframe: String,
    risks: Vec<String>,
    opportunities: Vec<String>,
}

/// A generated event before the director mints its id and provenance.
/// Option effects are still raw; normalization happens downstream.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub complexity: Complexity,
    pub background: String,
    pub stakeholders: SmallVec<[String; 4]>,
    pub time_constraint: Option<String>,
    pub options: Vec<EventOption>,
}

/// A policy impact reply before the analyzer normalizes the effects.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub effects: EffectVector,
    pub reasoning: String,
    pub confidence: u8,
    pub timeframe: Timeframe,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
}

fn parse_urgency_loose(s: &str) -> Urgency {
    match s.trim().to_ascii_lowercase().as_str() {
        "low" => Urgency::Low,
        "high" => Urgency::High,
        "critical" => Urgency::Critical,
        _ => Urgency::Medium,
    }
}

fn parse_complexity_loose(s: &str) -> Complexity {
    match s.trim().to_ascii_lowercase().as_str() {
        "simple" => Complexity::Simple,
        "complex" => Complexity::Complex,
        _ => Complexity::Moderate,
    }
}

fn parse_stance_loose(s: &str) -> Stance {
    match s.trim().to_ascii_lowercase().as_str() {
        "aggressive" => Stance::Aggressive,
        "cautious" => Stance::Cautious,
        _ => Stance::Moderate,
    }
}

fn parse_timeframe_loose(s: &str) -> Timeframe {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "immediate" => Timeframe::Immediate,
        "long_term" | "longterm" => Timeframe::LongTerm,
        _ => Timeframe::ShortTerm,
    }
}

/// Parse and validate an event reply.
///
/// Oversized option slates are trimmed to the cap; undersized ones are a
/// schema violation the caller answers with its fallback template.
///
/// # Errors
///
/// Returns a [`ParseError`] when no JSON object is present, the JSON does
/// not deserialize, required text fields are empty, or fewer than the
/// minimum number of usable options remain.
pub fn parse_event_reply(reply: &str) -> Result<ParsedEvent, ParseError> {
    let json = extract_first_json_object(reply).ok_or(ParseError::NoJsonObject)?;
    let dto: EventDto = serde_json::from_str(json)?;

    let title = dto.title.trim().to_string();
    if title.is_empty() {
        return Err(ParseError::MissingField { field: "title" });
    }
    let description = dto.description.trim().to_string();
    if description.is_empty() {
        return Err(ParseError::MissingField {
            field: "description",
        });
    }

    let mut options: Vec<EventOption> = dto
        .options
        .into_iter()
        .filter(|o| !o.text.trim().is_empty())
        .map(|o| EventOption {
            text: o.text.trim().to_string(),
            ideology: o.ideology.parse::<Ideology>().unwrap_or_default(),
            stance: parse_stance_loose(&o.stance),
            effects: o.effects.rounded(),
            policy_note: o.policy_note.filter(|n| !n.trim().is_empty()),
        })
        .collect();
    if options.len() > MAX_EVENT_OPTIONS {
        options.truncate(MAX_EVENT_OPTIONS);
    }
    if options.len() < MIN_EVENT_OPTIONS {
        return Err(ParseError::OptionCount {
            count: options.len(),
        });
    }

    Ok(ParsedEvent {
        title,
        description,
        category: dto.category.trim().to_string(),
        urgency: parse_urgency_loose(&dto.urgency),
        complexity: parse_complexity_loose(&dto.complexity),
        background: dto.background.trim().to_string(),
        stakeholders: dto
            .stakeholders
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        time_constraint: dto.time_constraint.filter(|t| !t.trim().is_empty()),
        options,
    })
}

/// Parse and validate a policy analysis reply.
///
/// # Errors
///
/// Returns a [`ParseError`] when no JSON object is present or the JSON does
/// not deserialize. Everything else is coerced: confidence is clamped to
/// 0..=100 and the risk/opportunity lists are trimmed to three entries.
pub fn parse_analysis_reply(reply: &str) -> Result<ParsedAnalysis, ParseError> {
    let json = extract_first_json_object(reply).ok_or(ParseError::NoJsonObject)?;
    let dto: AnalysisDto = serde_json::from_str(json)?;

    let confidence = round_f64_to_i32(dto.confidence).clamp(0, 100);
    let confidence = u8::try_from(confidence).unwrap_or(0);

    let mut risks = dto.risks;
    risks.retain(|r| !r.trim().is_empty());
    risks.truncate(3);
    let mut opportunities = dto.opportunities;
    opportunities.retain(|o| !o.trim().is_empty());
    opportunities.truncate(3);

    Ok(ParsedAnalysis {
        effects: dto.effects.rounded(),
        reasoning: dto.reasoning.trim().to_string(),
        confidence,
        timeframe: parse_timeframe_loose(&dto.timeframe),
        risks,
        opportunities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT_REPLY: &str = r#"Here is the event you asked for:
    {
        "title": "Dockworkers Walk Out",
        "description": "Container traffic at the main port has stopped.",
        "category": "economy",
        "urgency": "HIGH",
        "complexity": "moderate",
        "options": [
            { "text": "Send in mediators", "ideology": "Centrist", "stance": "cautious",
              "effects": { "approval": 2.4, "gdp": -3 } },
            { "text": "Legislate them back to work", "ideology": "authoritarian",
              "stance": "aggressive", "effects": { "approval": -8, "gdp": 5 } },
            { "text": "Back the union demands", "ideology": "progressive",
              "stance": "moderate", "effects": { "approval": 6, "debt": 20 } }
        ]
    }
    Hope this helps!"#;

    #[test]
    fn event_reply_parses_through_surrounding_prose() {
        let event = parse_event_reply(EVENT_REPLY).unwrap();
        assert_eq!(event.title, "Dockworkers Walk Out");
        assert_eq!(event.urgency, Urgency::High);
        assert_eq!(event.options.len(), 3);
        assert_eq!(event.options[0].ideology, Ideology::Centrist);
        assert_eq!(event.options[0].effects.approval, 2);
        assert_eq!(event.options[1].stance, Stance::Aggressive);
    }

    #[test]
    fn short_slate_is_a_schema_violation() {
        let reply = r#"{"title": "T", "description": "D",
            "options": [{ "text": "only" }, { "text": "  " }]}"#;
        let err = parse_event_reply(reply).unwrap_err();
        assert!(matches!(err, ParseError::OptionCount { count: 1 }));
    }

    #[test]
    fn oversized_slate_is_trimmed_to_cap() {
        let options: Vec<String> = (0..14)
            .map(|i| format!(r#"{{ "text": "option {i}" }}"#))
            .collect();
        let reply = format!(
            r#"{{"title": "T", "description": "D", "options": [{}]}}"#,
            options.join(",")
        );
        let event = parse_event_reply(&reply).unwrap();
        assert_eq!(event.options.len(), MAX_EVENT_OPTIONS);
    }

    #[test]
    fn blank_title_is_rejected() {
        let reply = r#"{"title": "  ", "description": "D",
            "options": [{"text":"a"},{"text":"b"},{"text":"c"}]}"#;
        assert!(matches!(
            parse_event_reply(reply),
            Err(ParseError::MissingField { field: "title" })
        ));
    }

    #[test]
    fn prose_without_json_is_rejected() {
        assert!(matches!(
            parse_event_reply("I cannot answer that."),
            Err(ParseError::NoJsonObject)
        ));
    }

    #[test]
    fn analysis_reply_coerces_out_of_band_values() {
        let reply = r#"{
            "effects": { "approval": 4.6, "gdp": 12 },
            "reasoning": "Stimulus lifts demand.",
            "confidence": 240,
            "timeframe": "long-term",
            "risks": ["inflation", "", "crowding out", "rate pressure", "overheating"],
            "opportunities": []
        }"#;
        let analysis = parse_analysis_reply(reply).unwrap();
        assert_eq!(analysis.effects.approval, 5);
        assert_eq!(analysis.confidence, 100);
        assert_eq!(analysis.timeframe, Timeframe::LongTerm);
        assert_eq!(analysis.risks.len(), 3);
        assert!(analysis.opportunities.is_empty());
    }

    #[test]
    fn unknown_labels_fall_back_to_defaults() {
        let reply = r#"{"title": "T", "description": "D", "urgency": "apocalyptic",
            "options": [
                {"text":"a", "ideology": "royalist", "stance": "bold"},
                {"text":"b"}, {"text":"c"}
            ]}"#;
        let event = parse_event_reply(reply).unwrap();
        assert_eq!(event.urgency, Urgency::Medium);
        assert_eq!(event.options[0].ideology, Ideology::Centrist);
        assert_eq!(event.options[0].stance, Stance::Moderate);
    }
}
