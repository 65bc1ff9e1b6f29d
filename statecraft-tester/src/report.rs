//! Report rendering for scenario results.
//!
//! Every renderer writes to a caller-supplied sink so the same code path
//! serves stdout and `--output` files.
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::sim::ScenarioResult;

/// Failures printed per scenario before the console report truncates.
const MAX_SHOWN_FAILURES: usize = 5;

/// Roll-up across all scenarios of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_scenarios: usize,
    pub passed_scenarios: usize,
    pub total_iterations: u32,
    pub successful_iterations: u32,
    /// Successful iterations as a percentage of all iterations.
    pub pass_rate: f64,
    pub acceptance_threshold: u32,
    pub acceptable: bool,
}

/// Top-level document for the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub results: Vec<ScenarioResult>,
}

#[must_use]
pub fn summarize(results: &[ScenarioResult], acceptance: u32) -> ReportSummary {
    let total_iterations: u32 = results.iter().map(|r| r.iterations_run).sum();
    let successful_iterations: u32 = results.iter().map(|r| r.successful_iterations).sum();
    let pass_rate = if total_iterations == 0 {
        0.0
    } else {
        f64::from(successful_iterations) / f64::from(total_iterations) * 100.0
    };
    ReportSummary {
        total_scenarios: results.len(),
        passed_scenarios: results.iter().filter(|r| r.passed).count(),
        total_iterations,
        successful_iterations,
        pass_rate,
        acceptance_threshold: acceptance,
        acceptable: total_iterations > 0 && pass_rate >= f64::from(acceptance),
    }
}

/// Human-facing report with per-scenario lines and a verdict banner.
///
/// # Errors
///
/// Returns an error when the sink refuses a write.
pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    acceptance: u32,
) -> Result<()> {
    let summary = summarize(results, acceptance);
    let bar = "═".repeat(56);

    writeln!(out, "{}", bar.cyan())?;
    writeln!(out, " {}", "Scenario results".cyan().bold())?;
    writeln!(out, "{}", bar.cyan())?;
    for result in results {
        let mark = if result.passed { "✅" } else { "❌" };
        let counts = format!("{}/{}", result.successful_iterations, result.iterations_run);
        writeln!(
            out,
            " {mark} {:<22} {:>7}  avg {} ms",
            result.scenario_name,
            counts,
            result.average_duration.as_millis()
        )?;
        for failure in result.failures.iter().take(MAX_SHOWN_FAILURES) {
            writeln!(out, "      {}", failure.red())?;
        }
        let hidden = result.failures.len().saturating_sub(MAX_SHOWN_FAILURES);
        if hidden > 0 {
            writeln!(out, "      ({hidden} more not shown)")?;
        }
    }
    writeln!(out, "{}", "─".repeat(56))?;
    writeln!(
        out,
        " scenarios:  {}/{} passed",
        summary.passed_scenarios, summary.total_scenarios
    )?;
    writeln!(
        out,
        " iterations: {}/{} passed ({:.1}%)",
        summary.successful_iterations, summary.total_iterations, summary.pass_rate
    )?;
    let verdict = if summary.acceptable {
        "ACCEPTED".green().bold()
    } else {
        "REJECTED".red().bold()
    };
    writeln!(
        out,
        " acceptance: {}% required, verdict {verdict}",
        summary.acceptance_threshold
    )?;
    Ok(())
}

/// Machine-readable report: one pretty-printed [`ReportDocument`].
///
/// # Errors
///
/// Returns an error when serialization fails or the sink refuses a write.
pub fn generate_json_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    acceptance: u32,
) -> Result<()> {
    let document = ReportDocument {
        generated_at: Utc::now(),
        summary: summarize(results, acceptance),
        results: results.to_vec(),
    };
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}

/// Markdown report suitable for CI job summaries.
///
/// # Errors
///
/// Returns an error when the sink refuses a write.
pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    acceptance: u32,
) -> Result<()> {
    let summary = summarize(results, acceptance);
    let verdict = if summary.acceptable {
        "accepted"
    } else {
        "rejected"
    };

    writeln!(out, "# Statecraft QA report")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "**{}/{} scenarios passed**, {}/{} iterations ({:.1}%), acceptance {}%: **{verdict}**",
        summary.passed_scenarios,
        summary.total_scenarios,
        summary.successful_iterations,
        summary.total_iterations,
        summary.pass_rate,
        summary.acceptance_threshold
    )?;
    writeln!(out)?;
    writeln!(out, "| Scenario | Status | Iterations | Avg (ms) |")?;
    writeln!(out, "|----------|--------|-----------:|---------:|")?;
    for result in results {
        let status = if result.passed { "✅ pass" } else { "❌ fail" };
        writeln!(
            out,
            "| {} | {status} | {}/{} | {} |",
            result.scenario_name,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration.as_millis()
        )?;
    }
    let failing: Vec<&ScenarioResult> = results.iter().filter(|r| !r.failures.is_empty()).collect();
    if !failing.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Failures")?;
        writeln!(out)?;
        for result in failing {
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Flat per-scenario rows for spreadsheets.
///
/// # Errors
///
/// Returns an error when the sink refuses a write.
pub fn generate_csv_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    _acceptance: u32,
) -> Result<()> {
    writeln!(
        out,
        "scenario,passed,iterations_run,successful_iterations,failure_count,average_ms"
    )?;
    for result in results {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&result.scenario_name),
            result.passed,
            result.iterations_run,
            result.successful_iterations,
            result.failures.len(),
            result.average_duration.as_millis()
        )?;
    }
    Ok(())
}
