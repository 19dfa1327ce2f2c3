//! Command dispatch and plain-text rendering for the CLI.

use std::io::Write;
use std::process::ExitCode;

use stats_core::settings::{Command, Settings};
use stats_data::aggregator::{Histogram, Summary, SynapseStats};
use stats_data::report;

const RULE: &str = "============================================================";

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// A flag the command needs was not supplied.
    MissingArgument,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::MissingArgument => ExitCode::from(1),
        }
    }
}

/// Run the command selected in `settings` against `stats`, writing
/// human-readable output to `out`.
pub fn run<W: Write>(
    settings: &Settings,
    stats: &SynapseStats,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    match &settings.command {
        Command::Summary => {
            render_summary(&stats.summary(), out)?;
        }

        Command::Agent { agent } => {
            let Some(agent) = agent else {
                writeln!(out, "ERROR: --agent required")?;
                return Ok(Outcome::MissingArgument);
            };
            let agent_stats = stats.agent_stats(agent);
            writeln!(out, "\n=== STATS FOR {} ===", agent)?;
            writeln!(out, "Sent: {}", agent_stats.messages_sent)?;
            writeln!(out, "Received: {}", agent_stats.messages_received)?;
            writeln!(out, "Replied to: {}", agent_stats.messages_replied_to)?;
            writeln!(out, "Response rate: {}\n", agent_stats.response_rate)?;
        }

        Command::Timeline { days } => {
            writeln!(out, "\n=== MESSAGE TIMELINE (Last {} days) ===", days)?;
            for (date, count) in stats.timeline(*days) {
                writeln!(out, "{}: {} messages", date, count)?;
            }
            writeln!(out)?;
        }

        Command::Export { output, format } => {
            let Some(output) = output else {
                writeln!(out, "ERROR: --output required")?;
                return Ok(Outcome::MissingArgument);
            };
            report::export(stats, output, *format)?;
            writeln!(out, "[OK] Exported to {}", output.display())?;
        }
    }

    Ok(Outcome::Success)
}

fn render_summary<W: Write>(summary: &Summary, out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "\n{}", RULE)?;
    writeln!(out, "SYNAPSE COMMUNICATION SUMMARY")?;
    writeln!(out, "{}", RULE)?;

    match summary {
        Summary::NoData { total_messages, error } => {
            writeln!(out, "Total messages: {}", total_messages)?;
            writeln!(out, "{}", error)?;
        }
        Summary::Stats(s) => {
            writeln!(out, "Total messages: {}", s.total_messages)?;
            writeln!(out, "Reply rate: {}", s.reply_rate)?;
            writeln!(
                out,
                "Most active: {} ({} messages)",
                s.most_active_agent, s.most_active_count
            )?;
            writeln!(out, "\nBy sender: {}", inline_histogram(&s.by_sender)?)?;
            writeln!(out, "By priority: {}", inline_histogram(&s.by_priority)?)?;
        }
    }

    writeln!(out, "{}\n", RULE)?;
    Ok(())
}

fn inline_histogram(histogram: &Histogram) -> serde_json::Result<String> {
    serde_json::to_string(histogram)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_message(dir: &Path, id: &str, message: serde_json::Value) {
        std::fs::write(dir.join(format!("{id}.json")), message.to_string()).unwrap();
    }

    fn populated_store() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_message(
            dir.path(),
            "msg_001",
            serde_json::json!({"from": "ATLAS", "to": ["FORGE"], "priority": "HIGH"}),
        );
        write_message(
            dir.path(),
            "msg_002",
            serde_json::json!({"from": "FORGE", "to": ["ATLAS"],
                               "replied_by": [{"ai": "ATLAS"}]}),
        );
        dir
    }

    fn run_args(args: &[&str], stats: &SynapseStats) -> (Outcome, String) {
        let settings = Settings::parse_from(args);
        let mut out = Vec::new();
        let outcome = run(&settings, stats, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_summary_output() {
        let store = populated_store();
        let stats = SynapseStats::load(store.path());
        let (outcome, text) = run_args(&["synapse-stats", "summary"], &stats);

        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("SYNAPSE COMMUNICATION SUMMARY"));
        assert!(text.contains("Total messages: 2"));
        assert!(text.contains("Reply rate: 50.0%"));
        assert!(text.contains("Most active: ATLAS (1 messages)"));
        assert!(text.contains(r#"By sender: {"ATLAS":1,"FORGE":1}"#));
    }

    #[test]
    fn test_summary_output_empty_store() {
        let store = TempDir::new().unwrap();
        let stats = SynapseStats::load(store.path());
        let (outcome, text) = run_args(&["synapse-stats", "summary"], &stats);

        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("Total messages: 0"));
        assert!(text.contains("No messages found"));
    }

    #[test]
    fn test_agent_output() {
        let store = populated_store();
        let stats = SynapseStats::load(store.path());
        let (outcome, text) = run_args(&["synapse-stats", "agent", "--agent", "atlas"], &stats);

        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("=== STATS FOR atlas ==="));
        assert!(text.contains("Sent: 1"));
        assert!(text.contains("Received: 1"));
        assert!(text.contains("Replied to: 1"));
        assert!(text.contains("Response rate: 100.0%"));
    }

    #[test]
    fn test_agent_requires_flag() {
        let stats = SynapseStats::from_records(Vec::new());
        let (outcome, text) = run_args(&["synapse-stats", "agent"], &stats);

        assert_eq!(outcome, Outcome::MissingArgument);
        assert_eq!(text.trim(), "ERROR: --agent required");
    }

    #[test]
    fn test_timeline_output_is_dense() {
        let stats = SynapseStats::from_records(Vec::new());
        let (_, text) = run_args(&["synapse-stats", "timeline", "--days", "3"], &stats);

        assert!(text.contains("=== MESSAGE TIMELINE (Last 3 days) ==="));
        let day_lines = text.lines().filter(|l| l.ends_with(": 0 messages")).count();
        assert_eq!(day_lines, 3);
    }

    #[test]
    fn test_export_requires_output() {
        let stats = SynapseStats::from_records(Vec::new());
        let (outcome, text) = run_args(&["synapse-stats", "export", "--format", "csv"], &stats);

        assert_eq!(outcome, Outcome::MissingArgument);
        assert!(text.contains("ERROR: --output required"));
    }

    #[test]
    fn test_export_writes_report() {
        let store = populated_store();
        let stats = SynapseStats::load(store.path());
        let target = store.path().join("out").with_extension("csv");
        let target_str = target.to_str().unwrap();

        let (outcome, text) = run_args(
            &["synapse-stats", "export", "--output", target_str, "--format", "csv"],
            &stats,
        );

        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("[OK] Exported to"));
        let csv = std::fs::read_to_string(&target).unwrap();
        assert!(csv.contains("Total Messages,2"));
    }
}
