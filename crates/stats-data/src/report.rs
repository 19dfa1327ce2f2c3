//! CSV and JSON report export.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use stats_core::error::{Result, StatsError};
use stats_core::formatting::NOT_APPLICABLE;
use stats_core::settings::{ExportFormat, DEFAULT_TIMELINE_DAYS};
use stats_core::time_utils::local_now;
use tracing::info;

use crate::aggregator::{
    CommunicationMatrix, PriorityTrends, ResponseTimes, Summary, SynapseStats, Timeline, NO_AGENT,
};

/// Everything the JSON export contains.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// When the report was generated (RFC 3339, local offset).
    pub generated: String,
    pub summary: Summary,
    pub timeline: Timeline,
    pub priority_trends: PriorityTrends,
    pub response_times: ResponseTimes,
    pub communication_matrix: CommunicationMatrix,
}

/// Run the full fixed set of queries as of `generated`.
pub fn build_report(stats: &SynapseStats, generated: DateTime<FixedOffset>) -> Report {
    Report {
        generated: generated.to_rfc3339(),
        summary: stats.summary(),
        timeline: stats.timeline_at(DEFAULT_TIMELINE_DAYS, generated),
        priority_trends: stats.priority_trends(),
        response_times: stats.response_times(),
        communication_matrix: stats.communication_matrix(),
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

/// Write the human-readable CSV report to `writer`.
///
/// The layout has a metric block followed by sender and priority tables and
/// is not meant to be parsed back. Sections are separated by empty lines.
pub fn write_csv<W: Write>(stats: &SynapseStats, mut writer: W) -> Result<()> {
    let summary = stats.summary();
    let (total, reply_rate, most_active) = match summary.stats() {
        Some(s) => (
            s.total_messages.to_string(),
            s.reply_rate.clone(),
            s.most_active_agent.clone(),
        ),
        None => (
            "0".to_string(),
            NOT_APPLICABLE.to_string(),
            NO_AGENT.to_string(),
        ),
    };

    write_section(&mut writer, &[row(["=== SYNAPSE STATISTICS REPORT ==="])])?;
    writer.write_all(b"\n")?;

    write_section(
        &mut writer,
        &[
            row(["Metric", "Value"]),
            row(["Total Messages", total.as_str()]),
            row(["Reply Rate", reply_rate.as_str()]),
            row(["Most Active Agent", most_active.as_str()]),
        ],
    )?;
    writer.write_all(b"\n")?;

    let mut senders = vec![
        row(["=== MESSAGES BY SENDER ==="]),
        row(["Agent", "Message Count"]),
    ];
    let mut priorities = vec![
        row(["=== MESSAGES BY PRIORITY ==="]),
        row(["Priority", "Count"]),
    ];
    if let Some(s) = summary.stats() {
        senders.extend(s.by_sender.iter().map(count_row));
        priorities.extend(s.by_priority.iter().map(count_row));
    }

    write_section(&mut writer, &senders)?;
    writer.write_all(b"\n")?;
    write_section(&mut writer, &priorities)?;

    writer.flush()?;
    Ok(())
}

fn count_row((key, count): (&str, u64)) -> Vec<String> {
    vec![key.to_string(), count.to_string()]
}

fn row<const N: usize>(fields: [&str; N]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Encode `rows` as CSV records. Each call uses its own encoder so the
/// separator lines between sections are written straight to `out`.
fn write_section<W: Write>(out: &mut W, rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    for record in rows {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the CSV report to `path`, replacing any existing file.
pub fn export_csv(stats: &SynapseStats, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| StatsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(stats, file)?;
    info!("Wrote CSV report to {}", path.display());
    Ok(())
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Write the full report as pretty-printed JSON to `path`.
pub fn export_json(stats: &SynapseStats, path: &Path) -> Result<()> {
    let report = build_report(stats, local_now());
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).map_err(|source| StatsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote JSON report to {}", path.display());
    Ok(())
}

/// Export in the requested format.
pub fn export(stats: &SynapseStats, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => export_csv(stats, path),
        ExportFormat::Json => export_json(stats, path),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
