use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Window used by `timeline` and by the JSON export when none is given.
pub const DEFAULT_TIMELINE_DAYS: u32 = 7;

/// Largest `--days` accepted by `timeline` (about a century).
pub const MAX_TIMELINE_DAYS: u32 = 36_500;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Communication analytics for THE_SYNAPSE
#[derive(Parser, Debug, Clone)]
#[command(
    name = "synapse-stats",
    about = "Communication analytics for THE_SYNAPSE",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Message store directory (defaults to ~/.synapse/active)
    #[arg(long, global = true)]
    pub synapse_path: Option<PathBuf>,

    /// Logging level
    #[arg(
        long,
        global = true,
        default_value = "WARNING",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Report to produce.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print overall message statistics
    Summary,

    /// Print statistics for one agent
    Agent {
        /// Agent name (matched upper-cased)
        #[arg(long)]
        agent: Option<String>,
    },

    /// Print per-day message counts
    Timeline {
        /// Number of days to include, ending today
        #[arg(
            long,
            default_value_t = DEFAULT_TIMELINE_DAYS,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_TIMELINE_DAYS))
        )]
        days: u32,
    },

    /// Write the full report to a file
    Export {
        /// Output file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

/// File format for the `export` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Settings {
    /// Log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
