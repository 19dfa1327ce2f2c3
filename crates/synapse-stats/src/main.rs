mod bootstrap;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use stats_core::settings::Settings;
use stats_data::aggregator::SynapseStats;

fn main() -> Result<ExitCode> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("SynapseStats v{} starting", env!("CARGO_PKG_VERSION"));

    let synapse_path = bootstrap::resolve_synapse_path(&settings);
    let stats = SynapseStats::load(&synapse_path);

    let snapshot = stats.snapshot();
    tracing::info!(
        "Loaded {} messages from {}",
        snapshot.records.len(),
        synapse_path.display()
    );
    if snapshot.skipped_files > 0 {
        tracing::warn!(
            "Skipped {} of {} files that were not valid messages",
            snapshot.skipped_files,
            snapshot.files_scanned
        );
    }

    let stdout = std::io::stdout();
    let outcome = commands::run(&settings, &stats, &mut stdout.lock())?;

    Ok(outcome.into())
}
