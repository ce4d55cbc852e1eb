//! sheetpatch - Batch search-and-update for folders of spreadsheet files
//!
//! Main entry point for the CLI.
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/sheetpatch.<date> plus console output
//! 2. Load and validate config.json (rules, settings, platform folder)
//! 3. Run the batch: one workbook at a time, rules in declared order
//! 4. Render the run summary to console and log
//!
//! Exit code is 0 whenever the batch completes, even with per-file
//! failures; those are visible in the summary counts and the log. Only
//! unrecoverable startup errors (config load failure, unreadable folder,
//! no workbook files) exit non-zero.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use sheetpatch::engine::CsvEngine;
use sheetpatch::{APP_NAME, ConfigManager, FileProcessor, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "sheetpatch",
    version,
    about = "Batch search-and-update for folders of spreadsheet files"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, env = "SHEETPATCH_CONFIG", default_value = "config.json")]
    config: Utf8PathBuf,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: String,

    /// Enable debug-level logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The guard must live until exit so the file writer keeps flushing
    let _guard = sheetpatch::logging::setup_logging(&cli.log_dir, "sheetpatch", cli.debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Platform: {}", std::env::consts::OS);

    let manager = ConfigManager::new(&cli.config);
    let config = manager.load()?;

    tracing::info!("Source folder: {}", config.folder);
    if config.enabled_rule_count() == 0 {
        tracing::warn!("No enabled rules configured; files will be scanned but never modified");
    }

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    let summary = processor.run_batch(&config.folder, &config.rules)?;

    for line in summary.render().lines() {
        tracing::info!("{line}");
    }

    Ok(())
}
