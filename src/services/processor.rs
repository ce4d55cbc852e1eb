//! File processing: open a workbook, apply every enabled rule whose sheet
//! exists, save when anything changed, and isolate failures per file.

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::engine::SpreadsheetEngine;
use crate::models::{GeneralSettings, Rule, RunResult, RunSummary};
use crate::report::{InvalidStateError, RunAggregator};
use crate::services::evaluator;

/// One file's contribution to a rule's run-wide counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDelta {
    pub rule_name: String,
    pub matches_found: u64,
    pub updates_made: u64,
}

/// Everything the aggregator needs to know about one processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub result: RunResult,
    pub rule_deltas: Vec<RuleDelta>,
}

/// A failed pre-processing backup. Fatal for the file: proceeding without a
/// backup would risk silent data loss.
#[derive(Debug, Error)]
#[error("backup failed for {path}: {source}")]
pub struct BackupError {
    pub path: Utf8PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Unrecoverable errors while setting up or driving the batch. Per-file
/// errors never surface here; they are folded into the summary instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot read folder {path}: {source}")]
    FolderUnreadable {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no workbook files found in {0}")]
    NoFilesFound(Utf8PathBuf),

    #[error(transparent)]
    State(#[from] InvalidStateError),
}

/// Applies the rule set to files through an injected spreadsheet engine.
///
/// Processing is strictly sequential: one workbook open at a time, files in
/// sorted order, rules in declared order.
pub struct FileProcessor<'a> {
    engine: &'a dyn SpreadsheetEngine,
    settings: GeneralSettings,
}

impl<'a> FileProcessor<'a> {
    pub fn new(engine: &'a dyn SpreadsheetEngine, settings: GeneralSettings) -> Self {
        Self { engine, settings }
    }

    /// Process every workbook file in `folder` and return the finalized
    /// summary. One bad file never aborts the batch.
    pub fn run_batch(&self, folder: &Utf8Path, rules: &[Rule]) -> Result<RunSummary, BatchError> {
        let files = self.enumerate_files(folder)?;
        tracing::info!("Found {} workbook files in {}", files.len(), folder);

        let delay = Duration::from_secs_f64(self.settings.process_delay_seconds.max(0.0));
        let mut aggregator = RunAggregator::new(rules);
        aggregator.begin()?;

        let start = Instant::now();
        for (i, path) in files.iter().enumerate() {
            tracing::info!("Processing {}/{}: {}", i + 1, files.len(), path);

            let file_start = Instant::now();
            let report = self.process(path, rules);
            tracing::info!(
                "  {} in {:.1}s: {} updates",
                report.result.status,
                file_start.elapsed().as_secs_f32(),
                report.result.updates_made
            );

            aggregator.record_file(&report.result)?;
            for delta in &report.rule_deltas {
                aggregator.record_rule(&delta.rule_name, delta.matches_found, delta.updates_made)?;
            }

            // Fixed pause between files to bound load on the engine
            if !delay.is_zero() && i + 1 < files.len() {
                thread::sleep(delay);
            }
        }

        let summary = aggregator.finalize();
        tracing::info!(
            "Batch finished in {:.1}s: {} files, {} updates",
            start.elapsed().as_secs_f32(),
            summary.files_processed,
            summary.total_updates
        );
        Ok(summary)
    }

    /// Process a single file. All errors are contained here and reported via
    /// the returned [`RunResult`].
    pub fn process(&self, path: &Utf8Path, rules: &[Rule]) -> FileReport {
        let file_name = path.file_name().unwrap_or(path.as_str()).to_string();

        match self.process_inner(path, rules) {
            Ok((updates_made, rule_deltas)) => FileReport {
                result: RunResult::succeeded(file_name, updates_made),
                rule_deltas,
            },
            Err(error) => {
                tracing::error!("Failed to process {}: {:#}", file_name, error);
                FileReport {
                    result: RunResult::failed(file_name, format!("{error:#}")),
                    rule_deltas: Vec::new(),
                }
            }
        }
    }

    fn process_inner(
        &self,
        path: &Utf8Path,
        rules: &[Rule],
    ) -> anyhow::Result<(u64, Vec<RuleDelta>)> {
        if self.settings.enable_backups {
            let backup_path = create_backup(path)?;
            tracing::info!("  Backup created: {}", backup_path);
        }

        let mut workbook = self.engine.open_workbook(path)?;
        let sheet_names = workbook.sheet_names();

        let mut total_updates = 0u64;
        let mut rule_deltas = Vec::new();

        for rule in rules.iter().filter(|rule| rule.enabled) {
            let Some(sheet) = workbook.sheet_mut(&rule.sheet_name) else {
                tracing::warn!(
                    "  Sheet {:?} not found in {} (has: {:?}), skipping rule {:?}",
                    rule.sheet_name,
                    path,
                    sheet_names,
                    rule.name
                );
                continue;
            };

            match evaluator::evaluate(sheet, rule, self.settings.max_rows_to_process) {
                Ok(outcome) => {
                    tracing::info!(
                        "  Rule {:?}: {} matches, {} updates",
                        rule.name,
                        outcome.matches_found,
                        outcome.updates_made
                    );
                    total_updates += outcome.updates_made;
                    rule_deltas.push(RuleDelta {
                        rule_name: rule.name.clone(),
                        matches_found: outcome.matches_found,
                        updates_made: outcome.updates_made,
                    });
                }
                Err(write_error) if self.settings.write_failures_fatal => {
                    // Nothing is saved, so the partial counts are discarded
                    // along with the file.
                    return Err(write_error)
                        .with_context(|| format!("rule {:?} aborted", rule.name));
                }
                Err(write_error) => {
                    tracing::error!(
                        "  Rule {:?} abandoned after write failure: {}",
                        rule.name,
                        write_error
                    );
                    total_updates += write_error.partial.updates_made;
                    rule_deltas.push(RuleDelta {
                        rule_name: rule.name.clone(),
                        matches_found: write_error.partial.matches_found,
                        updates_made: write_error.partial.updates_made,
                    });
                }
            }
        }

        if total_updates > 0 {
            workbook.save().context("failed to save workbook")?;
            tracing::info!("  Saved {} updates", total_updates);
        } else {
            tracing::info!("  No changes needed, closing without saving");
        }
        workbook.close().context("failed to close workbook")?;

        Ok((total_updates, rule_deltas))
    }

    /// Stable enumeration of the engine's workbook files in `folder`.
    /// Temporary files left behind by spreadsheet applications (`~$` prefix)
    /// are ignored.
    fn enumerate_files(&self, folder: &Utf8Path) -> Result<Vec<Utf8PathBuf>, BatchError> {
        let entries = folder
            .read_dir_utf8()
            .map_err(|source| BatchError::FolderUnreadable {
                path: folder.to_owned(),
                source,
            })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BatchError::FolderUnreadable {
                path: folder.to_owned(),
                source,
            })?;
            let path = entry.path();
            if path.file_name().is_some_and(|name| name.starts_with("~$")) {
                continue;
            }
            if self.engine.handles(path) {
                files.push(path.to_owned());
            }
        }

        if files.is_empty() {
            return Err(BatchError::NoFilesFound(folder.to_owned()));
        }

        files.sort();
        Ok(files)
    }
}

/// Copy `path` into a timestamped file under a `backups` directory beside
/// the source.
fn create_backup(path: &Utf8Path) -> Result<Utf8PathBuf, BackupError> {
    let backup_err = |source: std::io::Error| BackupError {
        path: path.to_owned(),
        source,
    };
    let invalid = || {
        backup_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent or file name",
        ))
    };

    let parent = path.parent().ok_or_else(invalid)?;
    let file_name = path.file_name().ok_or_else(invalid)?;

    let backup_dir = parent.join("backups");
    fs::create_dir_all(&backup_dir).map_err(backup_err)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = backup_dir.join(format!("{stamp}_{file_name}"));
    fs::copy(path, &backup_path).map_err(backup_err)?;

    Ok(backup_path)
}
