//! Run aggregation.
//!
//! [`RunAggregator`] is the single owner of run-wide counters. The file
//! processor hands it per-file results and per-rule deltas; nothing else
//! mutates them. Its lifecycle is `NotStarted -> Running -> Finalized` with
//! no backward transitions, so a finalized summary can never drift.

use indexmap::IndexMap;
use thiserror::Error;

use crate::models::{FileStatus, Rule, RuleOutcome, RunResult, RunSummary};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Running,
    Finalized,
}

/// Raised when a recording call arrives outside the `Running` phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot {operation} while the run is {phase:?}")]
pub struct InvalidStateError {
    pub operation: &'static str,
    pub phase: RunPhase,
}

/// Accumulates per-file and per-rule counts for one run and renders the
/// final [`RunSummary`].
///
/// Enabled rules are pre-registered at construction so the summary's
/// per-rule breakdown keeps configuration declaration order, and rules that
/// never match still appear with zero counts.
#[derive(Debug)]
pub struct RunAggregator {
    phase: RunPhase,
    files_processed: u64,
    files_succeeded: u64,
    files_failed: u64,
    files_skipped: u64,
    total_updates: u64,
    per_rule: IndexMap<String, RuleOutcome>,
    summary: Option<RunSummary>,
}

impl RunAggregator {
    pub fn new(rules: &[Rule]) -> Self {
        let per_rule = rules
            .iter()
            .filter(|rule| rule.enabled)
            .map(|rule| (rule.name.clone(), RuleOutcome::new(&rule.name)))
            .collect();

        Self {
            phase: RunPhase::NotStarted,
            files_processed: 0,
            files_succeeded: 0,
            files_failed: 0,
            files_skipped: 0,
            total_updates: 0,
            per_rule,
            summary: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Transition `NotStarted -> Running`.
    pub fn begin(&mut self) -> Result<(), InvalidStateError> {
        if self.phase != RunPhase::NotStarted {
            return Err(InvalidStateError {
                operation: "begin the run",
                phase: self.phase,
            });
        }
        self.phase = RunPhase::Running;
        Ok(())
    }

    /// Record the outcome of one processed file. Called exactly once per
    /// file per run.
    pub fn record_file(&mut self, result: &RunResult) -> Result<(), InvalidStateError> {
        self.ensure_running("record a file result")?;

        self.files_processed += 1;
        match result.status {
            FileStatus::Succeeded => self.files_succeeded += 1,
            FileStatus::Failed => self.files_failed += 1,
            FileStatus::Skipped => self.files_skipped += 1,
        }
        self.total_updates += result.updates_made;
        Ok(())
    }

    /// Add one file's match/update deltas to a rule's run-wide outcome.
    /// Called exactly once per file/rule pair per run.
    pub fn record_rule(
        &mut self,
        rule_name: &str,
        matches_found: u64,
        updates_made: u64,
    ) -> Result<(), InvalidStateError> {
        self.ensure_running("record a rule outcome")?;

        let outcome = self
            .per_rule
            .entry(rule_name.to_string())
            .or_insert_with(|| RuleOutcome::new(rule_name));
        outcome.matches_found += matches_found;
        outcome.updates_made += updates_made;
        Ok(())
    }

    /// Finalize the run and return the summary. Idempotent: repeat calls
    /// return the identical summary.
    pub fn finalize(&mut self) -> RunSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let summary = RunSummary {
            files_processed: self.files_processed,
            files_succeeded: self.files_succeeded,
            files_failed: self.files_failed,
            files_skipped: self.files_skipped,
            total_updates: self.total_updates,
            per_rule: self.per_rule.values().cloned().collect(),
        };

        self.phase = RunPhase::Finalized;
        self.summary = Some(summary.clone());
        summary
    }

    fn ensure_running(&self, operation: &'static str) -> Result<(), InvalidStateError> {
        if self.phase != RunPhase::Running {
            return Err(InvalidStateError {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }
}
