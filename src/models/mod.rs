//! Data models for sheetpatch.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`ConfigFile`]: The raw JSON configuration document (`config.json`)
//! - [`Rule`]: A validated search-and-update rule with resolved column indices
//! - [`GeneralSettings`] / [`FolderPaths`]: Run-wide settings and platform folders
//! - [`RunResult`] / [`RuleOutcome`] / [`RunSummary`]: Per-file and run-wide reporting
//!
//! Configuration structs derive `Serialize`/`Deserialize` for JSON persistence.
//! Rules and settings are immutable once loaded; the reporting accumulators are
//! mutated only by [`RunAggregator`](crate::report::RunAggregator).

pub mod config;
pub mod report;

pub use config::{ConfigFile, FolderPaths, GeneralSettings, Rule, RuleSpec};
pub use report::{FileStatus, RuleOutcome, RunResult, RunSummary};
