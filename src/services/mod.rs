//! Core processing services.
//!
//! This module contains the business logic that drives a run:
//! - [`evaluator`]: scans a sheet's rows for one rule and applies
//!   conditional cell updates
//! - [`processor`]: orchestrates per-file processing (backups, open,
//!   rule application, save-if-changed, close) and the sequential batch
//!   loop, with per-file error isolation
//!
//! Services are framework-agnostic and operate purely through the injected
//! [`SpreadsheetEngine`](crate::engine::SpreadsheetEngine) traits, so they
//! are testable against the in-memory engine.

pub mod evaluator;
pub mod processor;

pub use evaluator::{EvalOutcome, WriteError, evaluate, normalize};
pub use processor::{BackupError, BatchError, FileProcessor, FileReport, RuleDelta};
