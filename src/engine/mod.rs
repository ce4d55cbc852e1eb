//! Spreadsheet engine interface.
//!
//! The engine that actually opens, reads, writes, and saves workbooks is an
//! external collaborator. The core only consumes the value-oriented contract
//! below, so the evaluator and processor can run against any implementation:
//! the in-memory engine used by tests, the bundled CSV engine, or a host
//! spreadsheet application behind the same traits. Formatting, formulas, and
//! styling are the engine's business and never cross this boundary.
//!
//! Rows and columns are 1-indexed; row 1 is the first row of the sheet with
//! no implicit header handling.

pub mod csv;
pub mod memory;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

pub use csv::CsvEngine;
pub use memory::MemoryEngine;

/// Errors surfaced by a spreadsheet engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to open workbook {path}: {reason}")]
    Open { path: Utf8PathBuf, reason: String },

    #[error("sheet {name:?} not found")]
    SheetNotFound { name: String },

    #[error("cell ({row}, {col}) is protected")]
    ProtectedCell { row: u32, col: u32 },

    #[error("cell reference ({row}, {col}) is out of range")]
    OutOfRange { row: u32, col: u32 },

    #[error("sheet could not be unprotected: {reason}")]
    UnprotectFailed { reason: String },

    #[error("failed to save workbook: {reason}")]
    Save { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Factory for workbooks. One workbook is open at a time; the processor
/// closes the current file before opening the next.
pub trait SpreadsheetEngine {
    /// Whether this engine recognizes the file as a workbook it can open.
    /// Used to filter the source folder during enumeration.
    fn handles(&self, path: &Utf8Path) -> bool;

    fn open_workbook(&self, path: &Utf8Path) -> Result<Box<dyn Workbook>, EngineError>;
}

/// An open workbook. Dropping without [`Workbook::save`] discards changes.
pub trait Workbook {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn Sheet>;

    fn save(&mut self) -> Result<(), EngineError>;

    fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// One sheet of an open workbook. Value-only access.
pub trait Sheet {
    /// Read a cell's value. Blank cells read as the empty string.
    fn read_cell(&self, row: u32, col: u32) -> String;

    fn write_cell(&mut self, row: u32, col: u32, value: &str) -> Result<(), EngineError>;

    /// Remove sheet protection so rejected writes can be retried.
    fn unprotect(&mut self) -> Result<(), EngineError>;
}
