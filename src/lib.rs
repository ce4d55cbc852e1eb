// sheetpatch - Batch search-and-update for folders of spreadsheet files
//
// This is the library crate containing the core business logic and data
// structures. The binary crate (main.rs) provides the CLI entry point.

pub mod column;
pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod report;
pub mod services;

// Re-export commonly used types for convenience
pub use column::{ColumnRef, InvalidColumnError};
pub use config::{ConfigError, ConfigManager, LoadedConfig};
pub use models::{FileStatus, GeneralSettings, Rule, RunResult, RunSummary};
pub use report::{InvalidStateError, RunAggregator, RunPhase};
pub use services::FileProcessor;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
