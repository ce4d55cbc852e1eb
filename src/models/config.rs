use serde::{Deserialize, Serialize};

use crate::column::{ColumnRef, InvalidColumnError};

/// The raw configuration document from `config.json`.
///
/// Unknown keys are ignored; optional keys take documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub general_settings: GeneralSettings,

    pub folder_paths: FolderPaths,

    pub search_and_update_rules: Vec<RuleSpec>,
}

/// Run-wide settings from the `general_settings` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Copy each source file to a timestamped backup before opening it.
    #[serde(default)]
    pub enable_backups: bool,

    /// Upper bound on rows scanned per sheet. Must be greater than zero.
    #[serde(default = "default_max_rows")]
    pub max_rows_to_process: u32,

    /// Blocking pause between files, to bound load on the spreadsheet engine.
    #[serde(default = "default_process_delay")]
    pub process_delay_seconds: f64,

    /// Treat a write failure (after one unprotect retry) as fatal for the
    /// whole file instead of abandoning just that rule's remaining rows.
    #[serde(default)]
    pub write_failures_fatal: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            enable_backups: false,
            max_rows_to_process: default_max_rows(),
            process_delay_seconds: default_process_delay(),
            write_failures_fatal: false,
        }
    }
}

fn default_max_rows() -> u32 {
    300
}

fn default_process_delay() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Per-platform source folder paths. Only the entry matching the running
/// platform is ever read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderPaths {
    #[serde(default)]
    pub windows: Option<String>,

    #[serde(default)]
    pub mac: Option<String>,

    #[serde(default)]
    pub linux: Option<String>,
}

impl FolderPaths {
    /// Look up the folder for a platform key as reported by
    /// `std::env::consts::OS`. Unrecognized platforms fall back to the
    /// `linux` entry.
    pub fn for_platform(&self, os: &str) -> Option<&str> {
        let path = match os {
            "windows" => self.windows.as_deref(),
            "macos" => self.mac.as_deref(),
            _ => self.linux.as_deref(),
        };
        path.filter(|p| !p.is_empty())
    }
}

/// A search-and-update rule as written in the configuration file.
///
/// Columns are letter strings here; [`Rule::from_spec`] resolves them
/// eagerly at load time so bad letters fail before any file is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub sheet_name: String,
    pub search_column: String,
    pub search_value: String,
    pub update_column: String,
    pub target_value: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A validated rule with resolved column references. Immutable once loaded.
///
/// Identity is the `name`, which is used as the aggregation key for
/// reporting.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub sheet_name: String,
    pub search_column: ColumnRef,
    pub search_value: String,
    pub update_column: ColumnRef,
    pub target_value: String,
    pub enabled: bool,
}

impl Rule {
    pub fn from_spec(spec: RuleSpec) -> Result<Self, InvalidColumnError> {
        Ok(Self {
            search_column: ColumnRef::resolve(&spec.search_column)?,
            update_column: ColumnRef::resolve(&spec.update_column)?,
            name: spec.name,
            sheet_name: spec.sheet_name,
            search_value: spec.search_value,
            target_value: spec.target_value,
            enabled: spec.enabled,
        })
    }
}
