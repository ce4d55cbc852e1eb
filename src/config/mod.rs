use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::column::InvalidColumnError;
use crate::models::{ConfigFile, GeneralSettings, Rule};

/// Errors raised while loading configuration. All of them are fatal: the run
/// aborts before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("general_settings.max_rows_to_process must be greater than zero")]
    InvalidMaxRows,

    #[error("general_settings.process_delay_seconds must be a non-negative number")]
    InvalidDelay,

    #[error("rule {rule:?}: {source}")]
    InvalidColumn {
        rule: String,
        #[source]
        source: InvalidColumnError,
    },

    #[error("no folder path configured for platform {platform:?}")]
    MissingFolderPath { platform: String },
}

/// Validated configuration, ready to drive a run. Read-only after load.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: GeneralSettings,
    /// Source folder for the running platform.
    pub folder: Utf8PathBuf,
    /// All rules, in declaration order, disabled ones included.
    pub rules: Vec<Rule>,
}

impl LoadedConfig {
    pub fn enabled_rule_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.enabled).count()
    }
}

/// Loads and validates the JSON configuration file.
///
/// Validation is fail-fast: column letters, settings ranges, and the active
/// platform's folder path are all checked at load time, not at first use.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    /// Load configuration for the running platform.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        self.load_for_platform(std::env::consts::OS)
    }

    /// Load configuration resolving folder paths against an explicit
    /// platform key (as reported by `std::env::consts::OS`).
    pub fn load_for_platform(&self, os: &str) -> Result<LoadedConfig, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let contents = fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        })?;

        let file: ConfigFile =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: self.config_path.clone(),
                source,
            })?;

        let settings = file.general_settings;
        if settings.max_rows_to_process == 0 {
            return Err(ConfigError::InvalidMaxRows);
        }
        if !settings.process_delay_seconds.is_finite() || settings.process_delay_seconds < 0.0 {
            return Err(ConfigError::InvalidDelay);
        }

        let folder = file
            .folder_paths
            .for_platform(os)
            .map(Utf8PathBuf::from)
            .ok_or_else(|| ConfigError::MissingFolderPath {
                platform: os.to_string(),
            })?;

        let mut rules = Vec::with_capacity(file.search_and_update_rules.len());
        for spec in file.search_and_update_rules {
            let name = spec.name.clone();
            let rule = Rule::from_spec(spec)
                .map_err(|source| ConfigError::InvalidColumn { rule: name, source })?;
            rules.push(rule);
        }

        tracing::info!(
            "Loaded {} rules ({} enabled) from {}",
            rules.len(),
            rules.iter().filter(|r| r.enabled).count(),
            self.config_path
        );

        Ok(LoadedConfig {
            settings,
            folder,
            rules,
        })
    }
}
