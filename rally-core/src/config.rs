//! Configuration for the rally command line

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RallyError, Result};
use crate::settings::MatchSettings;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "rally.json";

/// Environment variable that overrides `data_dir`
pub const DATA_DIR_ENV: &str = "RALLY_DATA_DIR";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyConfig {
    /// Directory holding one JSON file per match
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Settings used by `rally new` when no flags override them
    #[serde(default)]
    pub default_settings: MatchSettings,

    /// Tracing filter used when RALLY_LOG / RUST_LOG are unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_dir() -> PathBuf { PathBuf::from(".rally") }
fn default_log_filter() -> String { "rally_core=info".to_string() }

impl Default for RallyConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_settings: MatchSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl RallyConfig {
    /// Create a new config builder
    pub fn builder() -> RallyConfigBuilder {
        RallyConfigBuilder::default()
    }

    /// Read a config file; every field may be omitted
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RallyError::IoError {
            message: format!("Failed to read config {}: {}", path.display(), e),
        })?;
        let config: RallyConfig = serde_json::from_str(&content)?;
        config.default_settings.validate()?;
        Ok(config)
    }

    /// Resolve the effective configuration
    ///
    /// An explicit path must exist. Without one, `rally.json` in the working
    /// directory is used when present, defaults otherwise. `RALLY_DATA_DIR`
    /// wins over whatever the file says.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for RallyConfig
#[derive(Debug, Default)]
pub struct RallyConfigBuilder {
    config: RallyConfig,
}

impl RallyConfigBuilder {
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn default_settings(mut self, settings: MatchSettings) -> Self {
        self.config.default_settings = settings;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    pub fn build(self) -> RallyConfig {
        self.config
    }
}
