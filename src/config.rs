use crate::category::CategoryFilter;
use crate::error::ConfigError;
use crate::settings::{FieldSettings, InputMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_VERSION: u32 = 1;

/// Complete application configuration for export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All simulation settings
    pub settings: FieldSettings,
    /// Active categories
    pub filter: CategoryFilter,
    /// Forced input mode; detected at startup when absent
    pub input_mode: Option<InputMode>,
    /// Content file to load instead of the built-in thoughts
    pub thoughts: Option<PathBuf>,
    /// Background stars (app-level)
    pub show_stars: bool,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "config exported");
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!(path = %path.display(), version = config.version, "config imported");
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: FieldSettings::default(),
            filter: CategoryFilter::default(),
            input_mode: None,
            thoughts: None,
            show_stars: true,
        }
    }
}
