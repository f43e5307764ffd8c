use crate::models::AppConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default configuration directory, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "HWP Merge Data";

/// Configuration file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "hwp-merge.yaml";

/// Loads the startup configuration file.
///
/// The file only seeds defaults (merge options, automation settings, logging). The
/// application never writes it back, so user choices do not outlive the window.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for `config_dir`. The directory does not need to exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        }
    }

    /// Load the configuration file.
    ///
    /// # Returns
    /// The loaded AppConfig, or defaults if the file doesn't exist
    pub fn load(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(AppConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: AppConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}
