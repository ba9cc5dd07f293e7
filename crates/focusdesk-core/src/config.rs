//! Configuration management for focusdesk

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global focusdesk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storage key holding the settings blob
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Override for the data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Ring the terminal bell when a countdown finishes
    #[serde(default = "default_true")]
    pub bell: bool,

    /// Show the clock as 24h
    #[serde(default = "default_true")]
    pub clock_24h: bool,

    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_key() -> String {
    "focus-workspace-settings".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            data_dir: None,
            bell: true,
            clock_24h: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
