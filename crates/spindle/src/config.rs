//! Store configuration
//!
//! Loaded from `.spindle.toml` in the working directory, then from
//! `<config dir>/spindle/config.toml`. Missing files and fields fall back to
//! defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::StateError;

const CONFIG_FILE: &str = ".spindle.toml";
const APP_DIR: &str = "spindle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Log every dispatched action at debug level
    #[serde(default = "default_log_actions")]
    pub log_actions: bool,

    /// Warn once this many actions are waiting in the reentrant queue
    #[serde(default = "default_queue_warn_threshold")]
    pub queue_warn_threshold: usize,
}

fn default_log_actions() -> bool {
    false
}

fn default_queue_warn_threshold() -> usize {
    256
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_actions: default_log_actions(),
            queue_warn_threshold: default_queue_warn_threshold(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, StateError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load config from CWD first, then the user config directory, or use defaults
    pub fn load() -> Self {
        Self::load_from(Path::new("."), global_config_path().ok().as_deref())
    }

    /// Load `.spindle.toml` from `dir`, falling back to `global`, or use
    /// defaults. A file that fails to parse is skipped with a warning.
    pub fn load_from(dir: &Path, global: Option<&Path>) -> Self {
        if let Some(content) = load_config_file(dir, global) {
            match Self::from_toml_str(&content) {
                Ok(config) => {
                    log::info!("Loaded store config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default store config");
        Self::default()
    }
}

/// Content of the first config file found, if any.
fn load_config_file(dir: &Path, global: Option<&Path>) -> Option<String> {
    let local = dir.join(CONFIG_FILE);
    if let Ok(content) = std::fs::read_to_string(&local) {
        log::debug!("Loaded config from {}", local.display());
        return Some(content);
    }

    let path = global?;
    match std::fs::read_to_string(path) {
        Ok(content) => {
            log::debug!("Loaded config from {}", path.display());
            Some(content)
        }
        Err(_) => None,
    }
}

/// `<config dir>/spindle/config.toml`
pub fn global_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}
