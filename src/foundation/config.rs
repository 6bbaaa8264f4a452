//! Application configuration for hosts embedding the studio (the `onair` binary among them).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory backing the profile key-value store.
    pub profile_dir: PathBuf,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "onair=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile_dir: config_dir().join("profiles"),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_dir().join("config.json"))
    }

    /// Load config from `path`, falling back to defaults when missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to parse config at {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to read config at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// `$XDG_CONFIG_HOME/onair`, or `~/.config/onair`.
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("onair")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
