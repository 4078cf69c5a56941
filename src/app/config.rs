//! Configuration for the frame buffer console

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font to attach with; the best fitting registered font when unset
    pub font: Option<String>,
    /// Blink ticks per cursor phase (0 disables blinking)
    pub cursor_blink_rate: u32,
    /// Palette index for underlined text on colour displays
    pub underline_color: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: None,
            cursor_blink_rate: 20,
            underline_color: 3,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse a boot option string such as `font:VGA8x16`.
    ///
    /// Options are comma separated; unknown ones are skipped.
    pub fn from_boot_option(options: &str) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        for option in options.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            match option.split_once(':') {
                Some(("font", name)) => {
                    if name.is_empty() {
                        return Err(ConfigError::Option(option.to_string()));
                    }
                    config.font = Some(name.to_string());
                }
                _ => tracing::debug!("ignoring boot option {}", option),
            }
        }
        Ok(config)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed boot option: {0}")]
    Option(String),
}
