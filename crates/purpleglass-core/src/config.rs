use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composer::MAX_INPUT_HEIGHT;
use crate::reply::DEFAULT_DELAY_MS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reply delay window {min}..{max}ms is empty")]
    EmptyDelayWindow { min: u64, max: u64 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Which flavour of the widget to run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Composer and replies only: no preferences, sign-in or settings.
    Classic,
    /// Adds themes, compact mode, the settings popover and the name gate.
    #[default]
    Gated,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub mode: ChatMode,
    /// Preference storage file; `None` uses the default location.
    pub storage_path: Option<PathBuf>,
    pub reply_delay_min_ms: u64,
    pub reply_delay_max_ms: u64,
    pub max_input_height: u16,
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            mode: ChatMode::Gated,
            storage_path: None,
            reply_delay_min_ms: DEFAULT_DELAY_MS.start,
            reply_delay_max_ms: DEFAULT_DELAY_MS.end,
            max_input_height: MAX_INPUT_HEIGHT,
            tick_ms: 100,
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read `path`, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_delay_min_ms >= self.reply_delay_max_ms {
            return Err(ConfigError::EmptyDelayWindow {
                min: self.reply_delay_min_ms,
                max: self.reply_delay_max_ms,
            });
        }
        if self.max_input_height == 0 {
            return Err(ConfigError::Zero("max_input_height"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Zero("tick_ms"));
        }
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("purpleglass").join("config.json"))
    }
}
