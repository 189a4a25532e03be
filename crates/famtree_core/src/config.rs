//! Core configuration.
//!
//! # Responsibility
//! - Collect logging, layout and persistence settings in one document.
//! - Parse partial JSON documents, filling gaps with defaults.
//!
//! # Invariants
//! - A validated config has strictly positive layout sizes and a non-empty
//!   snapshot key.

use crate::graph::layout::LayoutConfig;
use crate::repo::snapshot_repo::SNAPSHOT_KEY;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Logging bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: String::new(),
        }
    }
}

/// Top-level configuration for embedding the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub layout: LayoutConfig,
    pub snapshot_key: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            layout: LayoutConfig::default(),
            snapshot_key: SNAPSHOT_KEY.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    /// Field holds a value outside its allowed range.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "config is not valid JSON: {err}"),
            Self::Invalid { field, reason } => write!(f, "config field `{field}` {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(value: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(value).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "snapshot_key",
                reason: "must not be blank",
            });
        }
        let layout = &self.layout;
        let sizes = [
            ("layout.node_width", layout.node_width),
            ("layout.node_height", layout.node_height),
            ("layout.node_spacing", layout.node_spacing),
            ("layout.generation_height", layout.generation_height),
        ];
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                });
            }
        }
        let paddings = [
            ("layout.padding_x", layout.padding_x),
            ("layout.padding_top", layout.padding_top),
            ("layout.padding_bottom", layout.padding_bottom),
        ];
        for (field, value) in paddings {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be negative",
                });
            }
        }
        Ok(())
    }
}
