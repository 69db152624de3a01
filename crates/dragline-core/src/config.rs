#![forbid(unsafe_code)]

//! Tunables for drag machines.
//!
//! # Loading
//!
//! ```toml
//! # dragline.toml
//! threshold = 12.0
//! ```
//!
//! ```rust,ignore
//! let config = DragConfig::from_toml_file("dragline.toml")?;
//! let config = DragConfig::from_json_str(r#"{ "threshold": 8 }"#)?;
//! ```
//!
//! Missing fields keep their defaults, so an empty document is the default
//! config. Loaded configs are validated before they are returned.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default minimum pointer travel (px) separating a drag from a click.
pub const DEFAULT_THRESHOLD: f64 = 20.0;

/// Configuration applied to every machine a registry creates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DragConfig {
    /// Minimum Euclidean travel from pointer-down before a drag is confirmed.
    pub threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DragConfig {
    /// Config with a custom threshold.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Reject values no machine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::invalid(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.threshold < 0.0 {
            return Err(ConfigError::invalid(format!(
                "threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}
