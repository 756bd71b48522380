//! Pipeline configuration
//!
//! A plain struct with defaults, optionally loaded from JSON once at startup.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable knobs for an analysis run.
///
/// The biomass clamp bounds and carbon ratios are constants, not settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mark pixels with out-of-range or non-finite bands as invalid
    pub mask_invalid: bool,

    /// Longitude or latitude span (degrees) above which the planar area
    /// approximation is reported as unreliable
    pub extent_warning_degrees: f64,

    /// Grid shape `[rows, cols]` generated by the synthetic scene source
    pub scene_shape: [usize; 2],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mask_invalid: true,
            extent_warning_degrees: 1.0,
            scene_shape: [32, 32],
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or holds
    /// an invalid value.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or an invalid value.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.extent_warning_degrees.is_finite() || self.extent_warning_degrees <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "extent_warning_degrees",
                reason: format!("must be finite and positive, got {}", self.extent_warning_degrees),
            });
        }
        if self.scene_shape.contains(&0) {
            return Err(ConfigError::Invalid {
                name: "scene_shape",
                reason: format!("dimensions must be non-zero, got {:?}", self.scene_shape),
            });
        }
        Ok(())
    }
}
