//! Error types for the estimation pipeline
//!
//! Every failure is deterministic for a given input, so nothing here is
//! retried internally. Soft range violations are logged, never raised.

use thiserror::Error;

/// Malformed or degenerate polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Fewer than three distinct vertices once the closing vertex is dropped.
    #[error("polygon needs at least 3 distinct vertices, found {found}")]
    TooFewVertices { found: usize },

    /// Non-finite or out-of-range coordinate.
    #[error("malformed coordinate at vertex {index}: {reason}")]
    MalformedCoordinate { index: usize, reason: String },

    /// Text that is not a `POLYGON((lon lat, ...))` literal.
    #[error("invalid WKT polygon: {0}")]
    InvalidWkt(String),
}

/// Spectral bands of differing shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("band '{band}' has shape {found:?}, expected same shape as '{reference}' {expected:?}")]
pub struct ShapeMismatchError {
    pub reference: &'static str,
    pub band: &'static str,
    pub expected: Vec<usize>,
    pub found: Vec<usize>,
}

/// Failure of the regression capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// The model itself raised.
    #[error("biomass model failed: {0}")]
    Failed(String),

    /// Feature matrix without the two columns `[fai, ndre]`.
    #[error("biomass model expects 2 feature columns, got {0}")]
    FeatureWidth(usize),

    /// No prediction came back for the requested row.
    #[error("biomass model returned {found} predictions for {expected} rows")]
    OutputLength { expected: usize, found: usize },

    /// NaN or infinite density.
    #[error("biomass model returned non-finite density {0}")]
    NonFinite(f64),
}

/// Failure of the external spectral collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectralSourceError {
    /// The collaborator could not produce observations.
    #[error("spectral data unavailable: {0}")]
    Unavailable(String),

    /// Means were produced but are not usable numbers.
    #[error("spectral means must be finite, got fai={fai}, ndre={ndre}")]
    NonFiniteMeans { fai: f64, ndre: f64 },

    /// Reflectance bands did not line up.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),
}

/// Failure to load a regression artifact at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file not found: {0}")]
    NotFound(String),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model coefficient '{name}' must be finite, got {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },
}

/// Failure to load a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Top-level error for one analysis request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KelpError {
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Spectral(#[from] SpectralSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_messages() {
        let err = GeometryError::TooFewVertices { found: 2 };
        assert_eq!(
            err.to_string(),
            "polygon needs at least 3 distinct vertices, found 2"
        );
    }

    #[test]
    fn test_kelp_error_is_transparent() {
        let err: KelpError = PredictionError::NonFinite(f64::NAN).into();
        assert!(err.to_string().contains("non-finite density"));
    }

    #[test]
    fn test_shape_mismatch_message_names_bands() {
        let err = ShapeMismatchError {
            reference: "nir",
            band: "swir",
            expected: vec![2],
            found: vec![1],
        };
        let msg = err.to_string();
        assert!(msg.contains("swir") && msg.contains("nir"));
    }
}
