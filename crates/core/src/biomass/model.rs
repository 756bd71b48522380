//! Regression capability consumed by the biomass estimator
//!
//! The estimator only sees [`BiomassModel::predict`]. Training happens
//! elsewhere; this module defines the seam, a closure adapter, and a linear
//! artifact that can be loaded from JSON at startup.

use crate::error::{ModelLoadError, PredictionError};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Number of feature columns: `[fai, ndre]`
pub const FEATURE_COUNT: usize = 2;

/// Trained regression mapping `[fai, ndre]` rows to raw density (kg/m²).
///
/// Loaded once at process start and shared read-only across requests, hence
/// the `Send + Sync` bound. Implementations must not mutate internal state in
/// `predict`.
pub trait BiomassModel: Send + Sync {
    /// Predict one raw density per feature row.
    ///
    /// # Arguments
    ///
    /// * `features` - n×2 matrix, one `[fai, ndre]` row per sample
    ///
    /// # Errors
    ///
    /// [`PredictionError`] if the model cannot produce predictions.
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, PredictionError>;
}

impl<F> BiomassModel for F
where
    F: Fn(&DMatrix<f64>) -> Result<DVector<f64>, PredictionError> + Send + Sync,
{
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, PredictionError> {
        self(features)
    }
}

/// Linear regression artifact.
///
/// ```text
/// density = intercept + fai_coefficient × FAI + ndre_coefficient × NDRE
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearBiomassModel {
    pub intercept: f64,
    pub fai_coefficient: f64,
    pub ndre_coefficient: f64,
}

impl LinearBiomassModel {
    pub fn new(intercept: f64, fai_coefficient: f64, ndre_coefficient: f64) -> Self {
        Self {
            intercept,
            fai_coefficient,
            ndre_coefficient,
        }
    }

    /// Load coefficients from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ModelLoadError::NotFound`] if the file is missing, otherwise
    /// read, parse or coefficient validation errors.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.display().to_string()));
        }
        let model = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!("Loaded linear biomass model from {}", path.display());
        Ok(model)
    }

    /// Parse coefficients from JSON text.
    ///
    /// # Errors
    ///
    /// Parse errors, or [`ModelLoadError::InvalidCoefficient`] for a
    /// non-finite coefficient.
    pub fn from_json_str(text: &str) -> Result<Self, ModelLoadError> {
        let model: Self = serde_json::from_str(text)?;
        for (name, value) in [
            ("intercept", model.intercept),
            ("fai_coefficient", model.fai_coefficient),
            ("ndre_coefficient", model.ndre_coefficient),
        ] {
            if !value.is_finite() {
                return Err(ModelLoadError::InvalidCoefficient { name, value });
            }
        }
        Ok(model)
    }
}

impl BiomassModel for LinearBiomassModel {
    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, PredictionError> {
        if features.ncols() != FEATURE_COUNT {
            return Err(PredictionError::FeatureWidth(features.ncols()));
        }
        let weights = DVector::from_column_slice(&[self.fai_coefficient, self.ndre_coefficient]);
        Ok((features * weights).add_scalar(self.intercept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_prediction() {
        let model = LinearBiomassModel::new(0.5, 20.0, 8.0);
        let features = DMatrix::from_row_slice(2, 2, &[0.15, 0.25, 0.0, 0.0]);
        let out = model.predict(&features).unwrap();
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0], 0.5 + 3.0 + 2.0, epsilon = 1e-12);
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_wrong_feature_width() {
        let model = LinearBiomassModel::new(0.0, 1.0, 1.0);
        let features = DMatrix::from_row_slice(1, 3, &[0.1, 0.2, 0.3]);
        assert_eq!(
            model.predict(&features).unwrap_err(),
            PredictionError::FeatureWidth(3)
        );
    }

    #[test]
    fn test_closure_is_a_model() {
        let fixed = |features: &DMatrix<f64>| {
            Ok::<_, PredictionError>(DVector::from_element(features.nrows(), 4.2))
        };
        let out = fixed.predict(&DMatrix::zeros(1, 2)).unwrap();
        assert_eq!(out[0], 4.2);
    }

    #[test]
    fn test_from_json_str() {
        let model = LinearBiomassModel::from_json_str(
            r#"{"intercept": 1.0, "fai_coefficient": 2.0, "ndre_coefficient": 3.0}"#,
        )
        .unwrap();
        assert_eq!(model, LinearBiomassModel::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_missing_file() {
        let err =
            LinearBiomassModel::from_json_file("/nonexistent/biomass_model.json").unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = LinearBiomassModel::from_json_str(r#"{"intercept": 1.0}"#).unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }
}
