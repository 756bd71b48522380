//! Summary statistics for a computed spectral index

use serde::{Deserialize, Serialize};

/// Validity and distribution summary of one index raster.
///
/// Distribution fields are `None` when the raster has no valid element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub percent_valid: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
    pub in_expected_range: usize,
    pub percent_in_range: f64,
}

impl IndexStatistics {
    /// Summarize `valid` values drawn from a raster of `total` elements.
    ///
    /// `invalid` saturates at zero if `valid` holds more than `total` values.
    pub fn from_valid(total: usize, valid: &[f64], (lo, hi): (f64, f64)) -> Self {
        let n = valid.len();
        let percent_valid = if total == 0 {
            0.0
        } else {
            100.0 * n as f64 / total as f64
        };

        if n == 0 {
            return Self {
                total,
                valid: 0,
                invalid: total,
                percent_valid,
                min: None,
                max: None,
                mean: None,
                std_dev: None,
                in_expected_range: 0,
                percent_in_range: 0.0,
            };
        }

        let mean = valid.iter().sum::<f64>() / n as f64;
        let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let in_expected_range = valid.iter().filter(|&&v| (lo..=hi).contains(&v)).count();

        Self {
            total,
            valid: n,
            invalid: total.saturating_sub(n),
            percent_valid,
            min: valid.iter().copied().reduce(f64::min),
            max: valid.iter().copied().reduce(f64::max),
            mean: Some(mean),
            std_dev: Some(variance.sqrt()),
            in_expected_range,
            percent_in_range: 100.0 * in_expected_range as f64 / n as f64,
        }
    }
}
