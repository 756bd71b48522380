//! Floating Algae Index and Normalized Difference Red Edge
//!
//! Both indices are computed element-wise over bands of identical shape. The
//! output carries `None` wherever the value is invalid, so there is no NaN in
//! a [`SpectralIndex`].
//!
//! # References
//! - Hu, C. (2009). "A novel ocean color index to detect floating algae in the
//!   global oceans." Remote Sensing of Environment, 113(10), 2118-2129.
//! - Barnes, E.M. et al. (2000). "Coincident detection of crop water stress,
//!   nitrogen status and canopy density using ground-based multispectral data."

use super::reflectance::{check_same_shape, is_valid_reflectance, ReflectanceSample};
use super::stats::IndexStatistics;
use crate::error::ShapeMismatchError;
use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sentinel-2 band 8 centre wavelength (nm)
pub const LAMBDA_NIR_NM: f64 = 842.0;

/// Sentinel-2 band 4 centre wavelength (nm)
pub const LAMBDA_RED_NM: f64 = 665.0;

/// Sentinel-2 band 11 centre wavelength (nm)
pub const LAMBDA_SWIR_NM: f64 = 1610.0;

/// Position of NIR on the RED→SWIR baseline
pub const FAI_BASELINE_RATIO: f64 =
    (LAMBDA_NIR_NM - LAMBDA_RED_NM) / (LAMBDA_SWIR_NM - LAMBDA_RED_NM);

/// Advisory FAI range; finite values outside it are reported
pub const FAI_ADVISORY_RANGE: (f64, f64) = (-0.5, 1.0);

/// Theoretical NDRE range
pub const NDRE_THEORETICAL_RANGE: (f64, f64) = (-1.0, 1.0);

/// NDRE range outside of which values are reported
pub const NDRE_WARNING_RANGE: (f64, f64) = (-1.1, 1.1);

/// One spectral index over a raster; `None` marks an invalid element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralIndex(ArrayD<Option<f64>>);

impl SpectralIndex {
    /// Wrap an array of optional values
    pub fn new(values: ArrayD<Option<f64>>) -> Self {
        Self(values)
    }

    /// Underlying array
    pub fn as_array(&self) -> &ArrayD<Option<f64>> {
        &self.0
    }

    /// Shape of the index raster
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the raster is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterator over valid values in logical order
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(|v| *v)
    }

    /// Number of valid elements
    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }

    /// First element, for single-pixel inputs
    pub fn first(&self) -> Option<f64> {
        self.0.iter().next().copied().flatten()
    }

    /// Mean of the valid elements, `None` if there are none
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .valid_values()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Summary statistics against an expected value range
    pub fn statistics(&self, expected_range: (f64, f64)) -> IndexStatistics {
        let valid: Vec<f64> = self.valid_values().collect();
        IndexStatistics::from_valid(self.len(), &valid, expected_range)
    }
}

/// FAI and NDRE computed from one reflectance sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralIndices {
    pub fai: SpectralIndex,
    pub ndre: SpectralIndex,
}

impl SpectralIndices {
    /// Means of both indices over their valid elements
    pub fn means(&self) -> (Option<f64>, Option<f64>) {
        (self.fai.mean(), self.ndre.mean())
    }
}

/// Compute the Floating Algae Index.
///
/// # Formula
/// ```text
/// FAI = NIR − (RED + (SWIR − RED) × (λ_NIR − λ_RED) / (λ_SWIR − λ_RED))
/// ```
///
/// With `mask_invalid`, any element whose NIR, SWIR or RED is non-finite,
/// negative or above 1 is `None`, and a warning reports how many valid values
/// fall outside [`FAI_ADVISORY_RANGE`]. Without it the arithmetic result is
/// kept as long as it is finite.
///
/// # Errors
///
/// [`ShapeMismatchError`] if the three bands differ in shape.
pub fn fai(
    nir: &ArrayD<f64>,
    swir: &ArrayD<f64>,
    red: &ArrayD<f64>,
    mask_invalid: bool,
) -> Result<SpectralIndex, ShapeMismatchError> {
    check_same_shape("nir", nir, "swir", swir)?;
    check_same_shape("nir", nir, "red", red)?;

    let mut out = ArrayD::from_elem(nir.raw_dim(), None);
    Zip::from(&mut out)
        .and(nir)
        .and(swir)
        .and(red)
        .par_for_each(|o, &n, &s, &r| {
            if mask_invalid && ![n, s, r].into_iter().all(is_valid_reflectance) {
                return;
            }
            let baseline = r + (s - r) * FAI_BASELINE_RATIO;
            *o = finite(n - baseline);
        });

    let index = SpectralIndex(out);
    if mask_invalid {
        report_out_of_range("FAI", &index, FAI_ADVISORY_RANGE, FAI_ADVISORY_RANGE);
    }
    Ok(index)
}

/// Compute the Normalized Difference Red Edge index.
///
/// # Formula
/// ```text
/// NDRE = (NIR − RE) / (NIR + RE)
/// ```
///
/// A zero denominator yields `None` rather than ±infinity. Masking follows
/// [`fai`]; the warning fires for valid values outside [`NDRE_WARNING_RANGE`].
///
/// # Errors
///
/// [`ShapeMismatchError`] if the two bands differ in shape.
pub fn ndre(
    red_edge: &ArrayD<f64>,
    nir: &ArrayD<f64>,
    mask_invalid: bool,
) -> Result<SpectralIndex, ShapeMismatchError> {
    check_same_shape("red_edge", red_edge, "nir", nir)?;

    let mut out = ArrayD::from_elem(nir.raw_dim(), None);
    Zip::from(&mut out)
        .and(red_edge)
        .and(nir)
        .par_for_each(|o, &re, &n| {
            if mask_invalid && !(is_valid_reflectance(re) && is_valid_reflectance(n)) {
                return;
            }
            let denominator = n + re;
            if denominator == 0.0 {
                return;
            }
            *o = finite((n - re) / denominator);
        });

    let index = SpectralIndex(out);
    if mask_invalid {
        report_out_of_range("NDRE", &index, NDRE_WARNING_RANGE, NDRE_THEORETICAL_RANGE);
    }
    Ok(index)
}

/// Compute both indices for a sample.
///
/// # Errors
///
/// [`ShapeMismatchError`] if the sample's bands differ in shape.
pub fn compute_indices(
    sample: &ReflectanceSample,
    mask_invalid: bool,
) -> Result<SpectralIndices, ShapeMismatchError> {
    sample.validate_shapes()?;
    Ok(SpectralIndices {
        fai: fai(&sample.nir, &sample.swir, &sample.red, mask_invalid)?,
        ndre: ndre(&sample.red_edge, &sample.nir, mask_invalid)?,
    })
}

#[inline]
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Warn about valid values outside `[lo, hi]`; returns how many there were.
fn report_out_of_range(
    name: &str,
    index: &SpectralIndex,
    (lo, hi): (f64, f64),
    (typical_lo, typical_hi): (f64, f64),
) -> usize {
    let count = index.valid_values().filter(|&v| v < lo || v > hi).count();
    if count > 0 {
        warn!(
            "Found {} {} values outside typical range [{}, {}]",
            count, name, typical_lo, typical_hi
        );
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;
    use approx::assert_relative_eq;
    use ndarray::{arr0, array};

    fn scalar(v: f64) -> ArrayD<f64> {
        arr0(v).into_dyn()
    }

    #[test]
    fn test_baseline_ratio() {
        assert_relative_eq!(FAI_BASELINE_RATIO, 177.0 / 945.0, epsilon = 1e-15);
    }

    #[test]
    fn test_fai_formula() {
        let (nir, swir, red) = (0.30, 0.25, 0.15);
        let result = fai(&scalar(nir), &scalar(swir), &scalar(red), true).unwrap();
        let expected = nir - (red + (swir - red) * 177.0 / 945.0);
        assert_relative_eq!(result.first().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ndre_formula() {
        let result = ndre(&scalar(0.20), &scalar(0.30), true).unwrap();
        assert_relative_eq!(result.first().unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_fai_masks_negative_red() {
        let masked = fai(&scalar(0.3), &scalar(0.25), &scalar(-0.1), true).unwrap();
        assert_eq!(masked.first(), None);

        let unmasked = fai(&scalar(0.3), &scalar(0.25), &scalar(-0.1), false).unwrap();
        let expected = 0.3 - (-0.1 + (0.25 + 0.1) * FAI_BASELINE_RATIO);
        assert_relative_eq!(unmasked.first().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_fai_masks_non_finite_and_above_one() {
        let nir = array![f64::NAN, 0.3, 0.3, 1.5].into_dyn();
        let swir = array![0.25, f64::INFINITY, 0.25, 0.25].into_dyn();
        let red = array![0.15, 0.15, 0.15, 0.15].into_dyn();
        let result = fai(&nir, &swir, &red, true).unwrap();
        let values: Vec<_> = result.as_array().iter().copied().collect();
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!(values[2].is_some());
        assert_eq!(values[3], None);
    }

    #[test]
    fn test_fai_advisory_warning_keeps_value() {
        let (result, logs) =
            capture_logs(|| fai(&scalar(0.0), &scalar(1.0), &scalar(1.0), true).unwrap());
        assert_eq!(result.first(), Some(-1.0));
        assert!(logs.contains("WARN"), "{logs}");
        assert!(
            logs.contains("Found 1 FAI values outside typical range [-0.5, 1]"),
            "{logs}"
        );
        assert_eq!(logs.matches("outside typical range").count(), 1);
    }

    #[test]
    fn test_fai_advisory_counts_every_value() {
        let nir = array![0.0, 0.0, 0.3].into_dyn();
        let swir = array![1.0, 1.0, 0.25].into_dyn();
        let red = array![1.0, 1.0, 0.15].into_dyn();
        let (result, logs) = capture_logs(|| fai(&nir, &swir, &red, true).unwrap());
        assert_eq!(result.valid_count(), 3);
        assert!(logs.contains("Found 2 FAI values"), "{logs}");
    }

    #[test]
    fn test_fai_in_range_or_unmasked_is_silent() {
        let (_, logs) = capture_logs(|| fai(&scalar(0.3), &scalar(0.25), &scalar(0.15), true));
        assert!(logs.is_empty(), "{logs}");

        let (result, logs) =
            capture_logs(|| fai(&scalar(0.0), &scalar(1.0), &scalar(1.0), false).unwrap());
        assert_eq!(result.first(), Some(-1.0));
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn test_ndre_warning_range_report() {
        let index = SpectralIndex::new(array![Some(1.5), Some(-2.0), Some(0.2), None].into_dyn());
        let (count, logs) = capture_logs(|| {
            report_out_of_range("NDRE", &index, NDRE_WARNING_RANGE, NDRE_THEORETICAL_RANGE)
        });
        assert_eq!(count, 2);
        assert!(
            logs.contains("Found 2 NDRE values outside typical range [-1, 1]"),
            "{logs}"
        );

        let edge = SpectralIndex::new(array![Some(1.05), Some(-1.1)].into_dyn());
        let (count, _) = capture_logs(|| {
            report_out_of_range("NDRE", &edge, NDRE_WARNING_RANGE, NDRE_THEORETICAL_RANGE)
        });
        assert_eq!(count, 0);
    }

    #[test]
    fn test_masked_ndre_never_warns() {
        let steps: Vec<f64> = (0..=10).map(|i| f64::from(i) / 10.0).collect();
        let band = |offset: usize| -> ArrayD<f64> {
            ArrayD::from_shape_fn(vec![11, 11], |ix| steps[ix[offset]])
        };
        let (result, logs) = capture_logs(|| ndre(&band(0), &band(1), true).unwrap());
        assert_eq!(result.valid_count(), 120);
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn test_unmasked_non_finite_is_still_invalid() {
        let result = fai(&scalar(f64::NAN), &scalar(0.25), &scalar(0.15), false).unwrap();
        assert_eq!(result.first(), None);
    }

    #[test]
    fn test_ndre_zero_denominator_is_invalid() {
        let masked = ndre(&scalar(0.0), &scalar(0.0), true).unwrap();
        assert_eq!(masked.first(), None);
        let unmasked = ndre(&scalar(0.0), &scalar(0.0), false).unwrap();
        assert_eq!(unmasked.first(), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = fai(
            &array![0.3, 0.4].into_dyn(),
            &array![0.25].into_dyn(),
            &array![0.15, 0.2, 0.1].into_dyn(),
            true,
        )
        .unwrap_err();
        assert_eq!(err.band, "swir");

        let err = ndre(&array![0.2].into_dyn(), &array![0.3, 0.4].into_dyn(), true).unwrap_err();
        assert_eq!(err.reference, "red_edge");
        assert_eq!(err.band, "nir");
    }

    #[test]
    fn test_determinism() {
        let nir = array![[0.15, 0.20], [0.25, 0.30]].into_dyn();
        let swir = array![[0.10, 0.15], [0.20, 0.25]].into_dyn();
        let red = array![[0.08, 0.10], [0.12, 0.15]].into_dyn();
        let a = fai(&nir, &swir, &red, true).unwrap();
        let b = fai(&nir, &swir, &red, true).unwrap();
        let bits = |idx: &SpectralIndex| -> Vec<Option<u64>> {
            idx.as_array().iter().map(|v| v.map(f64::to_bits)).collect()
        };
        assert_eq!(bits(&a), bits(&b));

        let c = ndre(&red, &nir, true).unwrap();
        let d = ndre(&red, &nir, true).unwrap();
        assert_eq!(bits(&c), bits(&d));
    }

    #[test]
    fn test_output_preserves_shape() {
        let band = ArrayD::from_elem(vec![3, 4, 2], 0.2);
        let result = ndre(&band, &band, true).unwrap();
        assert_eq!(result.shape(), &[3, 4, 2]);
        assert_eq!(result.valid_count(), 24);
        assert_eq!(result.mean(), Some(0.0));
    }

    #[test]
    fn test_ndre_bounded_on_reflectance_grid() {
        let steps: Vec<f64> = (0..=20).map(|i| f64::from(i) / 20.0).collect();
        for &re in &steps {
            for &n in &steps {
                if let Some(v) = ndre(&scalar(re), &scalar(n), true).unwrap().first() {
                    assert!((-1.0..=1.0).contains(&v), "NDRE({re}, {n}) = {v}");
                }
            }
        }
    }

    #[test]
    fn test_mean_skips_invalid() {
        let index = SpectralIndex::new(array![Some(0.1), None, Some(0.3)].into_dyn());
        assert_relative_eq!(index.mean().unwrap(), 0.2, epsilon = 1e-12);
        assert_eq!(index.valid_count(), 2);

        let empty = SpectralIndex::new(array![None, None].into_dyn());
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn test_compute_indices_from_sample() {
        let sample = ReflectanceSample::from_scalars(0.15, 0.30, 0.25, 0.20);
        let indices = compute_indices(&sample, true).unwrap();
        let (fai_mean, ndre_mean) = indices.means();
        assert!(fai_mean.is_some());
        assert_relative_eq!(ndre_mean.unwrap(), 0.2, epsilon = 1e-12);
    }
}
