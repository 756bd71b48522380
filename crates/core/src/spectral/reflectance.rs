//! Surface-reflectance bands feeding the spectral indices

use crate::error::ShapeMismatchError;
use ndarray::{arr0, ArrayD, IxDyn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Typical kelp-canopy reflectance ranges, (min, max) per band.
pub mod kelp_canopy {
    /// Band 4, 665 nm
    pub const RED: (f64, f64) = (0.08, 0.13);
    /// Band 8, 842 nm
    pub const NIR: (f64, f64) = (0.15, 0.25);
    /// Band 11, 1610 nm
    pub const SWIR: (f64, f64) = (0.10, 0.175);
    /// Band 5, 705 nm
    pub const RED_EDGE: (f64, f64) = (0.12, 0.18);
}

/// Whether a value is a physically meaningful reflectance fraction.
#[inline]
pub fn is_valid_reflectance(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Per-band surface reflectance, each band in [0, 1].
///
/// Bands may be scalars (0-d arrays) or rasters of any dimension, but all four
/// must share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectanceSample {
    pub red: ArrayD<f64>,
    pub nir: ArrayD<f64>,
    pub swir: ArrayD<f64>,
    pub red_edge: ArrayD<f64>,
}

impl ReflectanceSample {
    /// Create a sample, checking that all bands share the shape of `red`.
    ///
    /// # Errors
    ///
    /// [`ShapeMismatchError`] naming the first band that differs.
    pub fn new(
        red: ArrayD<f64>,
        nir: ArrayD<f64>,
        swir: ArrayD<f64>,
        red_edge: ArrayD<f64>,
    ) -> Result<Self, ShapeMismatchError> {
        let sample = Self {
            red,
            nir,
            swir,
            red_edge,
        };
        sample.validate_shapes()?;
        Ok(sample)
    }

    /// Single-pixel sample
    pub fn from_scalars(red: f64, nir: f64, swir: f64, red_edge: f64) -> Self {
        Self {
            red: arr0(red).into_dyn(),
            nir: arr0(nir).into_dyn(),
            swir: arr0(swir).into_dyn(),
            red_edge: arr0(red_edge).into_dyn(),
        }
    }

    /// Random kelp-canopy scene of the given raster shape.
    ///
    /// Each pixel draws every band uniformly from its [`kelp_canopy`] range.
    pub fn synthetic_scene<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let mut band = |(lo, hi): (f64, f64)| {
            ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.random_range(lo..hi))
        };
        Self {
            red: band(kelp_canopy::RED),
            nir: band(kelp_canopy::NIR),
            swir: band(kelp_canopy::SWIR),
            red_edge: band(kelp_canopy::RED_EDGE),
        }
    }

    /// Shape shared by all bands (the red band's shape)
    pub fn shape(&self) -> &[usize] {
        self.red.shape()
    }

    /// Number of pixels per band
    pub fn len(&self) -> usize {
        self.red.len()
    }

    /// True if the bands hold no pixels
    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Check that every band matches the red band's shape.
    ///
    /// # Errors
    ///
    /// [`ShapeMismatchError`] naming the first band that differs.
    pub fn validate_shapes(&self) -> Result<(), ShapeMismatchError> {
        for (name, band) in [
            ("nir", &self.nir),
            ("swir", &self.swir),
            ("red_edge", &self.red_edge),
        ] {
            check_same_shape("red", &self.red, name, band)?;
        }
        Ok(())
    }

    /// Count of pixels where every band is a valid reflectance
    pub fn valid_pixel_count(&self) -> usize {
        if self.validate_shapes().is_err() {
            return 0;
        }
        ndarray::Zip::from(&self.red)
            .and(&self.nir)
            .and(&self.swir)
            .and(&self.red_edge)
            .fold(0, |count, &r, &n, &s, &e| {
                let valid = [r, n, s, e].into_iter().all(is_valid_reflectance);
                count + usize::from(valid)
            })
    }
}

/// Shape equality check shared by the index functions.
pub(crate) fn check_same_shape(
    reference: &'static str,
    expected: &ArrayD<f64>,
    band: &'static str,
    found: &ArrayD<f64>,
) -> Result<(), ShapeMismatchError> {
    if expected.shape() == found.shape() {
        Ok(())
    } else {
        Err(ShapeMismatchError {
            reference,
            band,
            expected: expected.shape().to_vec(),
            found: found.shape().to_vec(),
        })
    }
}
