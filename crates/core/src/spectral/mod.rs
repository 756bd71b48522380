//! Spectral index engine
//!
//! Vectorized FAI and NDRE over reflectance rasters, with validity masking and
//! advisory range reporting. Every caller that starts from reflectance goes
//! through [`compute_indices`], so each formula exists exactly once.

pub mod indices;
pub mod reflectance;
pub mod stats;

pub use indices::{
    compute_indices, fai, ndre, SpectralIndex, SpectralIndices, FAI_ADVISORY_RANGE,
    NDRE_THEORETICAL_RANGE,
};
pub use reflectance::{is_valid_reflectance, ReflectanceSample};
pub use stats::IndexStatistics;
