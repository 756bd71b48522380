//! Kelp Carbon Core Library
//!
//! Estimates kelp biomass and its CO₂-equivalent sequestration for a polygon
//! on a date, from satellite-derived spectral indices and an injected
//! regression model.
//!
//! ## Pipeline
//!
//! - [`geometry`]: latitude-corrected planar area of the area of interest
//! - [`spectral`]: Floating Algae Index and Normalized Difference Red Edge
//!   over reflectance rasters, with validity masking
//! - [`biomass`]: model prediction clamped to a plausible density, scaled by area
//! - [`carbon`]: fixed-ratio conversion to CO₂-equivalent
//! - [`analysis`]: composes the above into one result record per request
//!
//! Spectral means come from a [`SpectralSource`]; the crate ships synthetic
//! and reflectance-backed sources, while real imagery retrieval stays outside.
//!
//! ## Example
//!
//! ```
//! use kelp_carbon_core::{AnalyzeRequest, KelpAnalyzer, LinearBiomassModel, PipelineConfig};
//! use kelp_carbon_core::source::SyntheticSpectralSource;
//! use std::sync::Arc;
//!
//! let model = Arc::new(LinearBiomassModel::new(0.5, 20.0, 8.0));
//! let analyzer = KelpAnalyzer::new(model, PipelineConfig::default());
//! let request = AnalyzeRequest::from_wkt(
//!     "2024-06-15",
//!     "POLYGON((-123.5 48.4, -123.4 48.4, -123.4 48.5, -123.5 48.5, -123.5 48.4))",
//! )
//! .unwrap();
//!
//! let record = analyzer.analyze(&request, &SyntheticSpectralSource).unwrap().to_record();
//! assert!(record.biomass_density_t_ha <= 100.0);
//! ```

pub mod analysis;
pub mod biomass;
pub mod carbon;
pub mod config;
pub mod core_types;
pub mod error;
pub mod geometry;
pub mod source;
pub mod spectral;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::{AnalysisRecord, AnalysisResult, AnalyzeRequest, KelpAnalyzer};
pub use biomass::{
    clamp_density, estimate_biomass, BiomassEstimate, BiomassModel, DensityAssessment,
    LinearBiomassModel,
};
pub use carbon::{estimate_co2e, CarbonEstimate};
pub use config::PipelineConfig;
pub use error::{
    ConfigError, GeometryError, KelpError, ModelLoadError, PredictionError, ShapeMismatchError,
    SpectralSourceError,
};
pub use geometry::{compute_area, AreaOfInterest};
pub use source::{SpectralObservation, SpectralSource};
pub use spectral::{compute_indices, fai, ndre, ReflectanceSample, SpectralIndex, SpectralIndices};
