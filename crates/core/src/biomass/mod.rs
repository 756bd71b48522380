//! Biomass estimator
//!
//! Converts mean spectral indices into a physically bounded biomass density
//! via an injected regression capability, then scales by area.
//!
//! # Formula
//! ```text
//! ρ     = clamp(predict([FAI, NDRE]), 0, 10)   kg/m²
//! M_kg  = ρ × A
//! M_t   = M_kg / 1000
//! D_tha = M_t / (A / 10 000)                   (0 when A = 0)
//! ```
//!
//! Field surveys rarely report kelp beyond ~10 kg dry weight per m² even on
//! the densest long-line farms, and negative density has no physical meaning.

pub mod model;

pub use model::{BiomassModel, LinearBiomassModel};

use crate::core_types::units::{
    Kilograms, KilogramsPerSquareMeter, SquareMeters, Tonnes, TonnesPerHectare,
};
use crate::error::PredictionError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Lower clamp bound (kg/m²)
pub const MIN_DENSITY_KG_M2: f64 = 0.0;

/// Upper clamp bound (kg/m²)
pub const MAX_DENSITY_KG_M2: f64 = 10.0;

/// Above this a density is dense but plausible (kg/m²)
pub const DENSE_DENSITY_KG_M2: f64 = 7.0;

/// How a raw model density related to the plausible range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityAssessment {
    /// Within [0, 7]
    Plausible,
    /// Within (7, 10]
    Dense,
    /// Above 10, clamped down
    ClampedHigh,
    /// Below 0, clamped up
    ClampedNegative,
}

/// Biomass for one area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomassEstimate {
    /// Model output before clamping (kg/m²)
    pub raw_density: f64,
    /// Clamped density, always in [0, 10]
    pub density: KilogramsPerSquareMeter,
    pub total: Kilograms,
    pub total_tonnes: Tonnes,
    pub density_per_hectare: TonnesPerHectare,
    pub assessment: DensityAssessment,
}

/// Clamp a raw density into [0, 10] kg/m² and classify it.
///
/// Logs a warning above 10 (possible model-quality issue) and an info note
/// above 7. The clamp is applied regardless of logging.
pub fn clamp_density(raw: f64) -> (KilogramsPerSquareMeter, DensityAssessment) {
    let assessment = if raw > MAX_DENSITY_KG_M2 {
        warn!(
            "Model predicted {:.2} kg/m², above the {:.1} kg/m² plausible maximum; \
             clamping (check model quality)",
            raw, MAX_DENSITY_KG_M2
        );
        DensityAssessment::ClampedHigh
    } else if raw > DENSE_DENSITY_KG_M2 {
        info!(
            "Dense kelp canopy: {:.2} kg/m² (plausible up to {:.1} kg/m²)",
            raw, MAX_DENSITY_KG_M2
        );
        DensityAssessment::Dense
    } else if raw < MIN_DENSITY_KG_M2 {
        DensityAssessment::ClampedNegative
    } else {
        DensityAssessment::Plausible
    };

    let density = KilogramsPerSquareMeter::new(raw.clamp(MIN_DENSITY_KG_M2, MAX_DENSITY_KG_M2));
    (density, assessment)
}

/// Estimate total biomass for an area.
///
/// # Arguments
/// * `mean_fai` - Mean Floating Algae Index over the area
/// * `mean_ndre` - Mean Normalized Difference Red Edge over the area
/// * `area` - Area in square meters
/// * `model` - Regression capability
///
/// # Errors
///
/// [`PredictionError`] if the model fails, returns no value for the row, or
/// returns a non-finite density.
pub fn estimate_biomass<M>(
    mean_fai: f64,
    mean_ndre: f64,
    area: SquareMeters,
    model: &M,
) -> Result<BiomassEstimate, PredictionError>
where
    M: BiomassModel + ?Sized,
{
    let features = DMatrix::from_row_slice(1, model::FEATURE_COUNT, &[mean_fai, mean_ndre]);
    let predictions = model.predict(&features)?;
    if predictions.len() != 1 {
        return Err(PredictionError::OutputLength {
            expected: 1,
            found: predictions.len(),
        });
    }

    let raw_density = predictions[0];
    if !raw_density.is_finite() {
        return Err(PredictionError::NonFinite(raw_density));
    }

    let (density, assessment) = clamp_density(raw_density);
    let total = density * area;
    let total_tonnes = total.to_tonnes();

    Ok(BiomassEstimate {
        raw_density,
        density,
        total,
        total_tonnes,
        density_per_hectare: TonnesPerHectare::from_total(total_tonnes, area),
        assessment,
    })
}
