//! Carbon converter
//!
//! Dry kelp biomass to CO₂-equivalent using fixed ratios.
//!
//! # Formula
//! ```text
//! C_kg    = M_kg × 0.325
//! CO2e_kg = C_kg × 3.67
//! CO2e_t  = CO2e_kg / 1000
//! ```
//!
//! # References
//! - Duarte, C.M. et al. (2017). "Can seaweed farming play a role in climate
//!   change mitigation and adaptation?" Frontiers in Marine Science 4:100.

use crate::core_types::units::{Kilograms, KILOGRAMS_PER_TONNE};
use serde::{Deserialize, Serialize};

/// Carbon mass fraction of dry kelp biomass
pub const CARBON_FRACTION: f64 = 0.325;

/// Molar mass ratio CO₂ : C (44.01 / 12.011)
pub const CO2_TO_CARBON_RATIO: f64 = 3.67;

/// CO₂-equivalent in tonnes for a dry biomass in kilograms.
///
/// Zero biomass yields exactly `0.0`.
pub fn estimate_co2e(biomass_kg: f64) -> f64 {
    if biomass_kg == 0.0 {
        return 0.0;
    }
    biomass_kg * CARBON_FRACTION * CO2_TO_CARBON_RATIO / KILOGRAMS_PER_TONNE
}

/// Sequestered carbon derived from a biomass total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonEstimate {
    /// Elemental carbon
    pub carbon_kg: f64,
    pub co2e_kg: f64,
    pub co2e_t: f64,
}

impl CarbonEstimate {
    pub fn from_biomass(biomass: Kilograms) -> Self {
        let biomass_kg = *biomass;
        if biomass_kg == 0.0 {
            return Self {
                carbon_kg: 0.0,
                co2e_kg: 0.0,
                co2e_t: 0.0,
            };
        }

        let carbon_kg = biomass_kg * CARBON_FRACTION;
        Self {
            carbon_kg,
            co2e_kg: carbon_kg * CO2_TO_CARBON_RATIO,
            co2e_t: estimate_co2e(biomass_kg),
        }
    }
}
