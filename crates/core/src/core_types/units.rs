//! Semantic unit types for area, mass and density quantities
//!
//! Newtype wrappers keep square meters, kilograms, tonnes and the two density
//! units from being mixed up as the estimate flows from geometry through
//! biomass to carbon.
//!
//! # Design Philosophy
//! - All quantities use f64; totals for large polygons reach 1e8 kg and beyond
//! - `Deref<Target = f64>` for direct arithmetic on the raw value
//! - Explicit conversion methods between related units
//! - `#[serde(transparent)]` so records serialize as plain numbers
//! - Total ordering via `Ord` (NaN sorts above all values)
//!
//! # Usage
//! ```
//! use kelp_carbon_core::core_types::units::{Kilograms, SquareMeters};
//!
//! let area = SquareMeters::new(81_400_000.0);
//! assert!((*area.to_square_kilometers() - 81.4).abs() < 1e-9);
//!
//! let mass = Kilograms::new(2_500.0);
//! assert_eq!(*mass.to_tonnes(), 2.5);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, Mul};

/// Square meters per hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Square meters per square kilometer
pub const SQUARE_METERS_PER_SQUARE_KILOMETER: f64 = 1_000_000.0;

/// Kilograms per metric tonne
pub const KILOGRAMS_PER_TONNE: f64 = 1_000.0;

/// Shared trait impls: total ordering, `Deref`, raw-value conversions and `Display`.
macro_rules! quantity {
    ($name:ident, $suffix:literal) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<$name> for f64 {
            fn from(q: $name) -> f64 {
                q.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.3} {}", self.0, $suffix)
            }
        }
    };
}

// ============================================================================
// AREA
// ============================================================================

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareMeters(f64);

quantity!(SquareMeters, "m²");

impl SquareMeters {
    /// Zero area
    pub const ZERO: SquareMeters = SquareMeters(0.0);

    /// Create a new area. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "SquareMeters::new: negative area is invalid");
        SquareMeters(value)
    }

    /// Convert to hectares (1 ha = 10 000 m²)
    #[inline]
    #[must_use]
    pub fn to_hectares(self) -> Hectares {
        Hectares(self.0 / SQUARE_METERS_PER_HECTARE)
    }

    /// Convert to square kilometers
    #[inline]
    #[must_use]
    pub fn to_square_kilometers(self) -> SquareKilometers {
        SquareKilometers(self.0 / SQUARE_METERS_PER_SQUARE_KILOMETER)
    }
}

/// Area in hectares
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Hectares(f64);

quantity!(Hectares, "ha");

/// Area in square kilometers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareKilometers(f64);

quantity!(SquareKilometers, "km²");

// ============================================================================
// MASS
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilograms(f64);

quantity!(Kilograms, "kg");

impl Kilograms {
    /// Zero mass
    pub const ZERO: Kilograms = Kilograms(0.0);

    /// Create a new mass in kilograms. Asserts value >= 0 (non-negative mass).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Kilograms::new: negative mass is invalid");
        Kilograms(value)
    }

    /// Convert to metric tonnes
    #[inline]
    #[must_use]
    pub fn to_tonnes(self) -> Tonnes {
        Tonnes(self.0 / KILOGRAMS_PER_TONNE)
    }
}

/// Mass in metric tonnes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Tonnes(f64);

quantity!(Tonnes, "t");

impl Tonnes {
    /// Create a new mass in tonnes. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Tonnes::new: negative mass is invalid");
        Tonnes(value)
    }
}

// ============================================================================
// AREAL DENSITY
// ============================================================================

/// Areal biomass density in kg/m² (dry weight)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct KilogramsPerSquareMeter(f64);

quantity!(KilogramsPerSquareMeter, "kg/m²");

impl KilogramsPerSquareMeter {
    /// Create a new density. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= 0.0,
            "KilogramsPerSquareMeter::new: negative density is invalid"
        );
        KilogramsPerSquareMeter(value)
    }
}

/// Density times area gives total mass
impl Mul<SquareMeters> for KilogramsPerSquareMeter {
    type Output = Kilograms;
    fn mul(self, rhs: SquareMeters) -> Kilograms {
        Kilograms(self.0 * rhs.0)
    }
}

/// Areal biomass density in t/ha
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TonnesPerHectare(f64);

quantity!(TonnesPerHectare, "t/ha");

impl TonnesPerHectare {
    /// Zero density
    pub const ZERO: TonnesPerHectare = TonnesPerHectare(0.0);

    /// Total tonnes spread over an area. A zero area yields zero density.
    #[must_use]
    pub fn from_total(total: Tonnes, area: SquareMeters) -> Self {
        if area.0 <= 0.0 {
            return Self::ZERO;
        }
        TonnesPerHectare(total.0 / area.to_hectares().0)
    }
}
