//! Polygon area for a user-drawn area of interest
//!
//! Area is computed with the planar Shoelace formula on (lon, lat) pairs and
//! converted to square meters with a latitude-corrected scale factor.
//!
//! # Formula
//! ```text
//! A_deg² = |Σ (x_i × y_{i+1} − x_{i+1} × y_i)| / 2
//! A_m²   = A_deg² × m_lat × m_lon
//! m_lat  = 111 000 m
//! m_lon  = 111 000 m × cos(φ̄)
//! ```
//!
//! Where **φ̄** is the arithmetic mean latitude of the ring.
//!
//! # Limitations
//! This is a planar approximation, not an ellipsoidal geodesic area. It is
//! accurate for regions up to a few tens of kilometers across; the error grows
//! with extent and with latitude span. Polygons wider than the configured
//! extent threshold are reported with a warning but still computed.

use crate::core_types::units::SquareMeters;
use crate::error::GeometryError;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::warn;

/// Meters per degree of latitude (treated as constant)
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Meters per degree of longitude at the equator
pub const METERS_PER_DEGREE_LON_EQUATOR: f64 = 111_000.0;

/// Span (degrees) above which the planar approximation is flagged
pub const DEFAULT_EXTENT_WARNING_DEGREES: f64 = 1.0;

/// Minimum number of distinct vertices in a ring
pub const MIN_DISTINCT_VERTICES: usize = 3;

/// A closed polygon ring of (longitude, latitude) vertices in degrees.
///
/// The stored ring never repeats the first vertex at the end. Construction
/// validates every coordinate, so an `AreaOfInterest` is always usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct AreaOfInterest {
    vertices: Vec<(f64, f64)>,
}

impl AreaOfInterest {
    /// Build a ring from (lon, lat) pairs.
    ///
    /// A final vertex equal to the first is treated as the closing vertex and
    /// dropped.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::MalformedCoordinate`] for a non-finite coordinate,
    ///   a longitude outside [-180, 180] or a latitude outside [-90, 90]
    /// - [`GeometryError::TooFewVertices`] when fewer than three distinct
    ///   vertices remain
    pub fn from_vertices(mut vertices: Vec<(f64, f64)>) -> Result<Self, GeometryError> {
        for (index, &(lon, lat)) in vertices.iter().enumerate() {
            validate_coordinate(index, lon, lat)?;
        }

        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        // +0.0 folds -0.0 onto 0.0 so both hash alike
        let distinct = vertices
            .iter()
            .map(|&(lon, lat)| ((lon + 0.0).to_bits(), (lat + 0.0).to_bits()))
            .collect::<FxHashSet<_>>()
            .len();
        if distinct < MIN_DISTINCT_VERTICES {
            return Err(GeometryError::TooFewVertices { found: distinct });
        }

        Ok(Self { vertices })
    }

    /// Parse a `POLYGON((lon lat, lon lat, ...))` WKT literal.
    ///
    /// The keyword is case-insensitive. Extra ordinates (Z, M) after the first
    /// two are ignored. Polygons with holes are rejected.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidWkt`] for anything other than a single-ring
    /// polygon, plus every error of [`AreaOfInterest::from_vertices`].
    pub fn from_wkt(wkt: &str) -> Result<Self, GeometryError> {
        let trimmed = wkt.trim();
        let open = trimmed.find('(').ok_or_else(|| {
            GeometryError::InvalidWkt("expected POLYGON((x1 y1, x2 y2, ...))".into())
        })?;
        let (keyword, body) = trimmed.split_at(open);
        if !keyword.trim().eq_ignore_ascii_case("POLYGON") {
            return Err(GeometryError::InvalidWkt(format!(
                "unsupported geometry type '{}'",
                keyword.trim()
            )));
        }

        let ring = strip_parens(body)
            .and_then(strip_parens)
            .ok_or_else(|| GeometryError::InvalidWkt("unbalanced parentheses".into()))?;
        if ring.contains(['(', ')']) {
            return Err(GeometryError::InvalidWkt(
                "multi-ring polygons are not supported".into(),
            ));
        }

        let vertices = ring
            .split(',')
            .enumerate()
            .map(|(index, pair)| parse_pair(index, pair))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_vertices(vertices)
    }

    /// Ring vertices without the closing duplicate
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Render as a closed WKT polygon
    pub fn to_wkt(&self) -> String {
        let mut out = String::from("POLYGON((");
        for &(lon, lat) in self.vertices.iter().chain(self.vertices.first()) {
            if out.len() > "POLYGON((".len() {
                out.push_str(", ");
            }
            let _ = write!(out, "{lon} {lat}");
        }
        out.push_str("))");
        out
    }

    /// Bounding box as `[west, south, east, north]`
    pub fn bounding_box(&self) -> [f64; 4] {
        self.vertices.iter().fold(
            [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
            |[w, s, e, n], &(lon, lat)| [w.min(lon), s.min(lat), e.max(lon), n.max(lat)],
        )
    }

    /// Longitude and latitude span in degrees
    pub fn extent_degrees(&self) -> (f64, f64) {
        let [west, south, east, north] = self.bounding_box();
        (east - west, north - south)
    }

    /// Arithmetic mean latitude of the ring vertices
    pub fn mean_latitude(&self) -> f64 {
        self.vertices.iter().map(|&(_, lat)| lat).sum::<f64>() / self.vertices.len() as f64
    }

    /// Unsigned Shoelace area in square degrees
    pub fn area_square_degrees(&self) -> f64 {
        let n = self.vertices.len();
        // Centering on the mean vertex keeps the cross products small
        let (cx, cy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (cx, cy) = (cx / n as f64, cy / n as f64);

        let twice_signed: f64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.vertices[i];
                let (x1, y1) = self.vertices[(i + 1) % n];
                (x0 - cx) * (y1 - cy) - (x1 - cx) * (y0 - cy)
            })
            .sum();

        twice_signed.abs() / 2.0
    }

    /// Latitude-corrected planar area in square meters.
    ///
    /// Warns when either span exceeds `extent_warning_degrees`.
    pub fn area(&self, extent_warning_degrees: f64) -> SquareMeters {
        let (lon_span, lat_span) = self.extent_degrees();
        if lon_span > extent_warning_degrees || lat_span > extent_warning_degrees {
            warn!(
                "Polygon spans {:.3}° lon × {:.3}° lat (threshold {:.3}°); \
                 planar area approximation may be inaccurate",
                lon_span, lat_span, extent_warning_degrees
            );
        }

        self.planar_area()
    }

    /// Latitude-corrected planar area without the extent check
    pub fn planar_area(&self) -> SquareMeters {
        let meters_per_degree_lon =
            METERS_PER_DEGREE_LON_EQUATOR * self.mean_latitude().to_radians().cos();
        let area = self.area_square_degrees() * METERS_PER_DEGREE_LAT * meters_per_degree_lon;

        // cos() of ±90° can dip a hair below zero
        SquareMeters::new(area.max(0.0))
    }
}

impl TryFrom<Vec<(f64, f64)>> for AreaOfInterest {
    type Error = GeometryError;

    fn try_from(vertices: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        Self::from_vertices(vertices)
    }
}

impl From<AreaOfInterest> for Vec<(f64, f64)> {
    fn from(aoi: AreaOfInterest) -> Self {
        aoi.vertices
    }
}

/// Validate a vertex ring and return its area in square meters.
///
/// # Errors
///
/// See [`AreaOfInterest::from_vertices`].
pub fn compute_area(vertices: &[(f64, f64)]) -> Result<SquareMeters, GeometryError> {
    let aoi = AreaOfInterest::from_vertices(vertices.to_vec())?;
    Ok(aoi.area(DEFAULT_EXTENT_WARNING_DEGREES))
}

fn validate_coordinate(index: usize, lon: f64, lat: f64) -> Result<(), GeometryError> {
    let reason = if !lon.is_finite() || !lat.is_finite() {
        format!("coordinates must be finite, got ({lon}, {lat})")
    } else if !(-180.0..=180.0).contains(&lon) {
        format!("longitude {lon} out of range [-180, 180]")
    } else if !(-90.0..=90.0).contains(&lat) {
        format!("latitude {lat} out of range [-90, 90]")
    } else {
        return Ok(());
    };
    Err(GeometryError::MalformedCoordinate { index, reason })
}

fn strip_parens(s: &str) -> Option<&str> {
    s.trim()
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
}

fn parse_pair(index: usize, pair: &str) -> Result<(f64, f64), GeometryError> {
    let malformed = |reason: String| GeometryError::MalformedCoordinate { index, reason };
    let mut parts = pair.split_whitespace();
    let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
        return Err(malformed(format!("expected 'lon lat', got '{}'", pair.trim())));
    };
    let lon = lon
        .parse::<f64>()
        .map_err(|e| malformed(format!("longitude '{lon}': {e}")))?;
    let lat = lat
        .parse::<f64>()
        .map_err(|e| malformed(format!("latitude '{lat}': {e}")))?;
    Ok((lon, lat))
}
