//! Analysis orchestrator
//!
//! One request runs five linear stages:
//!
//! ```text
//! ParseGeometry → ObtainSpectralMeans → EstimateBiomass → ConvertCarbon → AssembleResult
//! ```
//!
//! No stage retries and any failure aborts the request with the originating
//! error. The regression model is injected once and shared read-only, so a
//! single [`KelpAnalyzer`] can serve concurrent requests.

use crate::biomass::{estimate_biomass, BiomassEstimate, BiomassModel};
use crate::carbon::CarbonEstimate;
use crate::config::PipelineConfig;
use crate::core_types::units::SquareMeters;
use crate::error::{GeometryError, KelpError, SpectralSourceError};
use crate::geometry::AreaOfInterest;
use crate::source::SpectralSource;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inbound request: ISO date and (lon, lat) ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub date: String,
    pub polygon: Vec<(f64, f64)>,
}

impl AnalyzeRequest {
    pub fn new(date: impl Into<String>, polygon: Vec<(f64, f64)>) -> Self {
        Self {
            date: date.into(),
            polygon,
        }
    }

    /// Build a request from a WKT polygon.
    ///
    /// # Errors
    ///
    /// [`GeometryError`] if the WKT is not a valid polygon.
    pub fn from_wkt(date: impl Into<String>, wkt: &str) -> Result<Self, GeometryError> {
        let aoi = AreaOfInterest::from_wkt(wkt)?;
        Ok(Self::new(date, aoi.into()))
    }
}

/// Full outcome of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub date: NaiveDate,
    pub aoi: AreaOfInterest,
    pub area: SquareMeters,
    pub mean_fai: f64,
    pub mean_ndre: f64,
    pub biomass: BiomassEstimate,
    pub carbon: CarbonEstimate,
    pub data_source: String,
    /// Collaborator details, forwarded untouched
    pub metadata: Value,
}

/// Flat result record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub date: String,
    /// Polygon as WKT
    pub aoi: String,
    pub area_m2: f64,
    pub mean_fai: f64,
    pub mean_ndre: f64,
    pub biomass_t: f64,
    pub co2e_t: f64,
    pub biomass_density_t_ha: f64,
    pub data_source: String,
}

impl AnalysisResult {
    pub fn to_record(&self) -> AnalysisRecord {
        AnalysisRecord {
            date: self.date.format(DATE_FORMAT).to_string(),
            aoi: self.aoi.to_wkt(),
            area_m2: *self.area,
            mean_fai: self.mean_fai,
            mean_ndre: self.mean_ndre,
            biomass_t: *self.biomass.total_tonnes,
            co2e_t: self.carbon.co2e_t,
            biomass_density_t_ha: *self.biomass.density_per_hectare,
            data_source: self.data_source.clone(),
        }
    }
}

/// Runs the pipeline against an injected biomass model.
#[derive(Clone)]
pub struct KelpAnalyzer {
    model: Arc<dyn BiomassModel>,
    config: PipelineConfig,
}

impl KelpAnalyzer {
    pub fn new(model: Arc<dyn BiomassModel>, config: PipelineConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze one request.
    ///
    /// The polygon is checked before the date, so a request with both wrong
    /// reports the geometry error.
    ///
    /// # Errors
    ///
    /// - [`KelpError::Geometry`] for a malformed polygon
    /// - [`KelpError::InvalidDate`] unless the date is `YYYY-MM-DD`
    /// - [`KelpError::Spectral`] when the source fails or returns non-finite means
    /// - [`KelpError::Prediction`] when the model fails
    pub fn analyze(
        &self,
        request: &AnalyzeRequest,
        source: &dyn SpectralSource,
    ) -> Result<AnalysisResult, KelpError> {
        let aoi = AreaOfInterest::from_vertices(request.polygon.clone())?;
        let area = aoi.area(self.config.extent_warning_degrees);
        debug!("Area of interest: {} ({} vertices)", area, aoi.vertices().len());

        let date = parse_date(&request.date)?;

        let observation = source.spectral_means(&aoi, date)?;
        let (mean_fai, mean_ndre) = (observation.mean_fai, observation.mean_ndre);
        if !mean_fai.is_finite() || !mean_ndre.is_finite() {
            return Err(SpectralSourceError::NonFiniteMeans {
                fai: mean_fai,
                ndre: mean_ndre,
            }
            .into());
        }
        debug!(
            "Spectral means from {}: FAI {:.4}, NDRE {:.4}",
            observation.data_source, mean_fai, mean_ndre
        );

        let biomass = estimate_biomass(mean_fai, mean_ndre, area, self.model.as_ref())?;
        debug!(
            "Biomass density {} ({:?}), total {}",
            biomass.density, biomass.assessment, biomass.total_tonnes
        );

        let carbon = CarbonEstimate::from_biomass(biomass.total);
        info!(
            "Analyzed {} on {}: {} biomass, {:.3} t CO2e",
            observation.data_source, date, biomass.total_tonnes, carbon.co2e_t
        );

        Ok(AnalysisResult {
            date,
            aoi,
            area,
            mean_fai,
            mean_ndre,
            biomass,
            carbon,
            data_source: observation.data_source,
            metadata: observation.metadata,
        })
    }

    /// Analyze independent requests in parallel.
    ///
    /// Results keep the order of `requests`; one failure does not affect the
    /// others.
    pub fn analyze_batch(
        &self,
        requests: &[AnalyzeRequest],
        source: &dyn SpectralSource,
    ) -> Vec<Result<AnalysisResult, KelpError>> {
        requests
            .par_iter()
            .map(|request| self.analyze(request, source))
            .collect()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, KelpError> {
    let invalid = || KelpError::InvalidDate {
        value: value.to_string(),
    };
    // chrono tolerates signs, spaces and unpadded fields; the wire format does not
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
