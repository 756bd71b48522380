use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use kelp_carbon_core::source::{SceneSpectralSource, SpectralSource, SyntheticSpectralSource};
use kelp_carbon_core::{
    AnalyzeRequest, BiomassModel, KelpAnalyzer, LinearBiomassModel, PipelineConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Where spectral means come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Deterministic means from date, area and season
    Synthetic,
    /// Means over a seeded synthetic reflectance scene
    Scene,
}

/// Kelp biomass and carbon estimate for one polygon and date
#[derive(Parser, Debug)]
#[command(name = "kelp-carbon-demo")]
#[command(about = "Kelp biomass and CO2e estimate from spectral indices", long_about = None)]
struct Args {
    /// Observation date (YYYY-MM-DD)
    #[arg(short, long)]
    date: String,

    /// Area of interest as WKT, e.g. "POLYGON((-123.5 48.4, -123.4 48.4, -123.4 48.5, ...))"
    #[arg(short, long)]
    wkt: String,

    /// Spectral source
    #[arg(short, long, value_enum, default_value_t = Source::Synthetic)]
    source: Source,

    /// Linear model coefficients as JSON (overrides the coefficient flags)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Pipeline config as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep arithmetic values for out-of-range reflectance (only --source scene
    /// computes indices from reflectance; synthetic means ignore this flag)
    #[arg(long)]
    no_mask: bool,

    /// Model intercept (kg/m²)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    intercept: f64,

    /// Model FAI coefficient
    #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
    fai_coefficient: f64,

    /// Model NDRE coefficient
    #[arg(long, default_value_t = 8.0, allow_negative_numbers = true)]
    ndre_coefficient: f64,
}

fn load_model(args: &Args) -> Result<Arc<dyn BiomassModel>> {
    let model = match &args.model {
        Some(path) => LinearBiomassModel::from_json_file(path)
            .with_context(|| format!("loading model from {}", path.display()))?,
        None => {
            for (name, value) in [
                ("intercept", args.intercept),
                ("fai-coefficient", args.fai_coefficient),
                ("ndre-coefficient", args.ndre_coefficient),
            ] {
                if !value.is_finite() {
                    bail!("--{name} must be finite, got {value}");
                }
            }
            LinearBiomassModel::new(args.intercept, args.fai_coefficient, args.ndre_coefficient)
        }
    };
    info!("Biomass model: {:?}", model);
    Ok(Arc::new(model))
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.no_mask {
        config.mask_invalid = false;
    }
    Ok(config)
}

fn build_source(args: &Args, config: &PipelineConfig) -> Box<dyn SpectralSource> {
    match args.source {
        Source::Synthetic => {
            if args.no_mask {
                warn!("--no-mask has no effect with --source synthetic");
            }
            Box::new(SyntheticSpectralSource)
        }
        Source::Scene => Box::new(SceneSpectralSource::from_config(config)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let model = load_model(&args)?;
    let request = AnalyzeRequest::from_wkt(&args.date, &args.wkt).context("parsing --wkt")?;

    let analyzer = KelpAnalyzer::new(model, config);
    let source = build_source(&args, analyzer.config());
    let result = analyzer.analyze(&request, source.as_ref())?;

    println!("{}", serde_json::to_string_pretty(&result.to_record())?);
    Ok(())
}
