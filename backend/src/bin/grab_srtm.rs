use std::{path::PathBuf, sync::Arc};

use backend::{
    config::AppConfig,
    extract::Extractor,
    models::{BoundsSource, CornerInput},
    utm::GdalCatalog,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Download SRTM elevation for a KML boundary or four corners and reproject it to UTM"
)]
struct Args {
    /// KML file whose polygons define the area
    #[arg(long, conflicts_with = "corners", required_unless_present = "corners")]
    kml: Option<PathBuf>,

    /// Corner as `lat,lon`; give exactly four, upper-left first, clockwise
    #[arg(long = "corner", value_parser = parse_corner, allow_hyphen_values = true)]
    corners: Vec<CornerInput>,

    /// Directory receiving the job folder (defaults to OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// OpenTopography API key (defaults to OPENTOPO_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// OpenTopography dataset (defaults to DEM_TYPE, then SRTMGL3)
    #[arg(long)]
    dem_type: Option<String>,
}

impl Args {
    fn source(&self) -> std::io::Result<BoundsSource> {
        match &self.kml {
            Some(path) => Ok(BoundsSource::Kml {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content: std::fs::read_to_string(path)?,
            }),
            None => Ok(BoundsSource::Manual {
                corners: self.corners.clone(),
            }),
        }
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(key) = &self.api_key {
            config.fetch.api_key = key.clone();
        }
        if let Some(dem_type) = &self.dem_type {
            config.fetch.dem_type = dem_type.clone();
        }
        config
    }
}

/// Blank halves are kept as missing so the pipeline can name the corner.
fn parse_corner(value: &str) -> Result<CornerInput, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got `{value}`"))?;
    let field = |text: &str, name: &str| -> Result<Option<f64>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid {name} `{text}`: {e}"))
    };
    Ok(CornerInput {
        lat: field(lat, "latitude")?,
        lon: field(lon, "longitude")?,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.config();
    let source = args.source()?;

    let extractor = Extractor::new(&config, Arc::new(GdalCatalog::new()))?;
    let preview = extractor.preview(&source)?;
    tracing::info!(
        "bounds N={} S={} E={} W={} -> EPSG:{}",
        preview.bbox.north,
        preview.bbox.south,
        preview.bbox.east,
        preview.bbox.west,
        preview.utm_epsg
    );

    let extraction = extractor.extract(&source).await?;
    tracing::info!("raw download kept at {}", extraction.raw_path.display());
    println!("{}", extraction.artifact.path.display());

    Ok(())
}
