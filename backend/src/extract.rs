use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use uuid::Uuid;

use crate::bbox::{self, padded_bounds, validate_manual_corners};
use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::kml::{ensure_kml_name, exterior_coordinates, parse_polygons};
use crate::models::{BoundingBox, BoundsPreview, BoundsSource, UtmZone};
use crate::opentopo::DemClient;
use crate::utm::{CrsCatalog, resolve_utm_zone};
use crate::warp::{RasterArtifact, warp_to_utm};

/// Base name used for artifacts when the bounds were typed in by hand.
pub const MANUAL_BASE_NAME: &str = "raster";
pub const ARTIFACT_PREFIX: &str = "custom_elev_";

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBounds {
    pub base_name: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub job_id: String,
    pub bbox: BoundingBox,
    pub zone: UtmZone,
    pub raw_path: PathBuf,
    pub artifact: RasterArtifact,
}

impl Extraction {
    pub fn file_name(&self) -> String {
        self.artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Turn the submitted geometry into a padded bounding box and an artifact base name.
pub fn resolve_bounds(source: &BoundsSource) -> Result<ResolvedBounds, ExtractError> {
    match source {
        BoundsSource::Kml { file_name, content } => {
            ensure_kml_name(file_name)?;
            let polygons = parse_polygons(content)?;
            let bbox = padded_bounds(exterior_coordinates(&polygons))?;
            Ok(ResolvedBounds {
                base_name: base_name(file_name),
                bbox,
            })
        }
        BoundsSource::Manual { corners } => {
            let coords = validate_manual_corners(corners)?;
            Ok(ResolvedBounds {
                base_name: MANUAL_BASE_NAME.to_string(),
                bbox: padded_bounds(coords)?,
            })
        }
    }
}

/// Upload name up to its first `.`, without any directory part.
fn base_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => MANUAL_BASE_NAME.to_string(),
    }
}

pub fn raw_file_name(base: &str) -> String {
    format!("{base}_srtm.tif")
}

pub fn artifact_file_name(base: &str) -> String {
    format!("{ARTIFACT_PREFIX}{}", raw_file_name(base))
}

/// Runs the bounds → UTM → download → warp pipeline.
pub struct Extractor {
    client: DemClient,
    catalog: Arc<dyn CrsCatalog>,
    output_dir: PathBuf,
}

impl Extractor {
    pub fn new(config: &AppConfig, catalog: Arc<dyn CrsCatalog>) -> Result<Self, ExtractError> {
        Ok(Self {
            client: DemClient::new(config.fetch.clone())?,
            catalog,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn preview(&self, source: &BoundsSource) -> Result<BoundsPreview, ExtractError> {
        let resolved = resolve_bounds(source)?;
        let zone = resolve_utm_zone(self.catalog.as_ref(), &resolved.bbox)?;
        let bbox = resolved.bbox;

        Ok(BoundsPreview {
            bbox,
            polygon: bbox::ring(&bbox),
            center: bbox::center(&bbox),
            zoom: bbox::zoom_level(&bbox),
            utm_epsg: zone.epsg,
        })
    }

    pub async fn extract(&self, source: &BoundsSource) -> Result<Extraction, ExtractError> {
        let ResolvedBounds { base_name, bbox } = resolve_bounds(source)?;
        let zone = resolve_utm_zone(self.catalog.as_ref(), &bbox)?;

        let job_id = Uuid::new_v4().to_string();
        tracing::info!("extraction {job_id} for {bbox:?}");

        let bytes = self.client.fetch_geotiff(&bbox).await?;
        let job_dir = self.output_dir.join(&job_id);
        tokio::fs::create_dir_all(&job_dir).await?;
        let raw_path = job_dir.join(raw_file_name(&base_name));
        tokio::fs::write(&raw_path, &bytes).await?;

        let src = raw_path.clone();
        let dst = job_dir.join(artifact_file_name(&base_name));
        let artifact = tokio::task::spawn_blocking(move || warp_to_utm(&src, &dst, &zone)).await??;

        tracing::info!(
            "extraction {job_id} wrote {} ({}x{})",
            artifact.path.display(),
            artifact.width,
            artifact.height
        );

        Ok(Extraction {
            job_id,
            bbox,
            zone,
            raw_path,
            artifact,
        })
    }

    /// Locate a finished artifact. Only warped outputs inside a job directory are served.
    pub fn artifact_path(&self, job_id: &str, file_name: &str) -> Option<PathBuf> {
        Uuid::parse_str(job_id).ok()?;
        let plain = Path::new(file_name).file_name()?.to_str()? == file_name;
        if !plain || !file_name.starts_with(ARTIFACT_PREFIX) || !file_name.ends_with(".tif") {
            return None;
        }
        let path = self.output_dir.join(job_id).join(file_name);
        path.is_file().then_some(path)
    }
}
