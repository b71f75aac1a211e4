use std::sync::OnceLock;

use gdal::spatial_ref::SpatialRef;
use thiserror::Error;

use crate::bbox;
use crate::models::{BoundingBox, Coordinate, Hemisphere, UtmZone};

#[derive(Debug, Error)]
pub enum UtmError {
    #[error("CRS database lookup failed: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("no WGS 84 UTM zone covers {0:?}")]
    NoZone(BoundingBox),
}

/// Geographic area over which a CRS is valid, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfUse {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl AreaOfUse {
    pub fn intersects(&self, bbox: &BoundingBox) -> bool {
        bbox.west < self.east
            && bbox.east > self.west
            && bbox.south < self.north
            && bbox.north > self.south
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.lon >= self.west
            && point.lon <= self.east
            && point.lat >= self.south
            && point.lat <= self.north
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneArea {
    pub zone: UtmZone,
    pub area: AreaOfUse,
}

/// Source of WGS 84 UTM zone definitions and their areas of use.
pub trait CrsCatalog: Send + Sync {
    fn utm_zones(&self) -> Result<Vec<ZoneArea>, UtmError>;
}

/// Reads UTM areas of use from the EPSG database bundled with GDAL/PROJ.
#[derive(Default)]
pub struct GdalCatalog {
    zones: OnceLock<Vec<ZoneArea>>,
}

impl GdalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn load() -> Result<Vec<ZoneArea>, UtmError> {
        let mut zones = Vec::with_capacity(120);
        for zone in UtmZone::all() {
            let srs = SpatialRef::from_epsg(zone.epsg)?;
            match srs.area_of_use() {
                Some(area) => zones.push(ZoneArea {
                    zone,
                    area: AreaOfUse {
                        west: area.west_lon_degree,
                        south: area.south_lat_degree,
                        east: area.east_lon_degree,
                        north: area.north_lat_degree,
                    },
                }),
                None => tracing::warn!("EPSG:{} has no area of use, skipping", zone.epsg),
            }
        }
        tracing::debug!("loaded {} UTM zone areas from CRS database", zones.len());
        Ok(zones)
    }
}

impl CrsCatalog for GdalCatalog {
    fn utm_zones(&self) -> Result<Vec<ZoneArea>, UtmError> {
        if let Some(zones) = self.zones.get() {
            return Ok(zones.clone());
        }
        let zones = Self::load()?;
        let _ = self.zones.set(zones.clone());
        Ok(zones)
    }
}

/// Pick the WGS 84 UTM zone that best fits `bbox`.
///
/// Candidates are the zones whose area of use intersects the box. A zone
/// containing the box center wins; remaining ties go to the lowest EPSG code.
pub fn resolve_utm_zone(catalog: &dyn CrsCatalog, bbox: &BoundingBox) -> Result<UtmZone, UtmError> {
    let center = bbox::center(bbox);
    let zones = catalog.utm_zones()?;

    let best = zones
        .iter()
        .filter(|z| z.area.intersects(bbox))
        .min_by_key(|z| (!z.area.contains(center), z.zone.epsg))
        .map(|z| z.zone)
        .ok_or(UtmError::NoZone(*bbox))?;

    tracing::info!(
        "resolved UTM zone {}{} ({}) for center ({:.4}, {:.4})",
        best.zone,
        match best.hemisphere {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        },
        best.crs_name(),
        center.lat,
        center.lon
    );
    Ok(best)
}
