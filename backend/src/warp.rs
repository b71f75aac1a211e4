use std::path::{Path, PathBuf};

use gdal::{
    Dataset, DatasetOptions, Driver, DriverManager, GdalOpenFlags, errors::GdalError,
    raster::GdalDataType, spatial_ref::SpatialRef,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::UtmZone;

/// Output pixel size in metres, both axes.
pub const TARGET_RESOLUTION_M: f64 = 30.0;
pub const SOURCE_EPSG: u32 = 4326;

/// Points sampled along each edge of the source extent when projecting it.
const EDGE_SAMPLES: usize = 21;

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalError),
    #[error("failed to set up projection: {0}")]
    ProjCreate(#[from] proj::ProjCreateError),
    #[error("failed to project source extent: {0}")]
    Proj(#[from] proj::ProjError),
    #[error("projected extent of {0:?} is empty")]
    EmptyExtent(PathBuf),
}

/// A GeoTIFF on disk and the grid it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterArtifact {
    pub path: PathBuf,
    pub epsg: Option<u32>,
    pub pixel_size: (f64, f64),
    pub width: usize,
    pub height: usize,
}

/// Reproject the geographic raster at `src_path` into `zone` at 30 m and
/// write it to `dst_path` as GeoTIFF.
///
/// The source is always read as EPSG:4326; whatever CRS the file declares
/// (if any) is overwritten before warping.
pub fn warp_to_utm(src_path: &Path, dst_path: &Path, zone: &UtmZone) -> Result<RasterArtifact, WarpError> {
    let mut src = Dataset::open_ex(
        src_path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        },
    )?;
    let declared = src.spatial_ref().ok().and_then(|srs| srs.auth_code().ok());
    if declared != Some(SOURCE_EPSG as i32) {
        tracing::warn!(
            "source raster declares {:?}, treating it as EPSG:{SOURCE_EPSG}",
            declared
        );
    }
    src.set_spatial_ref(&SpatialRef::from_epsg(SOURCE_EPSG)?)?;

    let (src_width, src_height) = src.raster_size();
    let gt = src.geo_transform()?;
    let west = gt[0];
    let north = gt[3];
    let east = west + src_width as f64 * gt[1];
    let south = north + src_height as f64 * gt[5];

    let (min_x, min_y, max_x, max_y) = projected_extent(west, south, east, north, zone)?
        .ok_or_else(|| WarpError::EmptyExtent(src_path.into()))?;

    let width = (((max_x - min_x) / TARGET_RESOLUTION_M).ceil() as usize).max(1);
    let height = (((max_y - min_y) / TARGET_RESOLUTION_M).ceil() as usize).max(1);

    let src_band = src.rasterband(1)?;
    let nodata = src_band.no_data_value();
    let band_type = src_band.band_type();
    let band_count = src.raster_count();

    tracing::info!(
        "warping {}x{} raster to {} as {}x{} at {}m",
        src_width,
        src_height,
        zone.crs_name(),
        width,
        height,
        TARGET_RESOLUTION_M
    );

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dst = create_like(&driver, dst_path, band_type, width, height, band_count)?;
    dst.set_geo_transform(&[
        min_x,
        TARGET_RESOLUTION_M,
        0.0,
        max_y,
        0.0,
        -TARGET_RESOLUTION_M,
    ])?;
    dst.set_spatial_ref(&SpatialRef::from_epsg(zone.epsg)?)?;

    if let Some(nodata) = nodata {
        for idx in 1..=band_count {
            let mut band = dst.rasterband(idx)?;
            band.set_no_data_value(Some(nodata))?;
            band.fill(nodata, None)?;
        }
    }

    // Always bilinear; gdal 0.17's safe API has no way to request nearest neighbour.
    gdal::raster::reproject(&src, &dst)?;
    drop(dst);

    describe(dst_path)
}

/// Read back the CRS and grid of an existing raster.
pub fn describe(path: &Path) -> Result<RasterArtifact, WarpError> {
    let ds = Dataset::open(path)?;
    let (width, height) = ds.raster_size();
    let gt = ds.geo_transform()?;
    let epsg = ds
        .spatial_ref()
        .ok()
        .and_then(|srs| srs.auth_code().ok())
        .and_then(|code| u32::try_from(code).ok());

    Ok(RasterArtifact {
        path: path.to_path_buf(),
        epsg,
        pixel_size: (gt[1].abs(), gt[5].abs()),
        width,
        height,
    })
}

/// Bounds of the densified geographic rectangle once projected into `zone`.
fn projected_extent(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    zone: &UtmZone,
) -> Result<Option<(f64, f64, f64, f64)>, WarpError> {
    if !(east > west && north > south) {
        return Ok(None);
    }
    let proj = proj::Proj::new_known_crs(&format!("EPSG:{SOURCE_EPSG}"), &zone.crs_name(), None)?;

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    let steps = EDGE_SAMPLES - 1;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let lon = west + (east - west) * t;
        let lat = south + (north - south) * t;
        for point in [(lon, south), (lon, north), (west, lat), (east, lat)] {
            // proj expects (lon, lat) order for geographic coordinates
            let (x, y) = proj.convert(point)?;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    Ok((max_x > min_x && max_y > min_y).then_some((min_x, min_y, max_x, max_y)))
}

fn create_like(
    driver: &Driver,
    path: &Path,
    band_type: GdalDataType,
    width: usize,
    height: usize,
    bands: usize,
) -> Result<Dataset, GdalError> {
    match band_type {
        GdalDataType::UInt8 => driver.create_with_band_type::<u8, _>(path, width, height, bands),
        GdalDataType::Int16 => driver.create_with_band_type::<i16, _>(path, width, height, bands),
        GdalDataType::UInt16 => driver.create_with_band_type::<u16, _>(path, width, height, bands),
        GdalDataType::Int32 => driver.create_with_band_type::<i32, _>(path, width, height, bands),
        GdalDataType::Float64 => driver.create_with_band_type::<f64, _>(path, width, height, bands),
        _ => driver.create_with_band_type::<f32, _>(path, width, height, bands),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRTM3_STEP: f64 = 1.0 / 1200.0;

    fn write_geographic_dem(path: &Path, epsg: Option<u32>) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut ds = driver
            .create_with_band_type::<i16, _>(path, 120, 120, 1)
            .unwrap();
        ds.set_geo_transform(&[8.5, SRTM3_STEP, 0.0, 47.4, 0.0, -SRTM3_STEP])
            .unwrap();
        if let Some(code) = epsg {
            ds.set_spatial_ref(&SpatialRef::from_epsg(code).unwrap())
                .unwrap();
        }
        let mut band = ds.rasterband(1).unwrap();
        band.set_no_data_value(Some(-32768.0)).unwrap();
        band.fill(500.0, None).unwrap();
    }

    fn zone_32n() -> UtmZone {
        UtmZone::from_epsg(32632).unwrap()
    }

    #[test]
    fn warps_to_utm_at_thirty_metres() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("field_srtm.tif");
        let dst = dir.path().join("custom_elev_field_srtm.tif");
        write_geographic_dem(&src, Some(4326));

        let artifact = warp_to_utm(&src, &dst, &zone_32n()).unwrap();

        assert!(dst.exists());
        assert_eq!(artifact.epsg, Some(32632));
        assert!((artifact.pixel_size.0 - 30.0).abs() < 1e-9);
        assert!((artifact.pixel_size.1 - 30.0).abs() < 1e-9);
        // 0.1 degree square near 47.35N: ~7.5 km wide, ~11.1 km tall
        assert!((220..=290).contains(&artifact.width), "width {}", artifact.width);
        assert!((340..=400).contains(&artifact.height), "height {}", artifact.height);

        let ds = Dataset::open(&dst).unwrap();
        assert_eq!(ds.rasterband(1).unwrap().no_data_value(), Some(-32768.0));
        assert_eq!(ds.rasterband(1).unwrap().band_type(), GdalDataType::Int16);
    }

    #[test]
    fn source_without_crs_is_read_as_wgs84() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bare_srtm.tif");
        let dst = dir.path().join("custom_elev_bare_srtm.tif");
        write_geographic_dem(&src, None);

        let artifact = warp_to_utm(&src, &dst, &zone_32n()).unwrap();

        assert_eq!(artifact.epsg, Some(32632));
        assert_eq!(artifact.pixel_size, (30.0, 30.0));
        assert!((220..=290).contains(&artifact.width), "width {}", artifact.width);
        assert!((340..=400).contains(&artifact.height), "height {}", artifact.height);
    }

    #[test]
    fn declared_crs_is_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("mislabelled_srtm.tif");
        let dst = dir.path().join("custom_elev_mislabelled_srtm.tif");
        // Degree geotransform but labelled Web Mercator
        write_geographic_dem(&src, Some(3857));

        let artifact = warp_to_utm(&src, &dst, &zone_32n()).unwrap();

        assert_eq!(artifact.epsg, Some(32632));
        assert!((220..=290).contains(&artifact.width), "width {}", artifact.width);
        assert!((340..=400).contains(&artifact.height), "height {}", artifact.height);

        let ds = Dataset::open(&dst).unwrap();
        let size = (artifact.width, artifact.height);
        let values = ds
            .rasterband(1)
            .unwrap()
            .read_as::<i16>((0, 0), size, size, None)
            .unwrap();
        assert!(values.data().iter().any(|&v| v == 500));
    }

    #[test]
    fn unreadable_source_is_a_gdal_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("not_a_raster.tif");
        std::fs::write(&src, b"<html>Bad API key</html>").unwrap();

        let result = warp_to_utm(&src, &dir.path().join("out.tif"), &zone_32n());
        assert!(matches!(result, Err(WarpError::Gdal(_))));
    }

    #[test]
    fn projected_extent_is_metric() {
        let (min_x, min_y, max_x, max_y) =
            projected_extent(8.5, 47.3, 8.6, 47.4, &zone_32n()).unwrap().unwrap();
        assert!(min_x > 400_000.0 && max_x < 600_000.0);
        assert!(min_y > 5_200_000.0 && max_y < 5_300_000.0);
        assert!(projected_extent(8.6, 47.3, 8.5, 47.4, &zone_32n()).unwrap().is_none());
    }
}
