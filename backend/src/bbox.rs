use thiserror::Error;

use crate::models::{BoundingBox, Coordinate, CornerInput};

/// Margin added on every side of the raw input extent, in degrees.
pub const PADDING_DEG: f64 = 0.01;

pub const MANUAL_CORNERS: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum BoundsError {
    #[error("no coordinates to compute a bounding box from")]
    Empty,
    #[error("coordinate ({lat}, {lon}) is not a finite number")]
    NonFinite { lat: f64, lon: f64 },
    #[error("expected 4 corners, got {0}")]
    CornerCount(usize),
    #[error("corner {corner} is missing its {field}")]
    MissingField { corner: usize, field: &'static str },
    #[error("corner {corner} has {field} {value} outside [-{limit}, {limit}]")]
    OutOfRange {
        corner: usize,
        field: &'static str,
        value: f64,
        limit: f64,
    },
    #[error("No two coordinates can be equal. Please reconsider input.")]
    DuplicateCorners,
}

/// Min/max extent of `coords`, padded by [`PADDING_DEG`].
pub fn padded_bounds<I>(coords: I) -> Result<BoundingBox, BoundsError>
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lon = f64::MAX;
    let mut max_lon = f64::MIN;
    let mut seen = 0usize;

    for c in coords {
        if !c.lat.is_finite() || !c.lon.is_finite() {
            return Err(BoundsError::NonFinite {
                lat: c.lat,
                lon: c.lon,
            });
        }
        min_lat = min_lat.min(c.lat);
        max_lat = max_lat.max(c.lat);
        min_lon = min_lon.min(c.lon);
        max_lon = max_lon.max(c.lon);
        seen += 1;
    }

    if seen == 0 {
        return Err(BoundsError::Empty);
    }

    Ok(BoundingBox {
        north: max_lat + PADDING_DEG,
        south: min_lat - PADDING_DEG,
        east: max_lon + PADDING_DEG,
        west: min_lon - PADDING_DEG,
    })
}

/// Check the four manually entered corners and return them as coordinates.
///
/// Every field must be present, finite and in range, and no two corners may
/// share the same position.
pub fn validate_manual_corners(corners: &[CornerInput]) -> Result<Vec<Coordinate>, BoundsError> {
    if corners.len() != MANUAL_CORNERS {
        return Err(BoundsError::CornerCount(corners.len()));
    }

    let mut coords = Vec::with_capacity(MANUAL_CORNERS);
    for (idx, corner) in corners.iter().enumerate() {
        let number = idx + 1;
        let lat = corner.lat.ok_or(BoundsError::MissingField {
            corner: number,
            field: "latitude",
        })?;
        let lon = corner.lon.ok_or(BoundsError::MissingField {
            corner: number,
            field: "longitude",
        })?;
        check_range(number, "latitude", lat, 90.0)?;
        check_range(number, "longitude", lon, 180.0)?;
        coords.push(Coordinate { lat, lon });
    }

    for (i, a) in coords.iter().enumerate() {
        if coords[i + 1..].iter().any(|b| a.lat == b.lat && a.lon == b.lon) {
            return Err(BoundsError::DuplicateCorners);
        }
    }

    Ok(coords)
}

fn check_range(corner: usize, field: &'static str, value: f64, limit: f64) -> Result<(), BoundsError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(BoundsError::OutOfRange {
            corner,
            field,
            value,
            limit,
        })
    }
}

pub fn center(bbox: &BoundingBox) -> Coordinate {
    Coordinate {
        lat: (bbox.north + bbox.south) / 2.0,
        lon: (bbox.east + bbox.west) / 2.0,
    }
}

/// Closed `[lon, lat]` ring around the box, starting at the north-east corner.
pub fn ring(bbox: &BoundingBox) -> Vec<[f64; 2]> {
    vec![
        [bbox.east, bbox.north],
        [bbox.west, bbox.north],
        [bbox.west, bbox.south],
        [bbox.east, bbox.south],
        [bbox.east, bbox.north],
    ]
}

/// Web map zoom level that frames the box.
pub fn zoom_level(bbox: &BoundingBox) -> u8 {
    let span = (bbox.east - bbox.west).max(bbox.north - bbox.south);
    if span < 360.0 / 2f64.powi(20) {
        return 21;
    }
    let zoom = (360f64.log2() - span.log2()).floor();
    zoom.clamp(1.0, 21.0) as u8
}
