pub use shared::{
    ApiError, BoundingBox, BoundsPreview, BoundsRequest, BoundsSource, Coordinate, CornerInput,
    ExtractResponse,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

/// A WGS84 UTM zone as found in the EPSG database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmZone {
    pub epsg: u32,
    pub zone: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    pub const NORTH_BASE: u32 = 32600;
    pub const SOUTH_BASE: u32 = 32700;

    /// Decode a WGS84 UTM EPSG code (32601..=32660, 32701..=32760).
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (base, hemisphere) = match epsg {
            32601..=32660 => (Self::NORTH_BASE, Hemisphere::North),
            32701..=32760 => (Self::SOUTH_BASE, Hemisphere::South),
            _ => return None,
        };
        Some(Self {
            epsg,
            zone: (epsg - base) as u8,
            hemisphere,
        })
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=60)
            .map(|z| Self::NORTH_BASE + z)
            .chain((1..=60).map(|z| Self::SOUTH_BASE + z))
            .filter_map(Self::from_epsg)
    }

    pub fn crs_name(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}
