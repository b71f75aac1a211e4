use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Geographic extent in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// One manually entered corner. Fields are optional so that blank inputs
/// can be reported instead of rejected by the JSON decoder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CornerInput {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsSource {
    Kml { file_name: String, content: String },
    Manual { corners: Vec<CornerInput> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsRequest {
    pub source: BoundsSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsPreview {
    pub bbox: BoundingBox,
    /// Closed ring `[lon, lat]` for map overlays: NE, NW, SW, SE.
    pub polygon: Vec<[f64; 2]>,
    pub center: Coordinate,
    pub zoom: u8,
    pub utm_epsg: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub job_id: String,
    pub file_name: String,
    pub download_url: String,
    pub bbox: BoundingBox,
    pub utm_epsg: u32,
    pub pixel_size_m: f64,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
