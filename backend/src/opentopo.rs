use thiserror::Error;

use crate::config::FetchConfig;
use crate::models::BoundingBox;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("DEM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("DEM provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("DEM provider returned an empty body")]
    Empty,
}

/// Client for the OpenTopography `globaldem` endpoint.
#[derive(Debug, Clone)]
pub struct DemClient {
    http: reqwest::Client,
    config: FetchConfig,
}

impl DemClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn query(&self, bbox: &BoundingBox) -> Vec<(&'static str, String)> {
        vec![
            ("demtype", self.config.dem_type.clone()),
            ("south", bbox.south.to_string()),
            ("north", bbox.north.to_string()),
            ("west", bbox.west.to_string()),
            ("east", bbox.east.to_string()),
            ("outputFormat", "GTiff".to_string()),
            ("API_Key", self.config.api_key.clone()),
        ]
    }

    /// Download the GeoTIFF covering `bbox`. Any failure is terminal; there is no retry.
    pub async fn fetch_geotiff(&self, bbox: &BoundingBox) -> Result<Vec<u8>, FetchError> {
        tracing::info!(
            "requesting {} for S={} N={} W={} E={}",
            self.config.dem_type,
            bbox.south,
            bbox.north,
            bbox.west,
            bbox.east
        );

        let response = self
            .http
            .get(&self.config.base_url)
            .query(&self.query(bbox))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("DEM provider answered {status}");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        tracing::debug!("downloaded {} bytes of raster data", bytes.len());
        Ok(bytes.to_vec())
    }
}
