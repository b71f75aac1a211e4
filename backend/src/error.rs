use thiserror::Error;

use crate::bbox::BoundsError;
use crate::kml::KmlError;
use crate::opentopo::FetchError;
use crate::utm::UtmError;
use crate::warp::WarpError;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Bounds(#[from] BoundsError),
    #[error("{0}")]
    Kml(#[from] KmlError),
    #[error("UTM zone resolution failed: {0}")]
    Utm(#[from] UtmError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("reprojection failed: {0}")]
    Warp(#[from] WarpError),
    #[error("failed to write extraction files: {0}")]
    Io(#[from] std::io::Error),
    #[error("reprojection task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExtractError {
    /// Errors caused by the submitted geometry rather than by the pipeline.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ExtractError::Bounds(_) | ExtractError::Kml(_))
    }
}
