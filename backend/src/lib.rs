pub mod bbox;
pub mod config;
pub mod error;
pub mod extract;
pub mod kml;
pub mod models;
pub mod opentopo;
pub mod utm;
pub mod warp;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::models::{ApiError, BoundsPreview, BoundsRequest, ExtractResponse};

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/bounds", post(bounds_handler))
        .route("/api/extract", post(extract_handler))
        .route("/api/downloads/:job_id/:file_name", get(download_handler))
        .layer(cors)
        .with_state(state)
}

/// POST /api/bounds - padded bounding box, map framing and UTM zone, no download
async fn bounds_handler(
    State(state): State<AppState>,
    Json(req): Json<BoundsRequest>,
) -> Result<Json<BoundsPreview>, (StatusCode, Json<ApiError>)> {
    state
        .extractor
        .preview(&req.source)
        .map(Json)
        .map_err(extract_error_to_api_error)
}

/// POST /api/extract - fetch SRTM for the bounds and warp it to UTM
async fn extract_handler(
    State(state): State<AppState>,
    Json(req): Json<BoundsRequest>,
) -> Result<Json<ExtractResponse>, (StatusCode, Json<ApiError>)> {
    let extraction = state
        .extractor
        .extract(&req.source)
        .await
        .map_err(extract_error_to_api_error)?;

    let file_name = extraction.file_name();
    let download_url = format!("/api/downloads/{}/{}", extraction.job_id, file_name);

    Ok(Json(ExtractResponse {
        job_id: extraction.job_id,
        file_name,
        download_url,
        bbox: extraction.bbox,
        utm_epsg: extraction.zone.epsg,
        pixel_size_m: extraction.artifact.pixel_size.0,
        width: extraction.artifact.width,
        height: extraction.artifact.height,
    }))
}

/// GET /api/downloads/:job_id/:file_name - serve a warped GeoTIFF as an attachment
async fn download_handler(
    State(state): State<AppState>,
    Path((job_id, file_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let path = state
        .extractor
        .artifact_path(&job_id, &file_name)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError {
                    message: format!("No artifact {file_name} for job {job_id}"),
                }),
            )
        })?;

    let bytes = tokio::fs::read(&path).await.map_err(|err| {
        tracing::error!("failed to read {}: {}", path.display(), err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                message: "Failed to read artifact".to_string(),
            }),
        )
    })?;

    let headers = [
        (header::CONTENT_TYPE, "image/tiff".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, bytes))
}

/// Convert ExtractError to API error response
fn extract_error_to_api_error(err: ExtractError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        ExtractError::Bounds(_) | ExtractError::Kml(_) => StatusCode::BAD_REQUEST,
        ExtractError::Fetch(_) => StatusCode::BAD_GATEWAY,
        ExtractError::Utm(_) | ExtractError::Warp(_) | ExtractError::Io(_) | ExtractError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if err.is_user_error() {
        tracing::debug!("rejected input: {err}");
    } else {
        tracing::error!("extraction failed: {err}");
    }

    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
