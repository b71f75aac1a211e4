use std::{net::SocketAddr, sync::Arc};

use backend::{AppState, config::AppConfig, create_router, extract::Extractor, utm::GdalCatalog};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!("writing extractions to {}", config.output_dir.display());
    tracing::info!("DEM provider {} ({})", config.fetch.base_url, config.fetch.dem_type);

    let extractor = Extractor::new(&config, Arc::new(GdalCatalog::new())).expect("build DEM client");
    let state = AppState {
        extractor: Arc::new(extractor),
    };
    let app = create_router(state);

    let addr: SocketAddr = config.bind_addr.parse().expect("valid socket address");
    tracing::info!("starting backend on http://{addr}");
    tracing::info!("  POST /api/bounds - Preview padded bounds and UTM zone");
    tracing::info!("  POST /api/extract - Fetch SRTM and warp to UTM");
    tracing::info!("  GET /api/downloads/:job_id/:file_name - Download GeoTIFF");

    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
