use std::{collections::HashMap, path::Path, sync::Arc};

use axum::{
    Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use backend::{
    AppState,
    config::{AppConfig, FetchConfig},
    create_router,
    extract::Extractor,
    utm::GdalCatalog,
};
use gdal::{DriverManager, spatial_ref::SpatialRef};

pub const API_KEY: &str = "test-key";

pub const FIELD_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Field</name>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>
              8.52,47.32,0 8.58,47.32,0 8.58,47.38,0 8.52,47.38,0 8.52,47.32,0
            </coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;

/// SRTMGL3-like GeoTIFF (3 arc-second, EPSG:4326) covering 8.5..8.6E, 47.3..47.4N.
pub fn synthetic_srtm(dir: &Path) -> Vec<u8> {
    let path = dir.join("upstream.tif");
    {
        let step = 1.0 / 1200.0;
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut ds = driver
            .create_with_band_type::<i16, _>(&path, 120, 120, 1)
            .unwrap();
        ds.set_geo_transform(&[8.5, step, 0.0, 47.4, 0.0, -step])
            .unwrap();
        ds.set_spatial_ref(&SpatialRef::from_epsg(4326).unwrap())
            .unwrap();
        let mut band = ds.rasterband(1).unwrap();
        band.set_no_data_value(Some(-32768.0)).unwrap();
        band.fill(420.0, None).unwrap();
    }
    std::fs::read(path).unwrap()
}

/// Stand-in for the OpenTopography `globaldem` endpoint.
pub async fn spawn_dem_stub(tiff: Vec<u8>) -> String {
    let tiff = Arc::new(tiff);
    let app = Router::new().route(
        "/API/globaldem",
        get(move |Query(query): Query<HashMap<String, String>>| {
            let tiff = tiff.clone();
            async move { stub_response(&query, &tiff) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/API/globaldem")
}

fn stub_response(query: &HashMap<String, String>, tiff: &[u8]) -> Response {
    if query.get("API_Key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    let has_bounds = ["south", "north", "west", "east"]
        .iter()
        .all(|k| query.get(*k).and_then(|v| v.parse::<f64>().ok()).is_some());
    if !has_bounds
        || query.get("demtype").map(String::as_str) != Some("SRTMGL3")
        || query.get("outputFormat").map(String::as_str) != Some("GTiff")
    {
        return (StatusCode::BAD_REQUEST, "bad query").into_response();
    }
    (StatusCode::OK, tiff.to_vec()).into_response()
}

pub fn test_app(output_dir: &Path, base_url: String, api_key: &str) -> Router {
    let config = AppConfig {
        output_dir: output_dir.to_path_buf(),
        fetch: FetchConfig {
            base_url,
            api_key: api_key.to_string(),
            ..FetchConfig::default()
        },
        ..AppConfig::default()
    };
    let extractor = Extractor::new(&config, Arc::new(GdalCatalog::new())).expect("extractor");
    create_router(AppState {
        extractor: Arc::new(extractor),
    })
}
