use geo_types::{LineString, Polygon};
use quick_xml::{Reader, events::Event};
use thiserror::Error;

use crate::models::Coordinate;

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("Please upload a KML file.")]
    NotKml,
    #[error("malformed KML document: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid coordinate tuple `{0}`")]
    InvalidCoordinate(String),
    #[error("KML document contains no polygons")]
    NoPolygons,
}

/// Accept only `.kml` uploads (case-insensitive).
pub fn ensure_kml_name(file_name: &str) -> Result<(), KmlError> {
    if file_name.to_lowercase().ends_with(".kml") {
        Ok(())
    } else {
        Err(KmlError::NotKml)
    }
}

/// Parse every polygon out of a KML document.
///
/// A `MultiGeometry` contributes only its first polygon. Points and lines are
/// ignored; holes are dropped since only the exterior ring feeds the bounds.
pub fn parse_polygons(content: &str) -> Result<Vec<Polygon<f64>>, KmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut polygons = Vec::new();
    let mut multi_depth = 0usize;
    let mut multi_taken = false;
    let mut in_polygon = false;
    let mut in_outer = false;
    let mut in_coordinates = false;
    let mut ring_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"MultiGeometry" => {
                    if multi_depth == 0 {
                        multi_taken = false;
                    }
                    multi_depth += 1;
                }
                b"Polygon" => {
                    in_polygon = true;
                    ring_text.clear();
                }
                b"outerBoundaryIs" if in_polygon => in_outer = true,
                b"coordinates" if in_polygon && in_outer => in_coordinates = true,
                _ => {}
            },
            Event::Text(t) if in_coordinates => {
                let text = t.decode().map_err(quick_xml::Error::from)?;
                ring_text.push_str(&text);
                ring_text.push(' ');
            }
            Event::CData(c) if in_coordinates => {
                ring_text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                ring_text.push(' ');
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"MultiGeometry" => multi_depth = multi_depth.saturating_sub(1),
                b"coordinates" => in_coordinates = false,
                b"outerBoundaryIs" => in_outer = false,
                b"Polygon" => {
                    in_polygon = false;
                    let coords = parse_coordinates(&ring_text)?;
                    if coords.is_empty() {
                        continue;
                    }
                    if multi_depth > 0 {
                        if multi_taken {
                            continue;
                        }
                        multi_taken = true;
                    }
                    let ring: Vec<(f64, f64)> = coords.iter().map(|c| (c.lon, c.lat)).collect();
                    polygons.push(Polygon::new(LineString::from(ring), vec![]));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if polygons.is_empty() {
        return Err(KmlError::NoPolygons);
    }
    tracing::debug!("parsed {} polygon(s) from KML", polygons.len());
    Ok(polygons)
}

/// Parse a KML `<coordinates>` body: whitespace separated `lon,lat[,alt]` tuples.
pub fn parse_coordinates(text: &str) -> Result<Vec<Coordinate>, KmlError> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',');
            let lon = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
            let lat = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(Coordinate { lat, lon }),
                _ => Err(KmlError::InvalidCoordinate(tuple.to_string())),
            }
        })
        .collect()
}

/// Exterior ring vertices of all polygons, flattened.
pub fn exterior_coordinates(polygons: &[Polygon<f64>]) -> Vec<Coordinate> {
    polygons
        .iter()
        .flat_map(|poly| poly.exterior().coords())
        .map(|c| Coordinate { lat: c.y, lon: c.x })
        .collect()
}
