//! GeoJSON map ingestion.
//!
//! Turns a `FeatureCollection` into the flat [`MapRecord`] list the core
//! consumes. The primary source is fetched over HTTP (or read from disk when
//! given a path); on failure a local fallback document of the same shape is
//! tried exactly once. No further retries: a double failure aborts
//! initialization and the session never leaves the menu.

use anyhow::{Context, Result};
use conquest_core::{Geometry, MapRecord, Point, Ring};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
    geometry: Option<GeoGeometry>,
}

/// Property keys vary between datasets; take the first usable of each pair.
#[derive(Deserialize, Default)]
struct Properties {
    #[serde(rename = "ISO_A3")]
    iso_a3: Option<String>,
    #[serde(rename = "ADMIN")]
    admin: Option<String>,
    id: Option<String>,
    name: Option<String>,
}

/// Positions come as arrays of 2+ numbers (trailing altitude is ignored).
type Position = Vec<f64>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

fn convert_ring(positions: &[Position]) -> Option<Ring> {
    let ring: Ring = positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Point::new(p[0], p[1]))
        .collect();
    // Fewer than three vertices cannot enclose anything.
    (ring.len() >= 3).then_some(ring)
}

fn convert_geometry(geometry: &GeoGeometry) -> Option<Geometry> {
    match geometry {
        GeoGeometry::Polygon { coordinates } => {
            let rings: Vec<Ring> = coordinates.iter().filter_map(|r| convert_ring(r)).collect();
            (!rings.is_empty()).then_some(Geometry::Polygon(rings))
        }
        GeoGeometry::MultiPolygon { coordinates } => {
            let polygons: Vec<Vec<Ring>> = coordinates
                .iter()
                .map(|rings| rings.iter().filter_map(|r| convert_ring(r)).collect())
                .filter(|rings: &Vec<Ring>| !rings.is_empty())
                .collect();
            (!polygons.is_empty()).then_some(Geometry::MultiPolygon(polygons))
        }
        GeoGeometry::Unsupported => None,
    }
}

/// Parse a GeoJSON document into map records. Features without usable
/// polygon geometry are skipped with a warning rather than failing the
/// whole load.
pub fn parse_records(text: &str) -> Result<Vec<MapRecord>> {
    let collection: FeatureCollection =
        serde_json::from_str(text).context("not a GeoJSON feature collection")?;

    let mut records = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;
    for (index, feature) in collection.features.iter().enumerate() {
        let geometry = feature.geometry.as_ref().and_then(convert_geometry);
        let Some(geometry) = geometry else {
            skipped += 1;
            continue;
        };
        let id = feature
            .properties
            .iso_a3
            .clone()
            .or_else(|| feature.properties.id.clone())
            .unwrap_or_else(|| format!("territory_{index}"));
        let name = feature
            .properties
            .admin
            .clone()
            .or_else(|| feature.properties.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        records.push(MapRecord { id, name, geometry });
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} features without polygon geometry");
    }
    log::info!("parsed {} map records", records.len());
    Ok(records)
}

fn fetch_remote(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;
    let text = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("fetching {url}"))?
        .text()
        .context("reading response body")?;
    Ok(text)
}

fn load_source(source: &str) -> Result<Vec<MapRecord>> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source)?
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    parse_records(&text)
}

/// One-shot load policy: try the primary source, then the fallback once.
pub fn load_map(primary: &str, fallback: Option<&Path>) -> Result<Vec<MapRecord>> {
    match load_source(primary) {
        Ok(records) => Ok(records),
        Err(primary_err) => {
            log::warn!("primary map source failed: {primary_err:#}");
            let Some(fallback) = fallback else {
                return Err(primary_err);
            };
            let path = fallback.to_string_lossy();
            load_source(&path)
                .with_context(|| format!("fallback {path} also failed"))
        }
    }
}
