//! WASM bindings for the geo crate.
//!
//! These bindings let a browser map page hand its current position and the
//! loaded GeoJSON document to the resolver, and get JSON back.

use crate::{haversine_distance_meters, Coordinate, FeatureCollection, Resolver, ResolverOptions};
use wasm_bindgen::prelude::*;

/// Calculate distance between two coordinates.
///
/// # Returns
/// Distance in meters
#[wasm_bindgen]
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let from = Coordinate::new(lat1, lng1);
    let to = Coordinate::new(lat2, lng2);
    haversine_distance_meters(&from, &to)
}

/// Resolve the nearest named intersection.
///
/// # Arguments
/// * `lat` - Current latitude
/// * `lng` - Current longitude
/// * `geojson` - GeoJSON document (FeatureCollection, feature array or Feature)
/// * `options_json` - Resolver options as JSON, e.g. `{"mode": "road_graph"}`, or an
///   empty string for defaults
///
/// # Returns
/// JSON string of the resolution, or `null` when nothing is within range
#[wasm_bindgen]
pub fn resolve_intersection(
    lat: f64,
    lng: f64,
    geojson: &str,
    options_json: &str,
) -> Result<String, JsValue> {
    let collection = FeatureCollection::from_json_str(geojson)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let options = parse_options(options_json)?;

    let resolution =
        Resolver::new(options).resolve(&Coordinate::new(lat, lng), collection.features());

    serde_json::to_string(&resolution)
        .map_err(|e| JsValue::from_str(&format!("JSON serialize error: {}", e)))
}

/// Build the road graph and return its intersection nodes as JSON.
#[wasm_bindgen]
pub fn road_graph_nodes(geojson: &str, options_json: &str) -> Result<String, JsValue> {
    let collection = FeatureCollection::from_json_str(geojson)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let options = parse_options(options_json)?;

    let graph = Resolver::new(options).build_graph(collection.features());

    serde_json::to_string(graph.nodes())
        .map_err(|e| JsValue::from_str(&format!("JSON serialize error: {}", e)))
}

fn parse_options(options_json: &str) -> Result<ResolverOptions, JsValue> {
    if options_json.trim().is_empty() {
        return Ok(ResolverOptions::default());
    }
    serde_json::from_str(options_json)
        .map_err(|e| JsValue::from_str(&format!("Options parse error: {}", e)))
}
