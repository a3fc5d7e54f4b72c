//! Nearest-feature resolution for street intersections.
//!
//! This crate provides:
//! - Haversine distance calculations
//! - GeoJSON feature parsing into a strongly typed geometry model
//! - Geometry-aware nearest-point extraction (points, lines, polygons)
//! - Full-scan nearest queries, including a two-tier "preferred" scan
//! - Road-graph intersection synthesis from line segment endpoints
//! - Intersection display-name resolution from free-form properties
//! - Batch processing with optional parallelism
//! - WASM bindings for browser usage
//!
//! # Example
//!
//! ```
//! use crossroads_geo::{Coordinate, FeatureCollection, Resolver, ResolverOptions};
//!
//! let geojson = r#"{
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "geometry": {"type": "Point", "coordinates": [-79.3871, 43.6426]},
//!         "properties": {"street1": "front st w", "street2": "john st"}
//!     }]
//! }"#;
//!
//! let collection = FeatureCollection::from_json_str(geojson).unwrap();
//! let resolver = Resolver::new(ResolverOptions::default());
//! let here = Coordinate::new(43.6427, -79.3872);
//!
//! let resolution = resolver.resolve(&here, collection.features()).unwrap();
//! assert_eq!(resolution.name, "Front St W & John St");
//! assert!(resolution.distance_m < 50.0);
//! ```

mod error;
mod haversine;
pub mod batch;
pub mod feature;
pub mod graph;
pub mod names;
pub mod nearest;
pub mod resolver;

#[cfg(feature = "wasm")]
mod wasm;

pub use batch::{resolve_batch, resolve_batch_with, BatchResult};
pub use error::{GeoError, GeoErrorCode, Result};
pub use feature::{Feature, FeatureCollection, Geometry, Properties};
pub use graph::{
    ClassMapping, GridCell, NodeMatch, RoadClass, RoadGraph, RoadGraphOptions, RoadNode,
};
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use names::{
    base_street_name, normalize_name, resolve_intersection_name, UNNAMED_INTERSECTION,
};
pub use nearest::{
    nearest_feature, nearest_point, nearest_preferred, FeatureMatch, NearestPoint,
    PolygonStrategy, Preference, ScanOptions,
};
pub use resolver::{MatchSource, Resolution, Resolver, ResolverMode, ResolverOptions};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    ///
    /// No range checking is performed; out-of-range values produce
    /// meaningless but non-panicking results downstream.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate from a GeoJSON position (`[lng, lat]` order).
    #[inline]
    pub fn from_lng_lat(longitude: f64, latitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if the coordinate lies within the WGS-84 value ranges.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Returns true if both components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(43.6426, -79.3871);
        assert_eq!(coord.latitude, 43.6426);
        assert_eq!(coord.longitude, -79.3871);
    }

    #[test]
    fn test_coordinate_from_lng_lat() {
        let coord = Coordinate::from_lng_lat(-79.3871, 43.6426);
        assert_eq!(coord.latitude, 43.6426);
        assert_eq!(coord.longitude, -79.3871);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_coordinate_finite() {
        assert!(Coordinate::new(12.0, 34.0).is_finite());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_finite());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (43.6426, -79.3871).into();
        assert_eq!(coord.latitude, 43.6426);
    }
}
