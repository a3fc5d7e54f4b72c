//! GeoJSON feature model.
//!
//! Supports parsing:
//! - `FeatureCollection` objects: `{"type": "FeatureCollection", "features": [...]}`
//! - Bare arrays of features
//! - A single `Feature` object
//!
//! Geometry objects are decoded with the `geojson` crate. Parsing is lenient
//! per feature: a feature whose geometry is
//! missing or malformed is kept with `geometry: None` so that indices line up
//! with the source document, and scans skip it.

use crate::{Coordinate, GeoError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Geometry of a feature.
///
/// Positions are stored as [`Coordinate`]s (the `[lng, lat]` order of GeoJSON
/// is resolved at parse time).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position
    Point(Coordinate),
    /// Several positions; only the first is used for matching
    MultiPoint(Vec<Coordinate>),
    /// Connected segments
    LineString(Vec<Coordinate>),
    /// Independent lines
    MultiLineString(Vec<Vec<Coordinate>>),
    /// Rings, the first being the outer ring
    Polygon(Vec<Vec<Coordinate>>),
    /// Several polygons
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
}

impl Geometry {
    /// Parse a GeoJSON geometry object.
    ///
    /// Returns `None` for absent or unknown types, wrong array shapes, empty
    /// coordinate lists and non-finite numbers.
    ///
    /// # Example
    /// ```
    /// use crossroads_geo::{Coordinate, Geometry};
    /// use serde_json::json;
    ///
    /// let point = json!({"type": "Point", "coordinates": [-79.38, 43.65]});
    /// let geometry = Geometry::from_json(&point);
    /// assert_eq!(geometry, Some(Geometry::Point(Coordinate::new(43.65, -79.38))));
    ///
    /// assert!(Geometry::from_json(&json!({"type": "Point", "coordinates": []})).is_none());
    /// ```
    pub fn from_json(value: &Value) -> Option<Self> {
        let geometry = geojson::Geometry::from_json_value(value.clone()).ok()?;

        match geometry.value {
            geojson::Value::Point(position) => to_coordinate(&position).map(Geometry::Point),
            geojson::Value::MultiPoint(positions) => {
                to_coordinates(&positions).map(Geometry::MultiPoint)
            }
            geojson::Value::LineString(positions) => {
                to_coordinates(&positions).map(Geometry::LineString)
            }
            geojson::Value::MultiLineString(lines) => {
                non_empty(&lines, |line| to_coordinates(line)).map(Geometry::MultiLineString)
            }
            geojson::Value::Polygon(rings) => {
                non_empty(&rings, |ring| to_coordinates(ring)).map(Geometry::Polygon)
            }
            geojson::Value::MultiPolygon(polygons) => non_empty(&polygons, |polygon| {
                non_empty(polygon, |ring| to_coordinates(ring))
            })
            .map(Geometry::MultiPolygon),
            geojson::Value::GeometryCollection(_) => None,
        }
    }

    /// The GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

fn to_coordinate(position: &[f64]) -> Option<Coordinate> {
    let [lng, lat, ..] = *position else {
        return None;
    };
    let coordinate = Coordinate::from_lng_lat(lng, lat);

    coordinate.is_finite().then_some(coordinate)
}

fn to_coordinates(positions: &[Vec<f64>]) -> Option<Vec<Coordinate>> {
    non_empty(positions, |position| to_coordinate(position))
}

fn non_empty<S, T>(items: &[S], convert: impl Fn(&S) -> Option<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        return None;
    }
    items.iter().map(convert).collect()
}

/// Free-form string properties of a feature.
///
/// Strings are kept as-is, numbers and booleans are stringified, `null` and
/// nested values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a GeoJSON `properties` object. Anything else yields an empty map.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect()
    }

    /// Look up a property value.
    ///
    /// Tries the exact key first, then an ASCII case-insensitive match.
    /// Values that are empty after trimming count as absent; the returned
    /// value is trimmed.
    pub fn get(&self, key: &str) -> Option<&str> {
        let exact = self.0.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        if exact.is_some() {
            return exact;
        }

        self.0
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Returns the first non-empty value among `keys`, in order.
    pub fn first_of<'a>(&'a self, keys: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
        keys.into_iter().find_map(|key| self.get(key))
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over raw key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A geographic record: geometry plus properties. Read-only input to scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    /// Parsed geometry, `None` if it was missing or malformed
    pub geometry: Option<Geometry>,
    /// Free-form properties
    pub properties: Properties,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            geometry: Some(geometry),
            properties,
        }
    }

    /// Parse a GeoJSON `Feature` object. Never fails; see module docs.
    pub fn from_json(value: &Value) -> Self {
        Self {
            geometry: value.get("geometry").and_then(Geometry::from_json),
            properties: value
                .get("properties")
                .map(Properties::from_json)
                .unwrap_or_default(),
        }
    }

    /// Shorthand for a property lookup.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }
}

/// An ordered collection of features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wrap an existing list of features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse a GeoJSON document from a string.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    /// Parse a GeoJSON document.
    ///
    /// Accepts a `FeatureCollection`, an array of features, or a single
    /// `Feature`. Anything else is [`GeoError::InvalidGeoJson`].
    pub fn from_json(value: &Value) -> Result<Self> {
        let features = match value {
            Value::Array(items) => parse_features(items),
            Value::Object(_) => match value.get("type").and_then(Value::as_str) {
                Some("FeatureCollection") => {
                    let items = value
                        .get("features")
                        .and_then(Value::as_array)
                        .ok_or_else(|| {
                            GeoError::InvalidGeoJson(
                                "FeatureCollection without features array".into(),
                            )
                        })?;
                    parse_features(items)
                }
                Some("Feature") => vec![Feature::from_json(value)],
                Some(other) => {
                    return Err(GeoError::InvalidGeoJson(format!(
                        "Expected FeatureCollection or Feature, got: {}",
                        other
                    )))
                }
                None => return Err(GeoError::InvalidGeoJson("Missing 'type'".into())),
            },
            _ => {
                return Err(GeoError::InvalidGeoJson(
                    "Expected an object or an array".into(),
                ))
            }
        };

        let skipped = features.iter().filter(|f| f.geometry.is_none()).count();
        debug!(features = features.len(), skipped, "Parsed feature collection");

        Ok(Self { features })
    }

    /// The features, in document order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Consume into the underlying vector.
    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    /// Number of features (including ones with malformed geometry).
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if the collection holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn parse_features(items: &[Value]) -> Vec<Feature> {
    items.iter().map(Feature::from_json).collect()
}
