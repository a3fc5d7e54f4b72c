//! Road-graph intersection synthesis.
//!
//! Some datasets describe roads only as line segments, with no labelled
//! intersection points. Intersections are recovered by snapping every line
//! endpoint to a coarse grid and merging endpoints that land in the same
//! cell. A cell becomes a [`RoadNode`] only when it joins endpoints of at
//! least two segments carrying at least two distinct street names, which
//! filters out dead ends and plain curve vertices.
//!
//! The graph is rebuilt from scratch for each feature set; there is no
//! incremental update.

use crate::feature::{Feature, Geometry};
use crate::names::{base_street_name, join_pair, normalize_name, UNNAMED_INTERSECTION};
use crate::{haversine_distance_meters, Coordinate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, trace};

/// Default grid resolution in degrees (about 22 m of latitude).
pub const DEFAULT_SNAP_PRECISION: f64 = 2e-4;

/// Road classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    /// Arterials and other preferred roads
    Major,
    /// Local, private and pedestrian ways
    Minor,
    /// No class property, or a value in neither list
    Unclassified,
}

/// Maps raw classification values to [`RoadClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    /// Values classified as minor (ASCII case-insensitive)
    #[serde(default = "default_minor_values")]
    pub minor_values: Vec<String>,
    /// Values classified as major. `None` means every other present value.
    #[serde(default)]
    pub major_values: Option<Vec<String>>,
}

impl Default for ClassMapping {
    fn default() -> Self {
        Self {
            minor_values: default_minor_values(),
            major_values: None,
        }
    }
}

fn default_minor_values() -> Vec<String> {
    vec!["Minor", "Private", "Pedestrian"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn contains_ignore_case(values: &[String], value: &str) -> bool {
    values.iter().any(|v| v.trim().eq_ignore_ascii_case(value))
}

impl ClassMapping {
    /// Classify a raw property value.
    pub fn classify(&self, value: Option<&str>) -> RoadClass {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return RoadClass::Unclassified;
        };

        if contains_ignore_case(&self.minor_values, value) {
            return RoadClass::Minor;
        }

        match &self.major_values {
            None => RoadClass::Major,
            Some(major) if contains_ignore_case(major, value) => RoadClass::Major,
            Some(_) => RoadClass::Unclassified,
        }
    }
}

/// Road-graph construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadGraphOptions {
    /// Properties tried in order for a segment's street name
    #[serde(default = "default_name_fields")]
    pub name_fields: Vec<String>,
    /// Property holding the road classification
    #[serde(default = "default_class_field")]
    pub class_field: String,
    /// Classification value mapping
    #[serde(default)]
    pub classes: ClassMapping,
    /// Grid resolution in degrees used to merge endpoints
    #[serde(default = "default_snap_precision")]
    pub snap_precision: f64,
}

impl Default for RoadGraphOptions {
    fn default() -> Self {
        Self {
            name_fields: default_name_fields(),
            class_field: default_class_field(),
            classes: ClassMapping::default(),
            snap_precision: DEFAULT_SNAP_PRECISION,
        }
    }
}

fn default_name_fields() -> Vec<String> {
    vec!["name", "street", "st_name", "road_name", "fullname"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_class_field() -> String {
    "class".to_string()
}

fn default_snap_precision() -> f64 {
    DEFAULT_SNAP_PRECISION
}

/// Index of a snapping grid cell: rounded latitude and longitude divided by
/// the grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridCell(pub i64, pub i64);

impl GridCell {
    /// The cell containing `coordinate` at resolution `precision` (degrees).
    pub fn of(coordinate: &Coordinate, precision: f64) -> Self {
        GridCell(
            (coordinate.latitude / precision).round() as i64,
            (coordinate.longitude / precision).round() as i64,
        )
    }
}

/// A synthesized intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadNode {
    /// Grid cell the node was merged in
    pub cell: GridCell,
    /// Mean of all contributing endpoints
    pub coordinate: Coordinate,
    /// Number of contributing endpoints
    pub endpoints: usize,
    /// Number of distinct contributing segments
    pub segments: usize,
    /// Raw street names with occurrence counts, in first-seen order
    pub names: Vec<(String, usize)>,
    /// Base names of streets classified major
    pub major: BTreeSet<String>,
    /// Base names of streets classified minor
    pub minor: BTreeSet<String>,
}

impl RoadNode {
    /// Occurrence count of a raw street name.
    pub fn count(&self, name: &str) -> usize {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, count)| *count)
    }

    /// Display label for the node.
    ///
    /// In priority order: two major streets, a major and a minor street, a
    /// major and any other street, a lone major street, two other streets, a
    /// lone street, then [`UNNAMED_INTERSECTION`]. Streets are distinct by
    /// base name and shown by their most frequent spelling; within a tier the
    /// more frequent street is listed first.
    pub fn display_name(&self) -> String {
        let mut ranked: Vec<&(String, usize)> = self.names.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut seen = HashSet::new();
        let streets: Vec<(String, String)> = ranked
            .into_iter()
            .map(|(raw, _)| (normalize_name(raw), base_street_name(raw)))
            .filter(|(_, base)| seen.insert(base.clone()))
            .collect();

        let is_major = |base: &String| self.major.contains(base);
        let majors: Vec<&str> = streets
            .iter()
            .filter(|(_, base)| is_major(base))
            .map(|(name, _)| name.as_str())
            .collect();
        let minors: Vec<&str> = streets
            .iter()
            .filter(|(_, base)| !is_major(base) && self.minor.contains(base))
            .map(|(name, _)| name.as_str())
            .collect();
        let others: Vec<&str> = streets
            .iter()
            .filter(|(_, base)| !is_major(base))
            .map(|(name, _)| name.as_str())
            .collect();

        match (majors.as_slice(), minors.as_slice(), others.as_slice()) {
            ([first, second, ..], _, _) => join_pair(first, second),
            ([major], [minor, ..], _) => join_pair(major, minor),
            ([major], _, [other, ..]) => join_pair(major, other),
            ([major], _, []) => (*major).to_string(),
            ([], _, [first, second, ..]) => join_pair(first, second),
            ([], _, [only]) => (*only).to_string(),
            _ => UNNAMED_INTERSECTION.to_string(),
        }
    }
}

/// A node selected by [`RoadGraph::nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMatch<'a> {
    /// The matched node
    pub node: &'a RoadNode,
    /// Position of the node in [`RoadGraph::nodes`]
    pub index: usize,
    /// Distance from the query, in meters
    pub distance_m: f64,
}

#[derive(Default)]
struct NodeAccumulator {
    lat_sum: f64,
    lng_sum: f64,
    endpoints: usize,
    segments: BTreeSet<usize>,
    names: Vec<(String, usize)>,
    major: BTreeSet<String>,
    minor: BTreeSet<String>,
}

impl NodeAccumulator {
    fn add(&mut self, endpoint: Coordinate, segment: usize, name: &str, class: RoadClass) {
        self.lat_sum += endpoint.latitude;
        self.lng_sum += endpoint.longitude;
        self.endpoints += 1;
        self.segments.insert(segment);

        match self.names.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += 1,
            None => self.names.push((name.to_string(), 1)),
        }

        match class {
            RoadClass::Major => {
                self.major.insert(base_street_name(name));
            }
            RoadClass::Minor => {
                self.minor.insert(base_street_name(name));
            }
            RoadClass::Unclassified => {}
        }
    }

    fn is_intersection(&self) -> bool {
        self.endpoints >= 2 && self.names.len() >= 2
    }

    fn into_node(self, cell: GridCell) -> RoadNode {
        let n = self.endpoints as f64;
        RoadNode {
            cell,
            coordinate: Coordinate::new(self.lat_sum / n, self.lng_sum / n),
            endpoints: self.endpoints,
            segments: self.segments.len(),
            names: self.names,
            major: self.major,
            minor: self.minor,
        }
    }
}

/// Intersections synthesized from line segment endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoadGraph {
    nodes: Vec<RoadNode>,
}

impl RoadGraph {
    /// Build the graph from `features`.
    ///
    /// Every LineString (and every component of a MultiLineString) whose
    /// feature has a street name contributes its two endpoints. Nodes are
    /// ordered by grid cell.
    ///
    /// # Example
    /// ```
    /// use crossroads_geo::{
    ///     Coordinate, Feature, Geometry, Properties, RoadGraph, RoadGraphOptions,
    /// };
    ///
    /// let corner = Coordinate::new(43.6500, -79.3800);
    /// let street = |name: &str, far: Coordinate| {
    ///     let props: Properties = [("name", name)].into_iter().collect();
    ///     Feature::new(Geometry::LineString(vec![far, corner]), props)
    /// };
    /// let features = vec![
    ///     street("Main St", Coordinate::new(43.6500, -79.3850)),
    ///     street("Elm St", Coordinate::new(43.6550, -79.3800)),
    /// ];
    ///
    /// let graph = RoadGraph::build(&features, &RoadGraphOptions::default());
    /// assert_eq!(graph.len(), 1);
    /// assert_eq!(graph.nodes()[0].display_name(), "Main St & Elm St");
    /// ```
    pub fn build(features: &[Feature], options: &RoadGraphOptions) -> Self {
        let precision = if options.snap_precision > 0.0 {
            options.snap_precision
        } else {
            DEFAULT_SNAP_PRECISION
        };

        let mut cells: BTreeMap<GridCell, NodeAccumulator> = BTreeMap::new();
        let mut segment_id = 0usize;

        for (index, feature) in features.iter().enumerate() {
            let lines: Vec<&Vec<Coordinate>> = match &feature.geometry {
                Some(Geometry::LineString(line)) => vec![line],
                Some(Geometry::MultiLineString(lines)) => lines.iter().collect(),
                _ => continue,
            };

            let Some(name) = feature
                .properties
                .first_of(options.name_fields.iter().map(String::as_str))
            else {
                trace!(index, "Skipping segment without a street name");
                continue;
            };
            let class = options
                .classes
                .classify(feature.property(&options.class_field));

            for line in lines {
                let (Some(first), Some(last)) = (line.first(), line.last()) else {
                    continue;
                };

                for endpoint in [*first, *last] {
                    if !endpoint.is_finite() {
                        continue;
                    }
                    cells
                        .entry(GridCell::of(&endpoint, precision))
                        .or_default()
                        .add(endpoint, segment_id, name, class);
                }
                segment_id += 1;
            }
        }

        let cell_count = cells.len();
        let nodes: Vec<RoadNode> = cells
            .into_iter()
            .filter(|(_, acc)| acc.is_intersection())
            .map(|(cell, acc)| acc.into_node(cell))
            .collect();

        debug!(segments = segment_id, cells = cell_count, nodes = nodes.len(), "Built road graph");

        Self { nodes }
    }

    /// The qualifying intersection nodes.
    pub fn nodes(&self) -> &[RoadNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node qualified.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node closest to `query` within `radius_m`. Ties go to the earlier node.
    pub fn nearest(&self, query: &Coordinate, radius_m: f64) -> Option<NodeMatch<'_>> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| NodeMatch {
                node,
                index,
                distance_m: haversine_distance_meters(query, &node.coordinate),
            })
            .filter(|m| !m.distance_m.is_nan())
            .fold(None, |best: Option<NodeMatch<'_>>, candidate| match best {
                Some(b) if b.distance_m <= candidate.distance_m => Some(b),
                _ => Some(candidate),
            })
            .filter(|m| m.distance_m <= radius_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Properties;

    const CORNER: Coordinate = Coordinate { latitude: 43.65, longitude: -79.38 };

    fn segment(name: &str, class: Option<&str>, from: Coordinate, to: Coordinate) -> Feature {
        let mut props: Properties = [("name", name)].into_iter().collect();
        if let Some(class) = class {
            props.insert("class", class);
        }
        Feature::new(Geometry::LineString(vec![from, to]), props)
    }

    fn away(dlat: f64, dlng: f64) -> Coordinate {
        Coordinate::new(CORNER.latitude + dlat, CORNER.longitude + dlng)
    }

    #[test]
    fn test_shared_endpoint_makes_one_node() {
        let features = vec![
            segment("Main St", None, away(0.0, -0.005), CORNER),
            segment("Elm St", None, CORNER, away(0.005, 0.0)),
        ];

        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());

        assert_eq!(graph.len(), 1);
        let node = &graph.nodes()[0];
        assert_eq!(node.count("Main St"), 1);
        assert_eq!(node.count("Elm St"), 1);
        assert!(node.endpoints >= 2);
        assert_eq!(node.segments, 2);
    }

    #[test]
    fn test_endpoints_merge_within_snap_tolerance() {
        let features = vec![
            segment("Main St", None, away(0.0, -0.005), CORNER),
            segment("Elm St", None, away(0.00003, 0.00003), away(0.005, 0.0)),
        ];

        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());
        assert_eq!(graph.len(), 1);

        let node = &graph.nodes()[0];
        assert!((node.coordinate.latitude - (CORNER.latitude + 0.000015)).abs() < 1e-9);
        assert!((node.coordinate.longitude - (CORNER.longitude + 0.000015)).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_segment_makes_no_node() {
        let features = vec![segment("Main St", None, away(0.0, -0.005), CORNER)];
        assert!(RoadGraph::build(&features, &RoadGraphOptions::default()).is_empty());
    }

    #[test]
    fn test_same_street_continuation_is_not_an_intersection() {
        let features = vec![
            segment("Main St", None, away(0.0, -0.005), CORNER),
            segment("Main St", None, CORNER, away(0.0, 0.005)),
        ];
        assert!(RoadGraph::build(&features, &RoadGraphOptions::default()).is_empty());
    }

    #[test]
    fn test_unnamed_segments_are_ignored() {
        let unnamed = Feature::new(
            Geometry::LineString(vec![CORNER, away(0.005, 0.0)]),
            Properties::new(),
        );
        let features = vec![segment("Main St", None, away(0.0, -0.005), CORNER), unnamed];
        assert!(RoadGraph::build(&features, &RoadGraphOptions::default()).is_empty());
    }

    #[test]
    fn test_multi_line_string_components_count_as_segments() {
        let props: Properties = [("name", "Elm St")].into_iter().collect();
        let multi = Feature::new(
            Geometry::MultiLineString(vec![
                vec![CORNER, away(0.005, 0.0)],
                vec![away(-0.005, 0.0), CORNER],
            ]),
            props,
        );
        let features = vec![segment("Main St", None, away(0.0, -0.005), CORNER), multi];

        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.nodes()[0].segments, 3);
        assert_eq!(graph.nodes()[0].count("Elm St"), 2);
    }

    #[test]
    fn test_snap_precision_is_configurable() {
        let features = vec![
            segment("Main St", None, away(0.0, -0.005), CORNER),
            segment("Elm St", None, away(0.0004, 0.0), away(0.005, 0.0)),
        ];

        assert!(RoadGraph::build(&features, &RoadGraphOptions::default()).is_empty());

        let coarse = RoadGraphOptions {
            snap_precision: 1e-3,
            ..RoadGraphOptions::default()
        };
        assert_eq!(RoadGraph::build(&features, &coarse).len(), 1);
    }

    #[test]
    fn test_classification() {
        let mapping = ClassMapping::default();
        assert_eq!(mapping.classify(Some("Minor")), RoadClass::Minor);
        assert_eq!(mapping.classify(Some("pedestrian")), RoadClass::Minor);
        assert_eq!(mapping.classify(Some("Major Arterial")), RoadClass::Major);
        assert_eq!(mapping.classify(None), RoadClass::Unclassified);
        assert_eq!(mapping.classify(Some("  ")), RoadClass::Unclassified);

        let strict = ClassMapping {
            major_values: Some(vec!["Arterial".to_string()]),
            ..ClassMapping::default()
        };
        assert_eq!(strict.classify(Some("arterial")), RoadClass::Major);
        assert_eq!(strict.classify(Some("Collector")), RoadClass::Unclassified);
    }

    #[test]
    fn test_major_listed_before_minor() {
        // Elm St is more frequent, but Main Street is the major road.
        let features = vec![
            segment("Main Street", Some("Major"), away(0.0, -0.005), CORNER),
            segment("Elm Street", Some("Minor"), CORNER, away(0.005, 0.0)),
            segment("Elm Street", Some("Minor"), away(-0.005, 0.0), CORNER),
        ];

        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());
        let node = &graph.nodes()[0];

        assert!(node.major.contains("Main Street"));
        assert!(node.minor.contains("Elm Street"));
        assert_eq!(node.display_name(), "Main Street & Elm Street");
    }

    fn node(names: &[(&str, usize)], major: &[&str], minor: &[&str]) -> RoadNode {
        RoadNode {
            cell: GridCell(0, 0),
            coordinate: CORNER,
            endpoints: names.iter().map(|(_, c)| c).sum(),
            segments: names.len(),
            names: names.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            major: major.iter().map(|s| s.to_string()).collect(),
            minor: minor.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_display_name_tiers() {
        // (a) two majors, more frequent first
        let n = node(&[("Elm Street", 1), ("Main Street", 3)], &["Elm Street", "Main Street"], &[]);
        assert_eq!(n.display_name(), "Main Street & Elm Street");

        // (b) major + minor beats major + unclassified
        let n = node(
            &[("Oak Street", 5), ("Main Street", 1), ("Elm Street", 1)],
            &["Main Street"],
            &["Elm Street"],
        );
        assert_eq!(n.display_name(), "Main Street & Elm Street");

        // (c) major + other
        let n = node(&[("Oak Street", 2), ("Main Street", 1)], &["Main Street"], &[]);
        assert_eq!(n.display_name(), "Main Street & Oak Street");

        // (d) lone major
        let n = node(&[("Main St N", 1), ("Main Street", 1)], &["Main Street"], &[]);
        assert_eq!(n.display_name(), "Main St N");

        // (e) two others, more frequent first
        let n = node(&[("Elm Street", 1), ("Oak Street", 2)], &[], &["Elm Street"]);
        assert_eq!(n.display_name(), "Oak Street & Elm Street");

        // (f) one other
        let n = node(&[("oak st", 1)], &[], &[]);
        assert_eq!(n.display_name(), "Oak St");

        // (g) nothing
        let n = node(&[], &[], &[]);
        assert_eq!(n.display_name(), UNNAMED_INTERSECTION);
    }

    #[test]
    fn test_spelling_variants_merge_by_base_name() {
        let features = vec![
            segment("Main St N", Some("Major"), away(0.0, -0.005), CORNER),
            segment("Main Street North", Some("Major"), CORNER, away(0.0, 0.005)),
            segment("Elm St", Some("Minor"), CORNER, away(0.005, 0.0)),
        ];

        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());
        let node = &graph.nodes()[0];

        assert_eq!(node.major.len(), 1);
        assert_eq!(node.display_name(), "Main St N & Elm St");
    }

    #[test]
    fn test_nearest_node() {
        let features = vec![
            segment("Main St", None, away(0.0, -0.005), CORNER),
            segment("Elm St", None, CORNER, away(0.005, 0.0)),
        ];
        let graph = RoadGraph::build(&features, &RoadGraphOptions::default());

        let query = away(0.0002, 0.0);
        let found = graph.nearest(&query, 100.0).unwrap();
        assert_eq!(found.index, 0);
        assert!((found.distance_m - 22.2).abs() < 0.5);

        assert!(graph.nearest(&query, 10.0).is_none());
    }
}
