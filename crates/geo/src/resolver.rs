//! Resolver facade: one call from a query position to a named intersection.
//!
//! Callers pass everything explicitly (query, features, options); the
//! resolver holds no state between calls. `None` means nothing was within
//! range and the caller should fall back to another source, such as a
//! reverse-geocoding service.

use crate::feature::Feature;
use crate::graph::{NodeMatch, RoadGraph, RoadGraphOptions};
use crate::names::resolve_intersection_name;
use crate::nearest::{
    nearest_feature, nearest_preferred, FeatureMatch, PolygonStrategy, Preference, ScanOptions,
};
use crate::Coordinate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default search radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 500.0;

/// Which matching strategy to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResolverMode {
    /// Nearest feature, named from its properties
    #[default]
    Direct,
    /// Nearest preferred feature if in range, else nearest feature
    Preferred(Preference),
    /// Nearest synthesized road-graph node
    RoadGraph,
}

/// Resolver configuration.
///
/// In JSON the mode is a plain name with the preference beside it:
/// `{"mode": "preferred", "preference": {"property": "class", "value": "Major"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionsDocument", into = "OptionsDocument")]
pub struct ResolverOptions {
    /// Maximum accepted distance in meters
    pub radius_m: f64,
    /// Matching strategy
    pub mode: ResolverMode,
    /// Extra name fields tried before the built-in fallbacks
    pub name_fields: Vec<String>,
    /// Polygon matching strategy
    pub polygon_strategy: PolygonStrategy,
    /// Road-graph construction options
    pub graph: RoadGraphOptions,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            mode: ResolverMode::default(),
            name_fields: Vec::new(),
            polygon_strategy: PolygonStrategy::default(),
            graph: RoadGraphOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeTag {
    #[default]
    Direct,
    Preferred,
    RoadGraph,
}

#[derive(Serialize, Deserialize)]
struct OptionsDocument {
    #[serde(default = "default_radius")]
    radius_m: f64,
    #[serde(default)]
    mode: ModeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preference: Option<Preference>,
    #[serde(default)]
    name_fields: Vec<String>,
    #[serde(default)]
    polygon_strategy: PolygonStrategy,
    #[serde(default)]
    graph: RoadGraphOptions,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_M
}

impl TryFrom<OptionsDocument> for ResolverOptions {
    type Error = String;

    fn try_from(doc: OptionsDocument) -> std::result::Result<Self, Self::Error> {
        let mode = match (doc.mode, doc.preference) {
            (ModeTag::Direct, _) => ResolverMode::Direct,
            (ModeTag::RoadGraph, _) => ResolverMode::RoadGraph,
            (ModeTag::Preferred, Some(preference)) => ResolverMode::Preferred(preference),
            (ModeTag::Preferred, None) => {
                return Err("mode `preferred` requires a `preference`".to_string());
            }
        };

        Ok(Self {
            radius_m: doc.radius_m,
            mode,
            name_fields: doc.name_fields,
            polygon_strategy: doc.polygon_strategy,
            graph: doc.graph,
        })
    }
}

impl From<ResolverOptions> for OptionsDocument {
    fn from(options: ResolverOptions) -> Self {
        let (mode, preference) = match options.mode {
            ResolverMode::Direct => (ModeTag::Direct, None),
            ResolverMode::Preferred(preference) => (ModeTag::Preferred, Some(preference)),
            ResolverMode::RoadGraph => (ModeTag::RoadGraph, None),
        };

        Self {
            radius_m: options.radius_m,
            mode,
            preference,
            name_fields: options.name_fields,
            polygon_strategy: options.polygon_strategy,
            graph: options.graph,
        }
    }
}

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MatchSource {
    /// A feature of the input, by index
    Feature { index: usize },
    /// A synthesized road-graph node, by index
    RoadNode { index: usize, endpoints: usize },
}

/// A resolved intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Display name
    pub name: String,
    /// Matched point
    pub point: Coordinate,
    /// Distance from the query, in meters
    pub distance_m: f64,
    /// Whether the match satisfied the preference (preferred mode only)
    pub preferred: bool,
    /// Origin of the match
    #[serde(flatten)]
    pub source: MatchSource,
}

/// Stateless nearest-intersection resolver.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolverOptions,
}

impl Resolver {
    /// Creates a resolver with the given options.
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// The resolver's options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            polygon_strategy: self.options.polygon_strategy,
        }
    }

    /// Resolve `query` against `features`.
    ///
    /// In road-graph mode the graph is built from `features` on every call;
    /// use [`Resolver::build_graph`] and [`Resolver::resolve_in_graph`] to
    /// reuse it across queries.
    pub fn resolve(&self, query: &Coordinate, features: &[Feature]) -> Option<Resolution> {
        let resolution = match &self.options.mode {
            ResolverMode::Direct => {
                nearest_feature(query, features, self.options.radius_m, &self.scan_options())
                    .map(|m| self.feature_resolution(m))
            }
            ResolverMode::Preferred(preference) => nearest_preferred(
                query,
                features,
                self.options.radius_m,
                preference,
                &self.scan_options(),
            )
            .map(|m| self.feature_resolution(m)),
            ResolverMode::RoadGraph => {
                let graph = self.build_graph(features);
                return self.resolve_in_graph(query, &graph);
            }
        };

        log_outcome(query, resolution.as_ref());
        resolution
    }

    /// Build the road graph with this resolver's graph options.
    pub fn build_graph(&self, features: &[Feature]) -> RoadGraph {
        RoadGraph::build(features, &self.options.graph)
    }

    /// Resolve `query` against a prebuilt road graph.
    pub fn resolve_in_graph(&self, query: &Coordinate, graph: &RoadGraph) -> Option<Resolution> {
        let resolution = graph
            .nearest(query, self.options.radius_m)
            .map(|m| self.node_resolution(m));

        log_outcome(query, resolution.as_ref());
        resolution
    }

    fn feature_resolution(&self, m: FeatureMatch<'_>) -> Resolution {
        let fields: Vec<&str> = self.options.name_fields.iter().map(String::as_str).collect();
        Resolution {
            name: resolve_intersection_name(&m.feature.properties, &fields),
            point: m.point,
            distance_m: m.distance_m,
            preferred: m.preferred,
            source: MatchSource::Feature { index: m.index },
        }
    }

    fn node_resolution(&self, m: NodeMatch<'_>) -> Resolution {
        Resolution {
            name: m.node.display_name(),
            point: m.node.coordinate,
            distance_m: m.distance_m,
            preferred: !m.node.major.is_empty(),
            source: MatchSource::RoadNode {
                index: m.index,
                endpoints: m.node.endpoints,
            },
        }
    }
}

fn log_outcome(query: &Coordinate, resolution: Option<&Resolution>) {
    match resolution {
        Some(r) => debug!(
            lat = query.latitude,
            lng = query.longitude,
            name = %r.name,
            distance_m = r.distance_m,
            preferred = r.preferred,
            "Resolved intersection"
        ),
        None => debug!(
            lat = query.latitude,
            lng = query.longitude,
            "No intersection within radius"
        ),
    }
}
