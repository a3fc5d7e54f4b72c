//! Geometry-aware nearest-point extraction and full-scan nearest queries.
//!
//! Line geometries are matched against their segments, not only their
//! vertices: real intersections are often interior points where two drawn
//! lines meet. Segments are projected into a local equirectangular plane
//! centred on the query (longitude scaled by the cosine of the query
//! latitude), the clamped point-to-segment projection is taken, and the
//! candidate is measured back with the haversine distance.

use crate::feature::{Feature, Geometry};
use crate::{haversine_distance_meters, Coordinate};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Substitute denominator for zero-length segments.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// How polygon geometries are matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonStrategy {
    /// First vertex of the first ring. Cheap approximation, not a true
    /// nearest point.
    #[default]
    FirstVertex,
    /// Nearest point on any ring edge, using the same projection as lines.
    Boundary,
}

/// Options shared by every scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Polygon matching strategy
    #[serde(default)]
    pub polygon_strategy: PolygonStrategy,
}

/// The closest point found on a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestPoint {
    /// Closest point on the geometry
    pub point: Coordinate,
    /// Haversine distance from the query, in meters
    pub distance_m: f64,
}

/// A property name/value pair marking "preferred" features, e.g. major roads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// Property to inspect
    pub property: String,
    /// Value that marks a feature as preferred
    pub value: String,
}

impl Preference {
    /// Creates a new preference.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// True if the feature's property equals the value, ignoring ASCII case
    /// and surrounding whitespace.
    pub fn matches(&self, feature: &Feature) -> bool {
        feature
            .property(&self.property)
            .is_some_and(|v| v.eq_ignore_ascii_case(self.value.trim()))
    }
}

/// A feature selected by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureMatch<'a> {
    /// The matched feature
    pub feature: &'a Feature,
    /// Position of the feature in the scanned slice
    pub index: usize,
    /// Closest point on the feature's geometry
    pub point: Coordinate,
    /// Distance from the query, in meters
    pub distance_m: f64,
    /// Whether the feature satisfied the scan's preference
    pub preferred: bool,
}

impl Feature {
    /// Closest point on this feature's geometry, `None` if the geometry is
    /// missing or unusable.
    pub fn nearest_point(
        &self,
        query: &Coordinate,
        strategy: PolygonStrategy,
    ) -> Option<NearestPoint> {
        self.geometry
            .as_ref()
            .and_then(|geometry| nearest_point(geometry, query, strategy))
    }
}

/// Closest point on a geometry to `query`.
///
/// Results with a `NaN` distance (non-finite input) are discarded.
///
/// # Example
/// ```
/// use crossroads_geo::{nearest_point, Coordinate, Geometry, PolygonStrategy};
///
/// let street = Geometry::LineString(vec![
///     Coordinate::new(0.0, 0.0),
///     Coordinate::new(0.0, 0.001),
/// ]);
/// let query = Coordinate::new(0.0005, 0.0005);
///
/// let nearest = nearest_point(&street, &query, PolygonStrategy::FirstVertex).unwrap();
/// assert!((nearest.point.longitude - 0.0005).abs() < 1e-9);
/// assert!((nearest.distance_m - 55.6).abs() < 1.0);
/// ```
pub fn nearest_point(
    geometry: &Geometry,
    query: &Coordinate,
    strategy: PolygonStrategy,
) -> Option<NearestPoint> {
    let nearest = match geometry {
        Geometry::Point(point) => Some(measure(query, *point)),
        Geometry::MultiPoint(points) => points.first().map(|point| measure(query, *point)),
        Geometry::LineString(line) => nearest_on_line(query, line),
        Geometry::MultiLineString(lines) => {
            closest(lines.iter().filter_map(|line| nearest_on_line(query, line)))
        }
        Geometry::Polygon(rings) => match strategy {
            PolygonStrategy::FirstVertex => first_vertex(query, rings),
            PolygonStrategy::Boundary => {
                closest(rings.iter().filter_map(|ring| nearest_on_line(query, ring)))
            }
        },
        Geometry::MultiPolygon(polygons) => match strategy {
            PolygonStrategy::FirstVertex => {
                polygons.first().and_then(|rings| first_vertex(query, rings))
            }
            PolygonStrategy::Boundary => closest(
                polygons
                    .iter()
                    .flatten()
                    .filter_map(|ring| nearest_on_line(query, ring)),
            ),
        },
    };

    nearest.filter(|n| !n.distance_m.is_nan())
}

fn measure(query: &Coordinate, point: Coordinate) -> NearestPoint {
    NearestPoint {
        point,
        distance_m: haversine_distance_meters(query, &point),
    }
}

fn first_vertex(query: &Coordinate, rings: &[Vec<Coordinate>]) -> Option<NearestPoint> {
    rings
        .first()
        .and_then(|ring| ring.first())
        .map(|point| measure(query, *point))
}

/// Keeps the first of equally distant candidates; `NaN` never wins.
fn closest(candidates: impl Iterator<Item = NearestPoint>) -> Option<NearestPoint> {
    candidates
        .filter(|c| !c.distance_m.is_nan())
        .fold(None, |best: Option<NearestPoint>, candidate| match best {
            Some(b) if b.distance_m <= candidate.distance_m => Some(b),
            _ => Some(candidate),
        })
}

fn nearest_on_line(query: &Coordinate, line: &[Coordinate]) -> Option<NearestPoint> {
    match line {
        [] => None,
        [only] => Some(measure(query, *only)),
        _ => {
            let plane = LocalPlane::around(*query);
            closest(
                line.windows(2)
                    .map(|pair| plane.nearest_on_segment(pair[0], pair[1])),
            )
        }
    }
}

/// Equirectangular plane centred on a query point, in degree units.
struct LocalPlane {
    origin: Coordinate,
    lng_scale: f64,
}

impl LocalPlane {
    fn around(origin: Coordinate) -> Self {
        let scale = origin.latitude.to_radians().cos();
        let lng_scale = if scale.abs() < DEGENERATE_EPSILON {
            DEGENERATE_EPSILON
        } else {
            scale
        };
        Self { origin, lng_scale }
    }

    fn project(&self, c: Coordinate) -> (f64, f64) {
        (
            (c.longitude - self.origin.longitude) * self.lng_scale,
            c.latitude - self.origin.latitude,
        )
    }

    fn unproject(&self, x: f64, y: f64) -> Coordinate {
        Coordinate::new(
            self.origin.latitude + y,
            self.origin.longitude + x / self.lng_scale,
        )
    }

    /// Clamped projection of the origin onto segment `a`-`b`.
    ///
    /// A projection clamped to either end returns that vertex unchanged.
    fn nearest_on_segment(&self, a: Coordinate, b: Coordinate) -> NearestPoint {
        let (ax, ay) = self.project(a);
        let (bx, by) = self.project(b);
        let (dx, dy) = (bx - ax, by - ay);

        let mut length_sq = dx * dx + dy * dy;
        if length_sq <= 0.0 {
            length_sq = DEGENERATE_EPSILON;
        }

        let t = -(ax * dx + ay * dy) / length_sq;
        let point = if t <= 0.0 {
            a
        } else if t >= 1.0 {
            b
        } else {
            self.unproject(ax + t * dx, ay + t * dy)
        };

        measure(&self.origin, point)
    }
}

fn candidates<'a>(
    query: &Coordinate,
    features: &'a [Feature],
    options: ScanOptions,
) -> impl Iterator<Item = FeatureMatch<'a>> + 'a {
    let query = *query;
    features
        .iter()
        .enumerate()
        .filter_map(move |(index, feature)| {
            let Some(nearest) = feature.nearest_point(&query, options.polygon_strategy) else {
                trace!(index, "Skipping feature without usable geometry");
                return None;
            };

            Some(FeatureMatch {
                feature,
                index,
                point: nearest.point,
                distance_m: nearest.distance_m,
                preferred: false,
            })
        })
}

/// Keeps the earlier match on ties so iteration order decides.
fn keep_closer<'a>(
    best: Option<FeatureMatch<'a>>,
    candidate: FeatureMatch<'a>,
) -> Option<FeatureMatch<'a>> {
    match best {
        Some(b) if b.distance_m <= candidate.distance_m => Some(b),
        _ => Some(candidate),
    }
}

/// The feature closest to `query` whose nearest point lies within `radius_m`.
///
/// Linear scan; features without usable geometry are skipped. Among equally
/// distant features the first in slice order wins. Returns `None` when no
/// feature is within range, including for an empty slice.
pub fn nearest_feature<'a>(
    query: &Coordinate,
    features: &'a [Feature],
    radius_m: f64,
    options: &ScanOptions,
) -> Option<FeatureMatch<'a>> {
    candidates(query, features, *options)
        .fold(None, keep_closer)
        .filter(|m| m.distance_m <= radius_m)
}

/// Two-tier nearest query.
///
/// Tracks the best preferred feature and the best feature overall in one
/// pass. The preferred match is returned if it is within `radius_m`,
/// otherwise the overall match if it is within range, otherwise `None`.
pub fn nearest_preferred<'a>(
    query: &Coordinate,
    features: &'a [Feature],
    radius_m: f64,
    preference: &Preference,
    options: &ScanOptions,
) -> Option<FeatureMatch<'a>> {
    let mut best_preferred = None;
    let mut best_any = None;

    for mut candidate in candidates(query, features, *options) {
        candidate.preferred = preference.matches(candidate.feature);
        if candidate.preferred {
            best_preferred = keep_closer(best_preferred, candidate);
        }
        best_any = keep_closer(best_any, candidate);
    }

    let within = |m: &FeatureMatch<'_>| m.distance_m <= radius_m;
    best_preferred.filter(within).or_else(|| best_any.filter(within))
}
