//! Batch resolution with optional parallelism.
//!
//! Each query is resolved independently against the same feature set, e.g. a
//! recorded track of positions. In road-graph mode the graph is built once
//! for the whole batch.

use crate::feature::Feature;
use crate::resolver::{Resolution, Resolver, ResolverMode};
use crate::Coordinate;
use serde::Serialize;

/// Result of resolving a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// The query position
    pub query: Coordinate,
    /// The resolution, `None` if nothing was within range
    pub resolution: Option<Resolution>,
}

/// Resolve every query in `queries` against `features`.
///
/// Output order matches input order.
///
/// # Example
/// ```
/// use crossroads_geo::{resolve_batch, Coordinate, Feature, Geometry, Properties, Resolver};
///
/// let props: Properties = [("name", "Main St & Elm St")].into_iter().collect();
/// let features = vec![Feature::new(Geometry::Point(Coordinate::new(10.0, 10.0)), props)];
/// let queries = [Coordinate::new(10.0001, 10.0), Coordinate::new(20.0, 20.0)];
///
/// let results = resolve_batch(&Resolver::default(), &queries, &features);
/// assert_eq!(results.len(), 2);
/// assert!(results[0].resolution.is_some());
/// assert!(results[1].resolution.is_none());
/// ```
pub fn resolve_batch(
    resolver: &Resolver,
    queries: &[Coordinate],
    features: &[Feature],
) -> Vec<BatchResult> {
    resolve_batch_with(resolver, queries, features, |_| {})
}

/// Like [`resolve_batch`], calling `on_resolved` as each query completes.
///
/// With the `parallel` feature the callback runs on worker threads in no
/// particular order. Used to drive progress reporting.
pub fn resolve_batch_with<F>(
    resolver: &Resolver,
    queries: &[Coordinate],
    features: &[Feature],
    on_resolved: F,
) -> Vec<BatchResult>
where
    F: Fn(&BatchResult) + Sync,
{
    let graph = matches!(resolver.options().mode, ResolverMode::RoadGraph)
        .then(|| resolver.build_graph(features));

    let resolve_one = |query: &Coordinate| {
        let result = BatchResult {
            query: *query,
            resolution: match &graph {
                Some(graph) => resolver.resolve_in_graph(query, graph),
                None => resolver.resolve(query, features),
            },
        };
        on_resolved(&result);
        result
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        queries.par_iter().map(resolve_one).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        queries.iter().map(resolve_one).collect()
    }
}

/// Number of results that found a match.
pub fn count_resolved(results: &[BatchResult]) -> usize {
    results.iter().filter(|r| r.resolution.is_some()).count()
}
