//! `crossroads graph`: resolve against, or list, the synthesized road graph

use super::nearest::print_resolution;
use super::{load_features, query_point, Context, Outcome, SourceArgs};
use anyhow::Result;
use clap::Args;
use crossroads_cli::output::{format_coordinate, format_count, format_distance, print_json, Status};
use crossroads_core::config::ModeName;
use crossroads_core::Error;
use crossroads_geo::{Resolver, RoadNode};
use owo_colors::OwoColorize;

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Latitude of the query position
    #[arg(allow_negative_numbers = true, required_unless_present = "list")]
    pub lat: Option<f64>,

    /// Longitude of the query position
    #[arg(allow_negative_numbers = true, required_unless_present = "list")]
    pub lng: Option<f64>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Grid resolution in degrees for merging segment endpoints
    #[arg(long)]
    pub snap: Option<f64>,

    /// List the graph's nodes instead of resolving a position
    #[arg(short, long)]
    pub list: bool,

    /// With --list, only show nodes where at least this many segment ends meet
    #[arg(long, default_value_t = 2)]
    pub min_endpoints: usize,
}

pub fn run(ctx: &Context, args: GraphArgs) -> Result<Outcome> {
    let mut schema = ctx.schema.clone();
    args.source.apply(&mut schema);
    schema.resolver.mode = ModeName::RoadGraph;
    if let Some(snap) = args.snap {
        schema.graph.snap_precision = snap;
    }

    let resolver = Resolver::new(schema.resolver_options()?);
    let features = load_features(&args.source.features)?;
    let graph = resolver.build_graph(&features);

    if args.list {
        let nodes: Vec<&RoadNode> = graph
            .nodes()
            .iter()
            .filter(|node| node.endpoints >= args.min_endpoints)
            .collect();
        list_nodes(ctx, &nodes)?;
        return Ok(Outcome::from_found(!nodes.is_empty()));
    }

    let (lat, lng) = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            let err = Error::invalid_input("A position is required unless --list is given");
            return Err(err.into());
        }
    };
    let query = query_point(lat, lng)?;
    let resolution = resolver.resolve_in_graph(&query, &graph);

    if ctx.format.is_json() {
        print_json(&resolution)?;
    } else {
        match &resolution {
            Some(r) => print_resolution(r),
            None => Status::warning(&format!(
                "No road-graph node within {} of {}",
                format_distance(resolver.options().radius_m),
                format_coordinate(query.latitude, query.longitude)
            )),
        }
    }

    Ok(Outcome::from_found(resolution.is_some()))
}

fn list_nodes(ctx: &Context, nodes: &[&RoadNode]) -> Result<()> {
    if ctx.format.is_json() {
        print_json(nodes)?;
        return Ok(());
    }

    Status::header(&format!("Road graph: {}", format_count(nodes.len(), "node", "nodes")));
    for node in nodes {
        println!(
            "  {}  {}  {}",
            format_coordinate(node.coordinate.latitude, node.coordinate.longitude).dimmed(),
            node.display_name(),
            format!("({} ends)", node.endpoints).dimmed()
        );
    }
    Ok(())
}
