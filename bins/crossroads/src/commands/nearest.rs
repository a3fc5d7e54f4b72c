//! `crossroads nearest`: resolve the nearest named intersection

use super::{load_features, parse_preference, query_point, Context, Outcome, SourceArgs};
use crate::geocode::ReverseGeocoder;
use anyhow::Result;
use clap::Args;
use crossroads_cli::output::{format_coordinate, format_distance, print_json, Status};
use crossroads_cli::OutputFormat;
use crossroads_core::config::ModeName;
use crossroads_geo::{Coordinate, MatchSource, PolygonStrategy, Resolution, Resolver};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Args)]
pub struct NearestArgs {
    /// Latitude of the query position
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the query position
    #[arg(allow_negative_numbers = true)]
    pub lng: f64,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Prefer features whose PROPERTY equals VALUE, e.g. `class=Major`
    #[arg(long, value_name = "PROPERTY=VALUE")]
    pub prefer: Option<String>,

    /// Match polygons by their nearest boundary point instead of their first vertex
    #[arg(long)]
    pub boundary: bool,

    /// Ask the reverse geocoder when nothing is within range
    #[arg(long)]
    pub geocode: bool,
}

#[derive(Serialize)]
struct NearestOutput<'a> {
    query: Coordinate,
    radius_m: f64,
    resolution: Option<&'a Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geocoded: Option<&'a str>,
}

pub async fn run(ctx: &Context, args: NearestArgs) -> Result<Outcome> {
    let mut schema = ctx.schema.clone();
    args.source.apply(&mut schema);

    if let Some(raw) = &args.prefer {
        let (property, value) = parse_preference(raw)?;
        schema.resolver.mode = ModeName::Preferred;
        schema.resolver.prefer_property = Some(property);
        schema.resolver.prefer_value = Some(value);
    }
    if args.boundary {
        schema.resolver.polygon_strategy = PolygonStrategy::Boundary;
    }
    if args.geocode {
        schema.geocoder.enabled = true;
    }

    let options = schema.resolver_options()?;
    let radius_m = options.radius_m;
    let query = query_point(args.lat, args.lng)?;
    let features = load_features(&args.source.features)?;

    let resolution = Resolver::new(options).resolve(&query, &features);

    let geocoded = match (&resolution, schema.geocoder.enabled) {
        (None, true) => {
            let geocoder = ReverseGeocoder::new(&schema.geocoder)?;
            match geocoder.lookup(&query).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(error = %e.message, "Reverse geocoding failed");
                    if !ctx.format.is_json() {
                        Status::warning(&format!("Reverse geocoding failed: {}", e.message));
                    }
                    None
                }
            }
        }
        _ => None,
    };

    if ctx.format == OutputFormat::Json {
        print_json(&NearestOutput {
            query,
            radius_m,
            resolution: resolution.as_ref(),
            geocoded: geocoded.as_deref(),
        })?;
    } else {
        match (&resolution, &geocoded) {
            (Some(r), _) => print_resolution(r),
            (None, Some(name)) => {
                Status::info(&format!("No intersection within {}", format_distance(radius_m)));
                Status::success(name);
                Status::field("source", "reverse geocoder");
            }
            (None, None) => {
                Status::warning(&format!(
                    "No intersection within {} of {}",
                    format_distance(radius_m),
                    format_coordinate(query.latitude, query.longitude)
                ));
            }
        }
    }

    Ok(Outcome::from_found(resolution.is_some() || geocoded.is_some()))
}

/// Print a resolution as text
pub fn print_resolution(resolution: &Resolution) {
    Status::success(&resolution.name.bold().to_string());
    Status::field("distance", &format_distance(resolution.distance_m));
    Status::field(
        "point",
        &format_coordinate(resolution.point.latitude, resolution.point.longitude),
    );

    let source = match resolution.source {
        MatchSource::Feature { index } => format!("feature #{}", index),
        MatchSource::RoadNode { index, endpoints } => {
            format!("road node #{} ({} segment ends)", index, endpoints)
        }
    };
    Status::field("source", &source);

    if resolution.preferred {
        Status::field("preferred", "yes");
    }
}
