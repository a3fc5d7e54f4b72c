//! `crossroads distance`: great-circle distance between two positions

use super::{query_point, Context, Outcome};
use anyhow::Result;
use clap::Args;
use crossroads_cli::output::{format_distance, print_json};
use crossroads_geo::{haversine_distance_meters, Coordinate};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Latitude of the first position
    #[arg(allow_negative_numbers = true)]
    pub lat1: f64,

    /// Longitude of the first position
    #[arg(allow_negative_numbers = true)]
    pub lng1: f64,

    /// Latitude of the second position
    #[arg(allow_negative_numbers = true)]
    pub lat2: f64,

    /// Longitude of the second position
    #[arg(allow_negative_numbers = true)]
    pub lng2: f64,
}

#[derive(Serialize)]
struct DistanceOutput {
    from: Coordinate,
    to: Coordinate,
    meters: f64,
}

pub fn run(ctx: &Context, args: DistanceArgs) -> Result<Outcome> {
    let from = query_point(args.lat1, args.lng1)?;
    let to = query_point(args.lat2, args.lng2)?;
    let meters = haversine_distance_meters(&from, &to);

    if ctx.format.is_json() {
        print_json(&DistanceOutput { from, to, meters })?;
    } else {
        println!("{}", format_distance(meters));
    }

    Ok(Outcome::Found)
}
