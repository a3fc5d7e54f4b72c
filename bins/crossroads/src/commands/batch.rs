//! `crossroads batch`: resolve every position in a file

use super::{load_features, parse_preference, query_point, Context, Outcome, SourceArgs};
use anyhow::Result;
use clap::Args;
use crossroads_cli::output::{
    format_count, format_distance, format_duration, print_json, Status,
};
use crossroads_cli::progress;
use crossroads_core::config::ModeName;
use crossroads_core::{Error, ResultExt};
use crossroads_geo::{batch::count_resolved, resolve_batch_with, Coordinate, Resolver};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// File with one `lat,lng` position per line; blank lines and `#` comments
    /// are ignored
    #[arg(short, long, value_name = "FILE")]
    pub positions: std::path::PathBuf,

    /// Resolve against the synthesized road graph
    #[arg(long, conflicts_with = "prefer")]
    pub road_graph: bool,

    /// Prefer features whose PROPERTY equals VALUE, e.g. `class=Major`
    #[arg(long, value_name = "PROPERTY=VALUE")]
    pub prefer: Option<String>,
}

pub fn run(ctx: &Context, args: BatchArgs) -> Result<Outcome> {
    let mut schema = ctx.schema.clone();
    args.source.apply(&mut schema);

    if args.road_graph {
        schema.resolver.mode = ModeName::RoadGraph;
    } else if let Some(raw) = &args.prefer {
        let (property, value) = parse_preference(raw)?;
        schema.resolver.mode = ModeName::Preferred;
        schema.resolver.prefer_property = Some(property);
        schema.resolver.prefer_value = Some(value);
    }

    let resolver = Resolver::new(schema.resolver_options()?);
    let queries = read_positions(&args.positions)?;
    let show_progress = !ctx.format.is_json();

    let loading = show_progress.then(|| progress::spinner("Loading features..."));
    let features = match load_features(&args.source.features) {
        Ok(features) => features,
        Err(e) => {
            if let Some(pb) = &loading {
                progress::finish_error(pb, "Could not load features");
            }
            return Err(e.into());
        }
    };
    if let Some(pb) = &loading {
        let loaded = format_count(features.len(), "feature", "features");
        progress::finish_success(pb, &format!("Loaded {}", loaded));
    }

    let start = Instant::now();
    let bar = show_progress.then(|| progress::positions_progress(queries.len() as u64));

    let results = resolve_batch_with(&resolver, &queries, &features, |_| {
        if let Some(pb) = &bar {
            pb.inc(1);
        }
    });
    let resolved = count_resolved(&results);

    if let Some(pb) = &bar {
        let summary = format!(
            "Resolved {} of {} in {}",
            resolved,
            format_count(results.len(), "position", "positions"),
            format_duration(start.elapsed())
        );
        if resolved > 0 {
            progress::finish_success(pb, &summary);
        } else {
            progress::finish_error(pb, &summary);
        }
    }

    if ctx.format.is_json() {
        print_json(&results)?;
    } else {
        for result in &results {
            let position = format!("{:.6}, {:.6}", result.query.latitude, result.query.longitude);
            match &result.resolution {
                Some(r) => println!(
                    "  {}  {}  {}",
                    position.dimmed(),
                    r.name,
                    format!("({})", format_distance(r.distance_m)).dimmed()
                ),
                None => println!("  {}  {}", position.dimmed(), "no match".yellow()),
            }
        }
        if results.is_empty() {
            Status::warning("No positions to resolve");
        }
    }

    Ok(Outcome::from_found(resolved > 0))
}

/// Read a positions file.
fn read_positions(path: &Path) -> crossroads_core::Result<Vec<Coordinate>> {
    if !path.is_file() {
        return Err(Error::file_not_found(path));
    }
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading {}", path.display()))?;

    parse_positions(&content).context(format!("Parsing {}", path.display()))
}

/// Parse `lat,lng` lines. Blank lines and lines starting with `#` are skipped.
fn parse_positions(content: &str) -> crossroads_core::Result<Vec<Coordinate>> {
    let mut positions = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = line.split_once(',').and_then(|(lat, lng)| {
            Some((lat.trim().parse::<f64>().ok()?, lng.trim().parse::<f64>().ok()?))
        });

        let (lat, lng) = parsed.ok_or_else(|| {
            Error::invalid_input(format!(
                "Line {}: expected `lat,lng`, got `{}`",
                number + 1,
                line
            ))
        })?;
        positions.push(query_point(lat, lng).context(format!("Line {}", number + 1))?);
    }

    Ok(positions)
}
