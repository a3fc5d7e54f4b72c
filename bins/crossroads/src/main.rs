//! Crossroads CLI - nearest named intersection lookup
//!
//! Resolves a position to the nearest named intersection in a GeoJSON street
//! dataset, either from intersection features directly or from a road graph
//! synthesized out of street segments.

use clap::{Parser, Subcommand};
use crossroads_cli::output::{report_error, Status};
use crossroads_cli::OutputFormat;
use crossroads_core::config::Config;
use crossroads_core::exit_codes;
use crossroads_telemetry::TelemetryConfig;
use std::process::ExitCode;

mod commands;
mod geocode;

use commands::{batch, distance, graph, nearest, Context, Outcome};

/// Find the nearest named intersection in a GeoJSON street dataset
#[derive(Parser)]
#[command(name = "crossroads")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (default: .crossroads.toml, crossroads.toml or .config/crossroads.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the nearest intersection feature to a position
    Nearest(nearest::NearestArgs),

    /// Resolve against the road graph built from street segments
    Graph(graph::GraphArgs),

    /// Resolve every position in a file
    Batch(batch::BatchArgs),

    /// Great-circle distance between two positions
    Distance(distance::DistanceArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e, cli.format);
            return exit_code(e.exit_code());
        }
    };

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig {
            json: config.schema.logging.json,
            ..TelemetryConfig::default().with_level(config.schema.logging.level.clone())
        }
    };
    if let Err(e) = crossroads_telemetry::init_with_config(telemetry) {
        Status::warning(&e.to_string());
    }

    let ctx = Context {
        schema: config.schema,
        format: cli.format,
    };

    let result = match cli.command {
        Commands::Nearest(args) => nearest::run(&ctx, args).await,
        Commands::Graph(args) => graph::run(&ctx, args),
        Commands::Batch(args) => batch::run(&ctx, args),
        Commands::Distance(args) => distance::run(&ctx, args),
    };

    match result {
        Ok(Outcome::Found) => ExitCode::SUCCESS,
        Ok(Outcome::NotFound) => exit_code(exit_codes::NOT_FOUND),
        Err(e) => match e.downcast_ref::<crossroads_core::Error>() {
            Some(err) => {
                report_error(err, ctx.format);
                exit_code(err.exit_code())
            }
            None => {
                Status::error(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        },
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
