//! CLI command implementations

pub mod batch;
pub mod distance;
pub mod graph;
pub mod nearest;

use clap::Args;
use crossroads_cli::OutputFormat;
use crossroads_core::config::ConfigSchema;
use crossroads_core::{Error, Result, ResultExt};
use crossroads_geo::{Coordinate, Feature, FeatureCollection, GeoError};
use crossroads_telemetry::Timer;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings shared by every command
pub struct Context {
    /// Settings from the configuration file
    pub schema: ConfigSchema,
    /// Selected output format
    pub format: OutputFormat,
}

/// Whether a command found what it was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotFound,
}

impl Outcome {
    pub fn from_found(found: bool) -> Self {
        if found { Outcome::Found } else { Outcome::NotFound }
    }
}

/// Feature source and search radius, shared by the resolving commands
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// GeoJSON file: a FeatureCollection, an array of Features, or one Feature
    #[arg(short = 'i', long = "features", value_name = "FILE")]
    pub features: PathBuf,

    /// Search radius in meters (overrides `resolver.radius_m`)
    #[arg(short, long)]
    pub radius: Option<f64>,
}

impl SourceArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, schema: &mut ConfigSchema) {
        if let Some(radius) = self.radius {
            schema.resolver.radius_m = radius;
        }
    }
}

/// Validate a query position given on the command line.
pub fn query_point(latitude: f64, longitude: f64) -> Result<Coordinate> {
    let point = Coordinate::new(latitude, longitude);
    if !point.is_valid() {
        return Err(GeoError::InvalidCoordinate(format!(
            "({}, {}) is outside the valid range",
            latitude, longitude
        ))
        .into());
    }
    Ok(point)
}

/// Parse `PROPERTY=VALUE`.
pub fn parse_preference(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((property, value)) if !property.trim().is_empty() && !value.trim().is_empty() => {
            Ok((property.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(Error::invalid_input(format!("Invalid preference `{}`", raw))
            .with_suggestion("Use PROPERTY=VALUE, e.g. --prefer class=Major")),
    }
}

/// Read and parse a GeoJSON file.
pub fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let _timer = Timer::start("load_features");

    if !path.is_file() {
        return Err(Error::file_not_found(path));
    }

    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading {}", path.display()))?;

    let collection = FeatureCollection::from_json_str(&content)
        .map_err(Error::from)
        .context(format!("Parsing {}", path.display()))?;

    debug!(path = %path.display(), features = collection.len(), "Features loaded");
    Ok(collection.into_features())
}
