//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names searched, in order, when no path is given
pub const CONFIG_CANDIDATES: [&str; 3] = [
    ".crossroads.toml",
    "crossroads.toml",
    ".config/crossroads.toml",
];

/// Loaded configuration and where it came from
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed settings
    pub schema: ConfigSchema,
    /// File the settings were read from, `None` for built-in defaults
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or the standard locations,
    /// falling back to defaults when no file exists.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_from(path.map(PathBuf::from), Path::new("."))
    }

    /// Like [`Config::load`], searching the standard locations under `root`.
    pub fn load_from(path: Option<PathBuf>, root: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(&p)),
            Some(p) => Some(p),
            None => find_config_file(root),
        };

        let schema = match &config_path {
            Some(p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        debug!(path = ?config_path, "Configuration loaded");

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

/// Find configuration file in standard locations
fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|candidate| candidate.is_file())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("Failed to read config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })
}
