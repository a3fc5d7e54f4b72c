//! Configuration schema definitions
//!
//! Every section and field is optional in the file; missing values take the
//! library defaults.

use crate::error::{Error, Result};
use crossroads_geo::{
    ClassMapping, PolygonStrategy, Preference, ResolverMode, ResolverOptions, RoadGraphOptions,
};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// Nearest-feature resolution
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Road-graph synthesis
    #[serde(default)]
    pub graph: GraphConfig,

    /// Reverse-geocoding fallback
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Matching strategy named in the configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeName {
    /// Plain nearest feature
    #[default]
    Direct,
    /// Nearest feature matching `prefer_property = prefer_value`, else nearest
    Preferred,
    /// Nearest synthesized road-graph node
    RoadGraph,
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Maximum accepted distance in meters
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,

    /// Matching strategy
    #[serde(default)]
    pub mode: ModeName,

    /// Property inspected in `preferred` mode
    #[serde(default)]
    pub prefer_property: Option<String>,

    /// Value that marks a feature as preferred
    #[serde(default)]
    pub prefer_value: Option<String>,

    /// Extra name fields tried before the built-in fallbacks
    #[serde(default)]
    pub name_fields: Vec<String>,

    /// How polygons are matched
    #[serde(default)]
    pub polygon_strategy: PolygonStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            radius_m: default_radius_m(),
            mode: ModeName::default(),
            prefer_property: None,
            prefer_value: None,
            name_fields: Vec::new(),
            polygon_strategy: PolygonStrategy::default(),
        }
    }
}

fn default_radius_m() -> f64 {
    crossroads_geo::resolver::DEFAULT_RADIUS_M
}

/// Road-graph configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Grid resolution in degrees used to merge segment endpoints
    #[serde(default = "default_snap_precision")]
    pub snap_precision: f64,

    /// Property holding the road classification
    #[serde(default = "default_class_field")]
    pub class_field: String,

    /// Classification values treated as minor
    #[serde(default = "default_minor_classes")]
    pub minor_classes: Vec<String>,

    /// Classification values treated as major. Empty means every other value.
    #[serde(default)]
    pub major_classes: Vec<String>,

    /// Properties tried in order for a segment's street name
    #[serde(default = "default_graph_name_fields")]
    pub name_fields: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        let defaults = RoadGraphOptions::default();
        Self {
            snap_precision: defaults.snap_precision,
            class_field: defaults.class_field,
            minor_classes: defaults.classes.minor_values,
            major_classes: Vec::new(),
            name_fields: defaults.name_fields,
        }
    }
}

fn default_snap_precision() -> f64 {
    crossroads_geo::graph::DEFAULT_SNAP_PRECISION
}

fn default_class_field() -> String {
    RoadGraphOptions::default().class_field
}

fn default_minor_classes() -> Vec<String> {
    ClassMapping::default().minor_values
}

fn default_graph_name_fields() -> Vec<String> {
    RoadGraphOptions::default().name_fields
}

/// Reverse-geocoding fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocoderConfig {
    /// Query the geocoder when nothing is found within range
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of a Nominatim-compatible service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("crossroads/{}", env!("CARGO_PKG_VERSION"))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ConfigSchema {
    /// Check value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        let radius = self.resolver.radius_m;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::invalid_config(
                "resolver.radius_m",
                format!("must be a positive number of meters, got {}", radius),
            ));
        }

        if self.resolver.mode == ModeName::Preferred && self.preference().is_none() {
            return Err(Error::invalid_config(
                "resolver.mode",
                "`preferred` mode needs both `prefer_property` and `prefer_value`",
            )
            .with_suggestion("Set e.g. prefer_property = \"class\" and prefer_value = \"Major\""));
        }

        let precision = self.graph.snap_precision;
        if !precision.is_finite() || precision <= 0.0 {
            return Err(Error::invalid_config(
                "graph.snap_precision",
                format!("must be a positive number of degrees, got {}", precision),
            ));
        }

        if self.graph.class_field.trim().is_empty() {
            return Err(Error::invalid_config("graph.class_field", "must not be empty"));
        }

        if self.geocoder.enabled {
            if self.geocoder.base_url.trim().is_empty() {
                return Err(Error::invalid_config(
                    "geocoder.base_url",
                    "must be set when the geocoder is enabled",
                ));
            }
            if self.geocoder.timeout_secs == 0 {
                return Err(Error::invalid_config("geocoder.timeout_secs", "must be at least 1"));
            }
        }

        Ok(())
    }

    /// The configured preference, if both halves are present and non-blank.
    pub fn preference(&self) -> Option<Preference> {
        let property = self.resolver.prefer_property.as_deref()?.trim();
        let value = self.resolver.prefer_value.as_deref()?.trim();
        if property.is_empty() || value.is_empty() {
            return None;
        }
        Some(Preference::new(property, value))
    }

    /// Road-graph options described by the `[graph]` section.
    pub fn graph_options(&self) -> RoadGraphOptions {
        let major_values = if self.graph.major_classes.is_empty() {
            None
        } else {
            Some(self.graph.major_classes.clone())
        };

        RoadGraphOptions {
            name_fields: self.graph.name_fields.clone(),
            class_field: self.graph.class_field.clone(),
            classes: ClassMapping {
                minor_values: self.graph.minor_classes.clone(),
                major_values,
            },
            snap_precision: self.graph.snap_precision,
        }
    }

    /// Validate and convert to resolver options.
    pub fn resolver_options(&self) -> Result<ResolverOptions> {
        self.validate()?;

        let mode = match self.resolver.mode {
            ModeName::Direct => ResolverMode::Direct,
            ModeName::RoadGraph => ResolverMode::RoadGraph,
            ModeName::Preferred => match self.preference() {
                Some(preference) => ResolverMode::Preferred(preference),
                None => return Err(Error::invalid_config("resolver.mode", "missing preference")),
            },
        };

        Ok(ResolverOptions {
            radius_m: self.resolver.radius_m,
            mode,
            name_fields: self.resolver.name_fields.clone(),
            polygon_strategy: self.resolver.polygon_strategy,
            graph: self.graph_options(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_are_valid() {
        let schema = ConfigSchema::default();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.resolver.radius_m, 500.0);
        assert_eq!(schema.graph.snap_precision, 2e-4);
        assert!(!schema.geocoder.enabled);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [resolver]
            radius_m = 150.0
            mode = "road_graph"

            [graph]
            major_classes = ["Major", "Highway"]
            "#,
        )
        .unwrap();

        assert_eq!(schema.resolver.radius_m, 150.0);
        assert_eq!(schema.resolver.mode, ModeName::RoadGraph);
        assert_eq!(schema.graph.class_field, "class");
        assert_eq!(schema.graph.minor_classes, vec!["Minor", "Private", "Pedestrian"]);

        let options = schema.resolver_options().unwrap();
        assert_eq!(options.mode, ResolverMode::RoadGraph);
        assert_eq!(
            options.graph.classes.major_values,
            Some(vec!["Major".to_string(), "Highway".to_string()])
        );
    }

    #[test]
    fn test_preferred_mode_conversion() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [resolver]
            mode = "preferred"
            prefer_property = "class"
            prefer_value = "Major"
            polygon_strategy = "boundary"
            "#,
        )
        .unwrap();

        let options = schema.resolver_options().unwrap();
        assert_eq!(options.mode, ResolverMode::Preferred(Preference::new("class", "Major")));
        assert_eq!(options.polygon_strategy, PolygonStrategy::Boundary);
    }

    #[test]
    fn test_preferred_mode_requires_preference() {
        let mut schema = ConfigSchema::default();
        schema.resolver.mode = ModeName::Preferred;
        schema.resolver.prefer_property = Some("class".to_string());

        let err = schema.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
        assert!(err.message.contains("resolver.mode"));
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let mut schema = ConfigSchema::default();
        schema.resolver.radius_m = 0.0;
        assert!(schema.validate().is_err());

        schema.resolver.radius_m = f64::NAN;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_snap_precision() {
        let mut schema = ConfigSchema::default();
        schema.graph.snap_precision = -1e-4;
        let err = schema.validate().unwrap_err();
        assert!(err.message.contains("graph.snap_precision"));
    }

    #[test]
    fn test_enabled_geocoder_needs_url() {
        let mut schema = ConfigSchema::default();
        schema.geocoder.base_url = "  ".to_string();
        assert!(schema.validate().is_ok());

        schema.geocoder.enabled = true;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_blank_preference_is_none() {
        let mut schema = ConfigSchema::default();
        schema.resolver.prefer_property = Some("class".to_string());
        schema.resolver.prefer_value = Some("   ".to_string());
        assert!(schema.preference().is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: std::result::Result<ConfigSchema, _> = toml::from_str(
            r#"
            [resolver]
            mode = "closest"
            "#,
        );
        assert!(result.is_err());
    }

    fn mode_name() -> impl Strategy<Value = ModeName> {
        prop_oneof![
            Just(ModeName::Direct),
            Just(ModeName::Preferred),
            Just(ModeName::RoadGraph),
        ]
    }

    proptest! {
        #[test]
        fn prop_schema_survives_toml_round_trip(
            radius_m in 0.1f64..50_000.0,
            mode in mode_name(),
            prefer in proptest::option::of(("[a-z_]{1,12}", "[A-Za-z ]{1,12}")),
            snap_precision in 1e-6f64..1e-2,
            minor_classes in proptest::collection::vec("[A-Za-z]{1,10}", 0..4),
            timeout_secs in 1u64..600,
            level in prop_oneof![Just("warn"), Just("info"), Just("debug")],
            json in any::<bool>(),
        ) {
            let mut schema = ConfigSchema::default();
            schema.resolver.radius_m = radius_m;
            schema.resolver.mode = mode;
            if let Some((property, value)) = prefer {
                schema.resolver.prefer_property = Some(property);
                schema.resolver.prefer_value = Some(value);
            }
            schema.graph.snap_precision = snap_precision;
            schema.graph.minor_classes = minor_classes;
            schema.geocoder.timeout_secs = timeout_secs;
            schema.logging.level = level.to_string();
            schema.logging.json = json;

            let text = toml::to_string(&schema).unwrap();
            let parsed: ConfigSchema = toml::from_str(&text).unwrap();
            prop_assert_eq!(parsed, schema);
        }
    }
}
