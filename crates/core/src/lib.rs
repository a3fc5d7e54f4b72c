//! Core utilities for Crossroads tools
//!
//! This crate provides functionality shared by the command-line tools:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use crossroads_core::config::Config;
//!
//! let config = Config::load(None)?;
//! config.schema.validate()?;
//!
//! let options = config.schema.resolver_options()?;
//! println!("Search radius: {} m", options.radius_m);
//! # Ok::<(), crossroads_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{exit_codes, Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}
