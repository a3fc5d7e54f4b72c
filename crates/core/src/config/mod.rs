//! Configuration loading and schema definitions
//!
//! Settings live in `.crossroads.toml`; command-line flags override them.

mod loader;
mod schema;

pub use loader::{Config, CONFIG_CANDIDATES};
pub use schema::*;
