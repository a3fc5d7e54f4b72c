//! Terminal helpers for Crossroads tools
//!
//! Provides shared CLI functionality:
//! - Text and JSON output
//! - Progress indicators for batch runs
//! - Status messages

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{OutputFormat, Status};
