//! Parsing and validation of `tessel.toml` mapping configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`TesselConfig`] holding the annealing schedule for placement and the
//! negotiated-congestion parameters for routing. Every field has a default,
//! so an empty file (or no file at all, via [`TesselConfig::default`]) is a
//! valid configuration.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
