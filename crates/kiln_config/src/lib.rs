//! Parsing and validation of `kiln.toml` cache configuration.
//!
//! This crate reads the configuration file and produces strongly-typed
//! [`CacheOptions`] controlling key composition, parse-mode policy,
//! diagnostic phrasing, and the workspace dependency mode.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_options, load_options_from_str};
pub use types::*;
