//! Application glue module
//!
//! Configuration loading and boot option parsing.

mod config;

pub use config::{Config, ConfigError};
