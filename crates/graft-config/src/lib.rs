//! Configuration management for graft
//!
//! Settings come from (lowest to highest priority) built-in defaults, a
//! config file, `GRAFT_*` environment variables and command-line overrides.

pub mod config;
pub mod logging;

pub use config::{
    config_file_name, ConfigOverrides, GraftConfig, LogFormat, LoggingConfig, LoggingOverrides,
};
