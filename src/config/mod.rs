// src/config/mod.rs

//! Configuration loading and validation for checkrun.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a config file from disk.
//! - [`validate`] checks names, references and benchmark nesting before a
//!   `ConfigFile` can be constructed.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    BenchmarkConfig, ConfigFile, ConfigSection, ControlConfig, DashboardConfig, PanelConfig,
    RawConfigFile,
};
