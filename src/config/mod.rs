// src/config/mod.rs

//! Configuration loading and validation for packrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`), including the explicit
//!   option structures the launcher takes.
//! - Load a config file from disk (`loader.rs`).
//! - Validate mounts, script options and backend settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{BackendConfig, ConfigFile, LaunchOptions, RawConfigFile, ScriptOptions};
