// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Collaborators (artifact builders, execution backends) report failures as
//! `anyhow::Error`. The launcher wraps those in [`PackrunError::Build`] or
//! [`PackrunError::Dispatch`] so callers can tell which step failed, while the
//! original error stays reachable through `source()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackrunError {
    #[error("command must not be empty")]
    EmptyCommand,

    #[error("argument batch must contain at least one entry")]
    EmptyBatch,

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid script target: {0:?}")]
    InvalidTarget(PathBuf),

    #[error("invalid mount: {0}")]
    InvalidMount(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(String),

    #[error("failed to build artifact")]
    Build {
        #[source]
        source: anyhow::Error,
    },

    #[error("dispatch #{index} failed: {command_line}")]
    Dispatch {
        index: usize,
        command_line: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PackrunError>;
