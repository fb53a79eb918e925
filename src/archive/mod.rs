// src/archive/mod.rs

//! Artifact packaging.
//!
//! The launcher never looks inside an artifact. It talks to an
//! [`ArtifactBuilder`], which knows how to:
//! - hand out a scoped temporary location for the artifact,
//! - build a runnable artifact at that location from a payload command,
//!   an optional container image and a set of mounts,
//! - strip the framing its own runtime wrapper adds around captured output.
//!
//! - [`builder`] provides [`ShellArchiveBuilder`], a self-extracting POSIX
//!   shell archive.
//! - [`runtime`] renders the wrapper script and owns the framing markers.

pub mod builder;
pub mod runtime;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempPath;

use crate::mount::MountSpec;
use crate::types::{ImageRef, ShellCommand};

pub use builder::ShellArchiveBuilder;

/// Everything needed to build one artifact.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub payload: &'a ShellCommand,
    pub image: Option<&'a ImageRef>,
    pub mounts: &'a [MountSpec],
    pub verbose: bool,
}

/// Trait abstracting how artifacts are produced.
///
/// Production code uses [`ShellArchiveBuilder`]; tests can provide their own
/// implementation that records build requests without packaging anything.
pub trait ArtifactBuilder {
    /// A unique path that is deleted when the returned guard drops.
    fn scoped_temp_location(&self) -> Result<TempPath>;

    /// Build a runnable artifact at `output` and return its path.
    fn build(&self, output: &Path, request: &BuildRequest<'_>) -> Result<PathBuf>;

    /// Remove wrapper-added framing from captured standard output.
    fn strip_runtime_framing(&self, raw: &str) -> String;
}
