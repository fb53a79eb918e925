// src/launch/mod.rs

//! Orchestration layer.
//!
//! A [`Launcher`] turns one high-level request (a command, optional argument
//! sets, mounts, capture flag) into exactly one artifact build followed by
//! one or more sequential backend dispatches that reuse that artifact.
//!
//! - [`command`] holds `run_command` / `run_commands`.
//! - [`script`] holds `run_script` and the interpreter command helper.
//!
//! The temporary artifact lives in a `tempfile::TempPath` owned by the call;
//! dropping it deletes the file, so cleanup happens on every exit path.

pub mod command;
pub mod script;

use std::path::PathBuf;

use tempfile::TempPath;
use tracing::{debug, info};

use crate::archive::{ArtifactBuilder, BuildRequest};
use crate::config::LaunchOptions;
use crate::errors::{PackrunError, Result};
use crate::exec::{ExecutionBackend, Invocation};
use crate::types::ShellCommand;

pub use script::{ScriptMount, derive_script_mount, make_interpreter_command};

/// Result shape of [`Launcher::run_script`], which may dispatch once or many
/// times depending on `run_multiple`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutput {
    Single(Option<String>),
    Multiple(Vec<Option<String>>),
}

impl LaunchOutput {
    /// Flatten into one entry per dispatch.
    pub fn into_vec(self) -> Vec<Option<String>> {
        match self {
            LaunchOutput::Single(out) => vec![out],
            LaunchOutput::Multiple(outs) => outs,
        }
    }
}

/// Packages commands with an [`ArtifactBuilder`] and dispatches them to an
/// [`ExecutionBackend`] supplied per call.
#[derive(Debug, Clone, Default)]
pub struct Launcher<B> {
    builder: B,
}

impl<B: ArtifactBuilder> Launcher<B> {
    pub fn new(builder: B) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Acquire a scoped location and build one artifact into it.
    ///
    /// The returned guard must outlive every dispatch of the artifact.
    fn build_artifact(
        &self,
        command: &ShellCommand,
        options: &LaunchOptions,
    ) -> Result<(TempPath, PathBuf)> {
        let location = self
            .builder
            .scoped_temp_location()
            .map_err(|source| PackrunError::Build { source })?;

        let request = BuildRequest {
            payload: command,
            image: options.image.as_ref(),
            mounts: &options.mounts,
            verbose: options.verbose,
        };
        let artifact = self
            .builder
            .build(&location, &request)
            .map_err(|source| PackrunError::Build { source })?;

        if options.verbose {
            info!(artifact = ?artifact, cmd = %command, mounts = options.mounts.len(), "artifact ready");
        } else {
            debug!(artifact = ?artifact, cmd = %command, mounts = options.mounts.len(), "artifact ready");
        }
        Ok((location, artifact))
    }

    fn dispatch(
        &self,
        index: usize,
        invocation: &Invocation,
        backend: &dyn ExecutionBackend,
        options: &LaunchOptions,
    ) -> Result<Option<String>> {
        if options.verbose {
            info!(index, cmd = %invocation, "dispatching");
        } else {
            debug!(index, cmd = %invocation, "dispatching");
        }

        let raw = backend
            .execute(invocation, options.capture_output)
            .map_err(|source| PackrunError::Dispatch {
                index,
                command_line: invocation.command_line(),
                source,
            })?;

        Ok(if options.capture_output {
            Some(
                self.builder
                    .strip_runtime_framing(raw.as_deref().unwrap_or_default()),
            )
        } else {
            None
        })
    }
}
