// src/exec/backend.rs

//! Pluggable execution backend abstraction.
//!
//! The launcher hands every dispatch to an `ExecutionBackend` instead of
//! spawning processes itself. This makes it easy to swap in a fake backend in
//! tests while keeping the production implementations in [`super::local`],
//! [`super::ssh`] and [`super::dry_run`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::Result;
use thiserror::Error;

use crate::archive::runtime::shell_quote;

/// One run of a built artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    artifact: PathBuf,
    args: Option<String>,
    verbose: bool,
}

impl Invocation {
    /// `args` that are empty are treated as absent.
    pub fn new(artifact: impl Into<PathBuf>, args: Option<&str>) -> Self {
        Self {
            artifact: artifact.into(),
            args: args.filter(|a| !a.is_empty()).map(str::to_string),
            verbose: false,
        }
    }

    /// Ask the backend to report progress at `info` instead of `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn args(&self) -> Option<&str> {
        self.args.as_deref()
    }

    /// The artifact path, followed by `" -- " + args` when there are args.
    ///
    /// Meant for logs and error messages; see [`Invocation::shell_line`] for
    /// what a shell should run.
    pub fn command_line(&self) -> String {
        let artifact = self.artifact.to_string_lossy();
        match &self.args {
            Some(args) => format!("{artifact} -- {args}"),
            None => artifact.into_owned(),
        }
    }

    /// Like [`Invocation::command_line`] but with the artifact path quoted,
    /// so it survives `sh -c` whatever directory it lives in. The arguments
    /// stay unquoted and are split by the shell.
    pub fn shell_line(&self) -> String {
        let artifact = shell_quote(&self.artifact.to_string_lossy());
        match &self.args {
            Some(args) => format!("{artifact} -- {args}"),
            None => artifact,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Trait abstracting where an artifact runs.
///
/// Implementations block until the invocation finishes. When `capture` is
/// true they return the raw standard output (framing included); otherwise
/// `None`.
pub trait ExecutionBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>>;
}

impl<T: ExecutionBackend + ?Sized> ExecutionBackend for Box<T> {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        (**self).execute(invocation, capture)
    }
}

/// A process finished with a non-zero exit status.
#[derive(Error, Debug)]
#[error("`{command}` exited with {}", describe_code(.code))]
pub struct ExitStatusError {
    pub command: String,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Turn a finished process into the backend result shape.
pub(crate) fn finish(
    command: &str,
    status: ExitStatus,
    stdout: Option<Vec<u8>>,
) -> Result<Option<String>> {
    if !status.success() {
        return Err(ExitStatusError {
            command: command.to_string(),
            code: status.code(),
        }
        .into());
    }
    Ok(stdout.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}
