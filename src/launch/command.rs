// src/launch/command.rs

use tracing::debug;

use super::Launcher;
use crate::archive::ArtifactBuilder;
use crate::config::LaunchOptions;
use crate::errors::{PackrunError, Result};
use crate::exec::{ExecutionBackend, Invocation};
use crate::types::{ArgumentBatch, ShellCommand};

impl<B: ArtifactBuilder> Launcher<B> {
    /// Package `command` and run it once.
    ///
    /// The command line is the artifact path, with `" -- " + cli_args`
    /// appended when `cli_args` is non-empty. Returns the payload's output
    /// (framing stripped) when `options.capture_output` is set.
    pub fn run_command(
        &self,
        command: &ShellCommand,
        cli_args: Option<&str>,
        backend: &dyn ExecutionBackend,
        options: &LaunchOptions,
    ) -> Result<Option<String>> {
        let (_location, artifact) = self.build_artifact(command, options)?;
        let invocation = Invocation::new(&artifact, cli_args).with_verbose(options.verbose);
        self.dispatch(0, &invocation, backend, options)
    }

    /// Package `command` once and run it once per `batch` entry, in order.
    ///
    /// Entries without arguments invoke the bare artifact; they never reuse a
    /// previous entry's arguments. The first failing dispatch aborts the
    /// batch.
    pub fn run_commands(
        &self,
        command: &ShellCommand,
        batch: &ArgumentBatch,
        backend: &dyn ExecutionBackend,
        options: &LaunchOptions,
    ) -> Result<Vec<Option<String>>> {
        if batch.is_empty() {
            return Err(PackrunError::EmptyBatch);
        }

        let (_location, artifact) = self.build_artifact(command, options)?;
        debug!(dispatches = batch.len(), "running batch");

        let mut results = Vec::with_capacity(batch.len());
        for (index, args) in batch.iter().enumerate() {
            let invocation = Invocation::new(&artifact, args).with_verbose(options.verbose);
            results.push(self.dispatch(index, &invocation, backend, options)?);
        }
        Ok(results)
    }
}
