// src/exec/local.rs

//! Run artifacts on this machine through `sh -c`.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::backend::{ExecutionBackend, Invocation, finish};

/// Executes invocations as local shell commands.
///
/// Standard error is always inherited. Standard output is piped and returned
/// when capturing, inherited otherwise.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    shell: String,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// Use a different POSIX shell (e.g. `bash`, `/bin/dash`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionBackend for LocalBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        let command_line = invocation.command_line();
        if invocation.verbose() {
            info!(cmd = %command_line, capture, "running artifact locally");
        } else {
            debug!(cmd = %command_line, capture, "running artifact locally");
        }

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(invocation.shell_line())
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());

        let (status, stdout) = if capture {
            let output = cmd
                .stdout(Stdio::piped())
                .output()
                .with_context(|| format!("spawning {} for `{command_line}`", self.shell))?;
            (output.status, Some(output.stdout))
        } else {
            let status = cmd
                .stdout(Stdio::inherit())
                .status()
                .with_context(|| format!("spawning {} for `{command_line}`", self.shell))?;
            (status, None)
        };

        debug!(cmd = %command_line, code = ?status.code(), "local process exited");
        finish(&command_line, status, stdout)
    }
}
