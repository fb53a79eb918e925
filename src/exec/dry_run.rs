// src/exec/dry_run.rs

use std::io::Write;
use std::sync::Mutex;

use anyhow::Result;
use tracing::info;

use super::backend::{ExecutionBackend, Invocation};

/// Prints command lines instead of running them.
///
/// Captured output is always empty. Every printed line is also kept so
/// callers can inspect what would have run.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    printed: Mutex<Vec<String>>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.printed
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl ExecutionBackend for DryRunBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        let command_line = invocation.command_line();
        info!(cmd = %command_line, "dry-run: not executing");

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "would run: {command_line}")?;

        if let Ok(mut printed) = self.printed.lock() {
            printed.push(command_line);
        }
        Ok(capture.then(String::new))
    }
}
