use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use packrun::archive::runtime::{OUTPUT_BEGIN, OUTPUT_END};
use packrun::exec::{ExecutionBackend, Invocation};

/// What a fake backend saw for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub command_line: String,
    pub artifact: PathBuf,
    /// Whether the artifact file existed while the dispatch ran.
    pub artifact_existed: bool,
    pub capture: bool,
    pub verbose: bool,
}

impl DispatchRecord {
    fn from_invocation(invocation: &Invocation, capture: bool) -> Self {
        Self {
            command_line: invocation.command_line(),
            artifact: invocation.artifact().to_path_buf(),
            artifact_existed: invocation.artifact().exists(),
            capture,
            verbose: invocation.verbose(),
        }
    }
}

/// A fake backend that:
/// - records every dispatch
/// - when capturing, "echoes" the invocation's arguments wrapped in the same
///   framing markers the real archive wrapper prints.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    dispatched: Arc<Mutex<Vec<DispatchRecord>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.dispatched()
            .into_iter()
            .map(|d| d.command_line)
            .collect()
    }
}

impl ExecutionBackend for RecordingBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        self.dispatched
            .lock()
            .unwrap()
            .push(DispatchRecord::from_invocation(invocation, capture));

        Ok(capture.then(|| {
            format!(
                "{OUTPUT_BEGIN}\n{}\n{OUTPUT_END}\n",
                invocation.args().unwrap_or_default()
            )
        }))
    }
}

/// A fake backend that fails on the dispatch with index `fail_at` (0-based)
/// and succeeds before it. Every attempted dispatch is recorded.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend {
    fail_at: usize,
    dispatched: Arc<Mutex<Vec<DispatchRecord>>>,
}

impl FailingBackend {
    /// Fails every dispatch.
    pub fn always() -> Self {
        Self::at(0)
    }

    pub fn at(fail_at: usize) -> Self {
        Self {
            fail_at,
            dispatched: Arc::default(),
        }
    }

    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl ExecutionBackend for FailingBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        let mut dispatched = self.dispatched.lock().unwrap();
        dispatched.push(DispatchRecord::from_invocation(invocation, capture));
        if dispatched.len() > self.fail_at {
            return Err(anyhow!("backend unavailable"));
        }
        Ok(capture.then(String::new))
    }
}
