// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::errors::{PackrunError, Result};

/// A shell command (or multi-line script body) to package into an artifact.
///
/// Always non-empty once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand(String);

impl ShellCommand {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PackrunError::EmptyCommand);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the command spans more than one non-blank line.
    pub fn is_multiline(&self) -> bool {
        self.0.trim().lines().count() > 1
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShellCommand {
    type Err = PackrunError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Ordered per-invocation arguments for a batched launch.
///
/// Each entry produces one dispatch. `None` and `Some("")` both mean
/// "invoke the bare artifact".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ArgumentBatch(Vec<Option<String>>);

impl ArgumentBatch {
    pub fn new(entries: Vec<Option<String>>) -> Self {
        Self(entries)
    }

    /// `n` invocations without arguments.
    pub fn bare(n: usize) -> Self {
        Self(vec![None; n])
    }

    /// One invocation per argument string, in order.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(|a| Some(a.into())).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries with empty strings normalised to `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0
            .iter()
            .map(|entry| entry.as_deref().filter(|s| !s.is_empty()))
    }
}

impl Default for ArgumentBatch {
    fn default() -> Self {
        Self::bare(1)
    }
}

static IMAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    // [registry[:port]/]name[/name...][:tag][@sha256:digest]
    let component = r"[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*";
    let pattern = format!(
        r"^(?:[a-zA-Z0-9.-]+(?::[0-9]+)?/)?{component}(?:/{component})*(?::[A-Za-z0-9_][A-Za-z0-9_.-]{{0,127}})?(?:@sha256:[a-f0-9]{{64}})?$"
    );
    Regex::new(&pattern).expect("image reference pattern is valid")
});

/// Container image reference, e.g. `ubuntu:18.04` or `ghcr.io/org/tool:1.2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Result<Self> {
        let reference = reference.into();
        if !IMAGE_REF_RE.is_match(&reference) {
            return Err(PackrunError::InvalidImage(reference));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImageRef {
    type Err = PackrunError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ImageRef::new(raw).map_err(serde::de::Error::custom)
    }
}
