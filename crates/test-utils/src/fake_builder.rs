use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use packrun::archive::runtime::strip_framing;
use packrun::archive::{ArtifactBuilder, BuildRequest};
use packrun::mount::MountSpec;
use tempfile::TempPath;

/// What a fake builder was asked to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub output: PathBuf,
    pub payload: String,
    pub image: Option<String>,
    pub mounts: Vec<MountSpec>,
}

/// An artifact builder that writes a placeholder file instead of a real
/// archive and records every request. Temp locations go under `dir`.
#[derive(Debug, Clone)]
pub struct RecordingBuilder {
    dir: PathBuf,
    fail: bool,
    builds: Arc<Mutex<Vec<BuildRecord>>>,
}

impl RecordingBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fail: false,
            builds: Arc::default(),
        }
    }

    /// A builder whose `build` always fails (after recording the request).
    pub fn failing(dir: impl Into<PathBuf>) -> Self {
        Self {
            fail: true,
            ..Self::new(dir)
        }
    }

    pub fn builds(&self) -> Vec<BuildRecord> {
        self.builds.lock().unwrap().clone()
    }

    /// Files currently present in the temp directory.
    pub fn residual_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

impl ArtifactBuilder for RecordingBuilder {
    fn scoped_temp_location(&self) -> Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix("fake-artifact-")
            .tempfile_in(&self.dir)
            .context("creating fake artifact location")?;
        Ok(file.into_temp_path())
    }

    fn build(&self, output: &Path, request: &BuildRequest<'_>) -> Result<PathBuf> {
        self.builds.lock().unwrap().push(BuildRecord {
            output: output.to_path_buf(),
            payload: request.payload.as_str().to_string(),
            image: request.image.map(|i| i.as_str().to_string()),
            mounts: request.mounts.to_vec(),
        });
        if self.fail {
            return Err(anyhow!("image not found"));
        }
        fs::write(output, "#!/bin/sh\n")?;
        Ok(output.to_path_buf())
    }

    fn strip_runtime_framing(&self, raw: &str) -> String {
        strip_framing(raw)
    }
}
