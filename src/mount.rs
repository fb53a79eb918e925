// src/mount.rs

//! Local directories bound into the artifact's file tree.
//!
//! A [`MountSpec`] says "make the contents of `local_dir` visible at
//! `mount_point` when the artifact runs". Relative mount points are resolved
//! against the artifact's working directory; absolute ones only make sense
//! inside a container and are rejected by the builder otherwise.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::errors::PackrunError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountSpec {
    /// Directory on the launching machine.
    pub local_dir: PathBuf,

    /// Where the directory appears at run time.
    pub mount_point: PathBuf,

    /// Glob patterns (relative to `local_dir`) left out of the artifact.
    #[serde(default, rename = "exclude")]
    pub excludes: Vec<String>,
}

impl MountSpec {
    pub fn new(local_dir: impl Into<PathBuf>, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
            mount_point: mount_point.into(),
            excludes: Vec::new(),
        }
    }

    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn is_absolute(&self) -> bool {
        self.mount_point.is_absolute()
    }

    /// Check the mount point is usable as a path inside the artifact.
    ///
    /// Does not touch the filesystem.
    pub fn validate_shape(&self) -> crate::errors::Result<()> {
        if self.mount_point.as_os_str().is_empty() {
            return Err(PackrunError::InvalidMount(format!(
                "mount point for {:?} is empty",
                self.local_dir
            )));
        }
        let escapes = self
            .mount_point
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(PackrunError::InvalidMount(format!(
                "mount point {:?} must not contain '..'",
                self.mount_point
            )));
        }
        Ok(())
    }

    /// Mount point with `.` components and trailing separators removed, so
    /// `target/./proj/` and `target/proj` compare equal.
    pub fn normalized_mount_point(&self) -> PathBuf {
        self.mount_point
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    fn exclude_set(&self) -> Result<Option<GlobSet>> {
        if self.excludes.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pat in &self.excludes {
            let glob = Glob::new(pat).with_context(|| format!("invalid exclude pattern: {pat}"))?;
            builder.add(glob);
        }
        Ok(Some(builder.build()?))
    }

    /// Walk `local_dir` and return `(absolute, relative)` paths of every
    /// file that survives the exclude patterns. Excluded directories are
    /// pruned whole.
    pub fn collect_files(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let exclude = self.exclude_set()?;
        let root = self.local_dir.as_path();
        let is_excluded = |path: &Path| -> bool {
            match (&exclude, path.strip_prefix(root)) {
                (Some(set), Ok(rel)) if !rel.as_os_str().is_empty() => {
                    set.is_match(rel.to_string_lossy().replace('\\', "/"))
                }
                _ => false,
            }
        };

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry.path()));

        for entry in walker {
            let entry = entry.with_context(|| format!("walking mount {:?}", root))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("{:?} is outside mount {:?}", entry.path(), root))?
                .to_path_buf();
            files.push((entry.path().to_path_buf(), rel));
        }

        Ok(files)
    }
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.local_dir.display(),
            self.mount_point.display()
        )
    }
}

impl std::str::FromStr for MountSpec {
    type Err = PackrunError;

    /// Parse `LOCAL_DIR:MOUNT_POINT`, splitting on the last `:`.
    fn from_str(s: &str) -> crate::errors::Result<Self> {
        match s.rsplit_once(':') {
            Some((local, point)) if !local.is_empty() && !point.is_empty() => {
                Ok(MountSpec::new(local, point))
            }
            _ => Err(PackrunError::InvalidMount(format!(
                "expected LOCAL_DIR:MOUNT_POINT, got {s:?}"
            ))),
        }
    }
}
