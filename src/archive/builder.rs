// src/archive/builder.rs

//! Self-extracting shell archive builder.
//!
//! Layout of a built artifact:
//!
//! ```text
//! #!/bin/sh
//! ...wrapper script (see `runtime`)...
//! __PACKRUN_PAYLOAD__
//! <base64 of a gzip'd tar>
//! ```
//!
//! and of the embedded tar:
//!
//! ```text
//! .packrun/payload.sh      the command
//! root/<mount_point>/...   relative mounts
//! abs/<index>/...          absolute mounts (container runs only)
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempPath;
use tracing::{debug, info};

use super::runtime::{self, ABS_DIR, AbsoluteMount, CONTROL_DIR, ROOT_DIR};
use super::{ArtifactBuilder, BuildRequest};
use crate::mount::MountSpec;
use crate::types::ShellCommand;

const BASE64_LINE_WIDTH: usize = 76;

/// Builds artifacts as self-extracting POSIX shell archives.
#[derive(Debug, Clone, Default)]
pub struct ShellArchiveBuilder {
    temp_dir: Option<PathBuf>,
}

impl ShellArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place temporary artifacts under `dir` instead of the system temp dir.
    pub fn with_temp_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }
}

impl ArtifactBuilder for ShellArchiveBuilder {
    fn scoped_temp_location(&self) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("packrun-").suffix(".sh");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("creating temporary artifact location")?;
        Ok(file.into_temp_path())
    }

    fn build(&self, output: &Path, request: &BuildRequest<'_>) -> Result<PathBuf> {
        validate_request(request)?;

        let absolute_mounts: Vec<AbsoluteMount<'_>> = request
            .mounts
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_absolute())
            .map(|(index, m)| AbsoluteMount {
                index,
                mount_point: m.mount_point.as_path(),
            })
            .collect();

        let tarball = build_payload_tarball(request.payload, request.mounts)?;
        let mut contents =
            runtime::render_wrapper(request.image, &absolute_mounts, request.verbose);
        let encoded = BASE64.encode(&tarball);
        for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
            // base64 output is ASCII, so every chunk is valid UTF-8.
            contents.push_str(&String::from_utf8_lossy(chunk));
            contents.push('\n');
        }

        fs::write(output, &contents)
            .with_context(|| format!("writing artifact to {:?}", output))?;
        make_executable(output)?;

        let digest = blake3::hash(contents.as_bytes()).to_hex();
        if request.verbose {
            info!(artifact = ?output, bytes = contents.len(), %digest, "built artifact");
        } else {
            debug!(artifact = ?output, bytes = contents.len(), %digest, "built artifact");
        }

        Ok(output.to_path_buf())
    }

    fn strip_runtime_framing(&self, raw: &str) -> String {
        runtime::strip_framing(raw)
    }
}

fn validate_request(request: &BuildRequest<'_>) -> Result<()> {
    let mut seen = HashSet::new();
    for mount in request.mounts {
        mount.validate_shape()?;
        if !mount.local_dir.is_dir() {
            bail!(
                "mount source {:?} does not exist or is not a directory",
                mount.local_dir
            );
        }
        if mount.is_absolute() && request.image.is_none() {
            bail!(
                "absolute mount point {:?} requires a container image",
                mount.mount_point
            );
        }
        if !seen.insert(mount.normalized_mount_point()) {
            bail!("duplicate mount point {:?}", mount.mount_point);
        }
    }
    Ok(())
}

/// Words that open or continue a compound command. A line starting with
/// one of these cannot take extra words at its end.
const RESERVED_WORDS: &[&str] = &[
    "!", "{", "}", "(", "[[", "case", "do", "done", "elif", "else", "esac", "fi", "for",
    "function", "if", "in", "then", "until", "while", "select",
];

/// Script executed by the wrapper.
///
/// A simple command (one line, no control operators, no compound syntax)
/// gets the invocation's arguments appended. Anything else is written as a
/// script body and sees the arguments as `$1`, `$2`, ...
fn payload_script(command: &ShellCommand) -> String {
    let text = command.as_str();
    if is_simple_command(text) {
        format!("{} \"$@\"\n", text.trim())
    } else {
        format!("{}\n", text.trim_end())
    }
}

/// Conservative: operator characters inside quotes also count, which only
/// means the arguments are passed positionally instead of appended.
fn is_simple_command(text: &str) -> bool {
    let text = text.trim();
    if text.contains('\n') {
        return false;
    }
    if text.starts_with(['{', '(']) {
        return false;
    }
    let first_word = text.split_whitespace().next().unwrap_or_default();
    if RESERVED_WORDS.contains(&first_word) {
        return false;
    }
    if text.contains([';', '&', '|']) {
        return false;
    }
    // A trailing comment would swallow the appended arguments.
    !(text.starts_with('#') || text.contains(" #") || text.contains("\t#"))
}

fn build_payload_tarball(command: &ShellCommand, mounts: &[MountSpec]) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.follow_symlinks(true);

    let mut dirs: HashSet<PathBuf> = HashSet::new();
    for dir in [CONTROL_DIR, ROOT_DIR] {
        append_dir(&mut tar, Path::new(dir))?;
        dirs.insert(PathBuf::from(dir));
    }
    let script = payload_script(command);
    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    header.set_mtime(0);
    header.set_cksum();
    tar.append_data(
        &mut header,
        Path::new(CONTROL_DIR).join("payload.sh"),
        script.as_bytes(),
    )
    .context("adding payload script to archive")?;

    for (index, mount) in mounts.iter().enumerate() {
        let base = if mount.is_absolute() {
            Path::new(ABS_DIR).join(index.to_string())
        } else {
            Path::new(ROOT_DIR).join(mount.normalized_mount_point())
        };

        let mut dir = PathBuf::new();
        for component in base.components() {
            dir.push(component);
            if dirs.insert(dir.clone()) {
                append_dir(&mut tar, &dir)?;
            }
        }

        let files = mount
            .collect_files()
            .with_context(|| format!("collecting files for mount {mount}"))?;
        debug!(mount = %mount, files = files.len(), "packing mount");
        for (abs, rel) in files {
            tar.append_path_with_name(&abs, base.join(&rel))
                .with_context(|| format!("adding {:?} to archive", abs))?;
        }
    }

    let encoder = tar.into_inner().context("finishing tar stream")?;
    let bytes = encoder.finish().context("finishing gzip stream")?;
    Ok(bytes)
}

fn append_dir<W: io::Write>(tar: &mut tar::Builder<W>, path: &Path) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_mtime(0);
    header.set_cksum();
    tar.append_data(&mut header, path, io::empty())
        .with_context(|| format!("adding directory {:?} to archive", path))?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("marking {:?} executable", path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
