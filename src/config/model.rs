// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::mount::MountSpec;
use crate::types::{ArgumentBatch, ImageRef};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [launch]
/// capture_output = true
/// image = "python:3"
///
/// [[launch.mounts]]
/// local_dir = "data"
/// mount_point = "data"
/// exclude = ["*.pyc"]
///
/// [script]
/// interpreter = "python3"
///
/// [backend]
/// kind = "ssh"
/// host = "build-box"
/// ```
///
/// All sections are optional. Unknown keys anywhere are an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub launch: LaunchOptions,

    #[serde(default)]
    pub script: ScriptOptions,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl RawConfigFile {
    /// Resolve relative mount sources against `base` (the config file's
    /// directory).
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        for mount in &mut self.launch.mounts {
            if mount.local_dir.is_relative() {
                mount.local_dir = base.join(&mount.local_dir);
            }
        }
        self
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    launch: LaunchOptions,
    script: ScriptOptions,
    backend: BackendConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        launch: LaunchOptions,
        script: ScriptOptions,
        backend: BackendConfig,
    ) -> Self {
        Self {
            launch,
            script,
            backend,
        }
    }

    pub fn launch(&self) -> &LaunchOptions {
        &self.launch
    }

    pub fn script(&self) -> &ScriptOptions {
        &self.script
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn into_parts(self) -> (LaunchOptions, ScriptOptions, BackendConfig) {
        (self.launch, self.script, self.backend)
    }
}

/// Options shared by every launcher entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchOptions {
    /// Return the payload's standard output instead of letting it through.
    #[serde(default)]
    pub capture_output: bool,

    /// Run the payload inside this container image. `None` runs it directly
    /// on whatever machine the backend targets.
    #[serde(default)]
    pub image: Option<ImageRef>,

    #[serde(default)]
    pub mounts: Vec<MountSpec>,

    /// Log builds and dispatches at `info` and make the artifact report its
    /// own progress on stderr.
    #[serde(default)]
    pub verbose: bool,
}

/// Options specific to [`crate::launch::Launcher::run_script`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptOptions {
    /// Prefix under which the script's directory is mounted.
    #[serde(default = "default_target_mount_dir")]
    pub target_mount_dir: PathBuf,

    /// Program that runs the script, e.g. `python` or `bash`.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Dispatch once per `cli_args` entry (batched) instead of exactly once.
    #[serde(default = "default_run_multiple")]
    pub run_multiple: bool,

    #[serde(default)]
    pub cli_args: ArgumentBatch,
}

fn default_target_mount_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_run_multiple() -> bool {
    true
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            target_mount_dir: default_target_mount_dir(),
            interpreter: default_interpreter(),
            run_multiple: default_run_multiple(),
            cli_args: ArgumentBatch::default(),
        }
    }
}

/// `[backend]` section: which execution backend to construct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum BackendConfig {
    Local {
        /// Shell used for `sh -c`; defaults to `sh`.
        shell: Option<String>,
    },
    Ssh {
        host: String,
        user: Option<String>,
        port: Option<u16>,
        identity_file: Option<PathBuf>,
        #[serde(default = "default_remote_dir")]
        remote_dir: String,
    },
    DryRun,
}

fn default_remote_dir() -> String {
    "/tmp".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local { shell: None }
    }
}
