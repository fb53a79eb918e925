#![allow(dead_code)]

use std::path::PathBuf;

use packrun::config::{LaunchOptions, ScriptOptions};
use packrun::mount::MountSpec;
use packrun::types::{ArgumentBatch, ImageRef};

/// Builder for `LaunchOptions` to simplify test setup.
pub struct LaunchOptionsBuilder {
    options: LaunchOptions,
}

impl LaunchOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: LaunchOptions::default(),
        }
    }

    pub fn capture(mut self) -> Self {
        self.options.capture_output = true;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.options.verbose = true;
        self
    }

    pub fn image(mut self, reference: &str) -> Self {
        self.options.image = Some(ImageRef::new(reference).expect("valid image reference"));
        self
    }

    pub fn mount(mut self, local_dir: impl Into<PathBuf>, mount_point: &str) -> Self {
        self.options.mounts.push(MountSpec::new(local_dir, mount_point));
        self
    }

    pub fn build(self) -> LaunchOptions {
        self.options
    }
}

impl Default for LaunchOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ScriptOptions`.
pub struct ScriptOptionsBuilder {
    options: ScriptOptions,
}

impl ScriptOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: ScriptOptions::default(),
        }
    }

    pub fn interpreter(mut self, cmd: &str) -> Self {
        self.options.interpreter = cmd.to_string();
        self
    }

    pub fn target_mount_dir(mut self, dir: &str) -> Self {
        self.options.target_mount_dir = PathBuf::from(dir);
        self
    }

    pub fn single(mut self) -> Self {
        self.options.run_multiple = false;
        self
    }

    pub fn cli_args(mut self, batch: ArgumentBatch) -> Self {
        self.options.cli_args = batch;
        self
    }

    pub fn build(self) -> ScriptOptions {
        self.options
    }
}

impl Default for ScriptOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
