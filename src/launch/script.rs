// src/launch/script.rs

//! Running a single script file.
//!
//! The script's containing directory (not just the file) is mounted, so the
//! script can reach sibling files next to it.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{LaunchOutput, Launcher};
use crate::archive::ArtifactBuilder;
use crate::config::{LaunchOptions, ScriptOptions};
use crate::errors::{PackrunError, Result};
use crate::exec::ExecutionBackend;
use crate::mount::MountSpec;
use crate::types::ShellCommand;

/// Mount derived for a script target, and the script's path inside the
/// artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMount {
    pub mount: MountSpec,
    pub script_path: PathBuf,
}

/// Bind `dirname(target)` to `target_mount_dir/<basename(dirname(target))>`.
///
/// Relative targets are resolved against the current directory first.
pub fn derive_script_mount(target: &Path, target_mount_dir: &Path) -> Result<ScriptMount> {
    let target = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let file_name = target
        .file_name()
        .ok_or_else(|| PackrunError::InvalidTarget(target.clone()))?;
    let local_dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| PackrunError::InvalidTarget(target.clone()))?;

    // A script directly under `/` would mean packing the whole filesystem.
    let dir_name = local_dir
        .file_name()
        .ok_or_else(|| PackrunError::InvalidTarget(target.clone()))?;
    let mount_point = target_mount_dir.join(dir_name);
    let script_path = mount_point.join(file_name);

    Ok(ScriptMount {
        mount: MountSpec::new(local_dir, mount_point),
        script_path,
    })
}

/// `"<interpreter> <target>"`.
pub fn make_interpreter_command(target: &str, interpreter: &str) -> Result<ShellCommand> {
    if target.trim().is_empty() {
        return Err(PackrunError::InvalidArguments(
            "script target must not be empty".to_string(),
        ));
    }
    if interpreter.trim().is_empty() {
        return Err(PackrunError::InvalidArguments(
            "interpreter must not be empty".to_string(),
        ));
    }
    ShellCommand::new(format!("{interpreter} {target}"))
}

impl<B: ArtifactBuilder> Launcher<B> {
    /// Run the script at `target` with `script.interpreter`.
    ///
    /// Delegates to [`Launcher::run_commands`] when `script.run_multiple` is
    /// set, otherwise to [`Launcher::run_command`] with the single
    /// `cli_args` entry.
    pub fn run_script(
        &self,
        target: &Path,
        script: &ScriptOptions,
        backend: &dyn ExecutionBackend,
        options: &LaunchOptions,
    ) -> Result<LaunchOutput> {
        let derived = derive_script_mount(target, &script.target_mount_dir)?;
        let command = make_interpreter_command(
            &derived.script_path.to_string_lossy(),
            &script.interpreter,
        )?;
        debug!(
            target = ?target,
            mount = %derived.mount,
            cmd = %command,
            "derived script mount"
        );

        let mut options = options.clone();
        options.mounts.push(derived.mount);

        if script.run_multiple {
            let outputs = self.run_commands(&command, &script.cli_args, backend, &options)?;
            return Ok(LaunchOutput::Multiple(outputs));
        }

        if script.cli_args.len() > 1 {
            return Err(PackrunError::InvalidArguments(format!(
                "{} argument sets given but run_multiple is false",
                script.cli_args.len()
            )));
        }
        let args = script.cli_args.iter().next().flatten();
        let output = self.run_command(&command, args, backend, &options)?;
        Ok(LaunchOutput::Single(output))
    }
}
