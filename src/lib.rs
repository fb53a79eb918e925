// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod launch;
pub mod logging;
pub mod mount;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::archive::ShellArchiveBuilder;
use crate::cli::{CliArgs, CliCommand, LaunchArgs};
use crate::config::{
    BackendConfig, ConfigFile, LaunchOptions, RawConfigFile, ScriptOptions, default_config_path,
    load_and_validate,
};
use crate::config::validate::{validate_launch_options, validate_script_options};
use crate::exec::backend_from_config;
use crate::launch::{LaunchOutput, Launcher};
use crate::types::{ArgumentBatch, ShellCommand};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (explicit `--config`, else `Packrun.toml` if present)
/// - CLI overrides on top of the config
/// - backend construction (one per run, never shared)
/// - the launcher with the shell archive builder
pub fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let (mut launch, mut script, backend_cfg) = cfg.into_parts();

    let backend_cfg = if args.dry_run {
        BackendConfig::DryRun
    } else {
        backend_cfg
    };
    let backend = backend_from_config(&backend_cfg);
    debug!(backend = ?backend_cfg, "backend selected");

    let launcher = Launcher::new(ShellArchiveBuilder::new());

    let output = match args.command {
        CliCommand::Run {
            command,
            launch: launch_args,
        } => {
            apply_launch_args(&mut launch, &launch_args)?;
            let command = ShellCommand::new(command)?;
            match launch_args.args.as_slice() {
                [] => LaunchOutput::Single(launcher.run_command(&command, None, &backend, &launch)?),
                [single] => LaunchOutput::Single(launcher.run_command(
                    &command,
                    Some(single.as_str()),
                    &backend,
                    &launch,
                )?),
                many => {
                    let batch = ArgumentBatch::from_args(many.iter().cloned());
                    LaunchOutput::Multiple(launcher.run_commands(&command, &batch, &backend, &launch)?)
                }
            }
        }
        CliCommand::Script {
            target,
            interpreter,
            target_mount_dir,
            single,
            launch: launch_args,
        } => {
            apply_launch_args(&mut launch, &launch_args)?;
            apply_script_args(
                &mut script,
                interpreter,
                target_mount_dir,
                single,
                &launch_args.args,
            )?;
            launcher.run_script(&target, &script, &backend, &launch)?
        }
    };

    for out in output.into_vec().into_iter().flatten() {
        println!("{out}");
    }
    info!("done");
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path).with_context(|| format!("loading config {:?}", path));
    }
    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "using default config file");
        return load_and_validate(&default_path)
            .with_context(|| format!("loading config {:?}", default_path));
    }
    Ok(ConfigFile::try_from(RawConfigFile::default())?)
}

/// CLI flags add to (mounts) or override (image, switches) the config.
fn apply_launch_args(launch: &mut LaunchOptions, args: &LaunchArgs) -> Result<()> {
    launch.mounts.extend(args.mounts.iter().cloned());
    if let Some(image) = &args.image {
        launch.image = Some(image.clone());
    }
    launch.capture_output |= args.capture;
    launch.verbose |= args.verbose;
    validate_launch_options(launch)?;
    Ok(())
}

fn apply_script_args(
    script: &mut ScriptOptions,
    interpreter: Option<String>,
    target_mount_dir: Option<std::path::PathBuf>,
    single: bool,
    cli_args: &[String],
) -> Result<()> {
    if let Some(interpreter) = interpreter {
        script.interpreter = interpreter;
    }
    if let Some(dir) = target_mount_dir {
        script.target_mount_dir = dir;
    }
    if single {
        script.run_multiple = false;
    }
    if !cli_args.is_empty() {
        script.cli_args = ArgumentBatch::from_args(cli_args.iter().cloned());
    }
    validate_script_options(script)?;
    Ok(())
}
