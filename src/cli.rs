// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::mount::MountSpec;
use crate::types::ImageRef;

/// Command-line arguments for `packrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "packrun",
    version,
    about = "Package a command and its files into one artifact, then run it locally, over SSH or in a container.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Packrun.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PACKRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Build the artifact but only print the command lines that would run.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run a shell command, once per `--arg` (or once without arguments).
    Run {
        /// Shell command to package.
        command: String,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Run a script file with an interpreter; its directory is mounted too.
    Script {
        /// Path to the script file.
        target: PathBuf,

        /// Interpreter command (default from config, else `python`).
        #[arg(long, value_name = "CMD")]
        interpreter: Option<String>,

        /// Prefix under which the script's directory is mounted.
        #[arg(long, value_name = "DIR")]
        target_mount_dir: Option<PathBuf>,

        /// Dispatch exactly once instead of once per `--arg`.
        #[arg(long)]
        single: bool,

        #[command(flatten)]
        launch: LaunchArgs,
    },
}

/// Options shared by `run` and `script`.
#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    /// Arguments for one invocation. Repeat to run several times.
    #[arg(long = "arg", value_name = "ARGS", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Bind a local directory into the artifact (`LOCAL_DIR:MOUNT_POINT`).
    #[arg(long = "mount", value_name = "LOCAL:POINT")]
    pub mounts: Vec<MountSpec>,

    /// Container image to run the payload in.
    #[arg(long, value_name = "REF")]
    pub image: Option<ImageRef>,

    /// Print the payload's output after each run instead of streaming it.
    #[arg(long)]
    pub capture: bool,

    /// Report build and dispatch progress.
    #[arg(long)]
    pub verbose: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_repeated_args() {
        let cli = CliArgs::try_parse_from([
            "packrun", "run", "echo", "--arg", "--help", "--arg", "b", "--capture",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Run { command, launch } => {
                assert_eq!(command, "echo");
                assert_eq!(launch.args, vec!["--help", "b"]);
                assert!(launch.capture);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn script_with_mount_and_image() {
        let cli = CliArgs::try_parse_from([
            "packrun",
            "--dry-run",
            "script",
            "/home/user/proj/hello.py",
            "--mount",
            "/data:/data",
            "--image",
            "python:3",
            "--single",
        ])
        .unwrap();
        assert!(cli.dry_run);
        match cli.command {
            CliCommand::Script {
                target,
                single,
                launch,
                ..
            } => {
                assert_eq!(target, PathBuf::from("/home/user/proj/hello.py"));
                assert!(single);
                assert_eq!(launch.mounts, vec![MountSpec::new("/data", "/data")]);
                assert_eq!(launch.image.unwrap().as_str(), "python:3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_image_is_a_parse_error() {
        assert!(CliArgs::try_parse_from(["packrun", "run", "ls", "--image", "Bad Image"]).is_err());
    }
}
