// tests/local_end_to_end.rs
//
// Builds real self-extracting artifacts and runs them through `sh` on this
// machine. Needs `base64`, `tar`, `awk` and `mktemp` on PATH.
#![cfg(unix)]

mod common;
use crate::common::{entries_in, init_tracing, write_file};

use std::error::Error;

use packrun::archive::ShellArchiveBuilder;
use packrun::errors::PackrunError;
use packrun::exec::{ExitStatusError, LocalBackend};
use packrun::launch::{LaunchOutput, Launcher};
use packrun::types::{ArgumentBatch, ShellCommand};
use packrun_test_utils::builders::{LaunchOptionsBuilder, ScriptOptionsBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn setup() -> (tempfile::TempDir, Launcher<ShellArchiveBuilder>) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let launcher = Launcher::new(ShellArchiveBuilder::with_temp_dir(dir.path()));
    (dir, launcher)
}

#[test]
fn captured_output_has_framing_removed() -> TestResult {
    let (artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("echo hello")?,
        None,
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("hello"));
    assert_eq!(entries_in(artifacts.path()), 0);
    Ok(())
}

#[test]
fn option_like_arguments_reach_the_payload() -> TestResult {
    let (_artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("echo")?,
        Some("--help --foo"),
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("--help --foo"));
    Ok(())
}

#[test]
fn mounted_files_are_visible_relative_to_the_run_root() -> TestResult {
    let (_artifacts, launcher) = setup();
    let data = tempfile::tempdir()?;
    write_file(data.path(), "greeting.txt", "hi from a mount\n");
    write_file(data.path(), "nested/inner.txt", "deep\n");
    let options = LaunchOptionsBuilder::new()
        .capture()
        .mount(data.path(), "data")
        .build();

    let out = launcher.run_command(
        &ShellCommand::new("cat data/greeting.txt data/nested/inner.txt")?,
        None,
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("hi from a mount\ndeep"));
    Ok(())
}

#[test]
fn one_artifact_serves_every_batch_entry() -> TestResult {
    let (artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();
    let batch = ArgumentBatch::new(vec![Some("a".into()), None, Some("b c".into())]);

    let outs = launcher.run_commands(
        &ShellCommand::new("echo run")?,
        &batch,
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(
        outs,
        vec![
            Some("run a".to_string()),
            Some("run".to_string()),
            Some("run b c".to_string()),
        ]
    );
    assert_eq!(entries_in(artifacts.path()), 0);
    Ok(())
}

#[test]
fn script_can_read_sibling_files() -> TestResult {
    let (_artifacts, launcher) = setup();
    let project = tempfile::tempdir()?;
    write_file(project.path(), "message.txt", "hello123");
    let script_path = write_file(
        project.path(),
        "run.sh",
        "printf '%s %s\\n' \"$(cat \"$(dirname \"$0\")/message.txt\")\" \"$1\"\n",
    );
    let options = LaunchOptionsBuilder::new().capture().build();
    let script = ScriptOptionsBuilder::new()
        .interpreter("sh")
        .cli_args(ArgumentBatch::from_args(["first", "second"]))
        .build();

    let out = launcher.run_script(&script_path, &script, &LocalBackend::new(), &options)?;

    assert_eq!(
        out,
        LaunchOutput::Multiple(vec![
            Some("hello123 first".to_string()),
            Some("hello123 second".to_string()),
        ])
    );
    Ok(())
}

#[test]
fn failing_payload_surfaces_exit_status_and_cleans_up() -> TestResult {
    let (artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let err = launcher
        .run_command(
            &ShellCommand::new("exit 3")?,
            None,
            &LocalBackend::new(),
            &options,
        )
        .unwrap_err();

    match err {
        PackrunError::Dispatch { index, source, .. } => {
            assert_eq!(index, 0);
            let status = source
                .downcast_ref::<ExitStatusError>()
                .expect("exit status error");
            assert_eq!(status.code, Some(3));
        }
        other => panic!("expected Dispatch error, got {other:?}"),
    }
    assert_eq!(entries_in(artifacts.path()), 0);
    Ok(())
}

#[test]
fn multi_line_payload_runs_as_a_script() -> TestResult {
    let (_artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("x=4\necho \"x is $x, first arg $1\"")?,
        Some("seven"),
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("x is 4, first arg seven"));
    Ok(())
}

#[test]
fn one_line_loop_runs_unchanged() -> TestResult {
    let (_artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("for i in 1 2; do echo $i; done")?,
        None,
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("1\n2"));
    Ok(())
}

#[test]
fn one_line_conditional_sees_arguments_positionally() -> TestResult {
    let (_artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("if true; then echo yes $1; fi")?,
        Some("please"),
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("yes please"));
    Ok(())
}

#[test]
fn command_list_does_not_run_arguments_as_a_command() -> TestResult {
    let (_artifacts, launcher) = setup();
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("echo a; echo b")?,
        Some("false"),
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("a\nb"));
    Ok(())
}

#[test]
fn artifact_directory_with_space_still_runs() -> TestResult {
    init_tracing();
    let root = tempfile::tempdir()?;
    let spaced = root.path().join("my dir");
    std::fs::create_dir(&spaced)?;
    let launcher = Launcher::new(ShellArchiveBuilder::with_temp_dir(&spaced));
    let options = LaunchOptionsBuilder::new().capture().build();

    let out = launcher.run_command(
        &ShellCommand::new("echo hello")?,
        Some("there"),
        &LocalBackend::new(),
        &options,
    )?;

    assert_eq!(out.as_deref(), Some("hello there"));
    assert_eq!(entries_in(&spaced), 0);
    Ok(())
}
