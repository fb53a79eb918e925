// src/exec/mod.rs

//! Artifact execution layer.
//!
//! This module is responsible for actually running built artifacts, either on
//! this machine, on a remote host, or not at all (dry run).
//!
//! - [`backend`] provides the `ExecutionBackend` trait and the `Invocation`
//!   value every dispatch carries. Tests replace the backend with a fake
//!   implementation.
//! - [`local`] runs invocations through `sh -c`.
//! - [`ssh`] copies the artifact to a remote host and runs it there.
//! - [`dry_run`] prints invocations instead of running them.

pub mod backend;
pub mod dry_run;
pub mod local;
pub mod ssh;

pub use backend::{ExecutionBackend, ExitStatusError, Invocation};
pub use dry_run::DryRunBackend;
pub use local::LocalBackend;
pub use ssh::{SshBackend, SshTarget};

use crate::config::BackendConfig;

/// Construct the backend described by `config`.
///
/// A new instance is created per call; nothing is shared between launches.
pub fn backend_from_config(config: &BackendConfig) -> Box<dyn ExecutionBackend> {
    match config {
        BackendConfig::Local { shell: None } => Box::new(LocalBackend::new()),
        BackendConfig::Local { shell: Some(shell) } => Box::new(LocalBackend::with_shell(shell)),
        BackendConfig::Ssh {
            host,
            user,
            port,
            identity_file,
            remote_dir,
        } => Box::new(SshBackend::new(SshTarget {
            host: host.clone(),
            user: user.clone(),
            port: *port,
            identity_file: identity_file.clone(),
            remote_dir: remote_dir.clone(),
        })),
        BackendConfig::DryRun => Box::new(DryRunBackend::new()),
    }
}
