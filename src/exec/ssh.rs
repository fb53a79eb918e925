// src/exec/ssh.rs

//! Run artifacts on a remote host over SSH.
//!
//! Each dispatch copies the artifact with `scp`, runs it with `ssh`, then
//! removes the remote copy. The artifact is self-contained, so nothing else
//! needs to be present on the remote side besides a POSIX shell (and a
//! container runtime when the artifact was built with an image).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use super::backend::{ExecutionBackend, Invocation, finish};
use crate::archive::runtime::shell_quote;

/// Connection settings for [`SshBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    /// Remote directory the artifact is copied into.
    pub remote_dir: String,
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
            remote_dir: "/tmp".to_string(),
        }
    }

    /// `user@host`, or just `host`.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SshBackend {
    target: SshTarget,
}

impl SshBackend {
    pub fn new(target: SshTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    fn remote_path(&self, artifact: &Path) -> Result<String> {
        let name = artifact
            .file_name()
            .ok_or_else(|| anyhow!("artifact path {:?} has no file name", artifact))?;
        Ok(format!(
            "{}/{}",
            self.target.remote_dir.trim_end_matches('/'),
            name.to_string_lossy()
        ))
    }

    /// `scp` arguments: the port flag is `-P` here, `-p` for `ssh`.
    fn scp_command(&self, artifact: &Path, remote_path: &str) -> Command {
        let mut cmd = Command::new("scp");
        cmd.arg("-q").arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.target.port {
            cmd.arg("-P").arg(port.to_string());
        }
        if let Some(identity) = &self.target.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(artifact)
            .arg(format!("{}:{remote_path}", self.target.destination()));
        cmd
    }

    fn ssh_command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.target.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.target.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(self.target.destination()).arg(remote_command);
        cmd
    }

    /// Command line run on the remote host for `invocation`.
    pub fn remote_command_line(&self, invocation: &Invocation) -> Result<String> {
        let remote = shell_quote(&self.remote_path(invocation.artifact())?);
        Ok(match invocation.args() {
            Some(args) => format!("sh {remote} -- {args}"),
            None => format!("sh {remote}"),
        })
    }

    fn cleanup(&self, remote_path: &str) {
        let rm = format!("rm -f {}", shell_quote(remote_path));
        match self.ssh_command(&rm).stdout(Stdio::null()).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(
                host = %self.target.host,
                path = %remote_path,
                code = ?status.code(),
                "failed to remove remote artifact"
            ),
            Err(e) => warn!(
                host = %self.target.host,
                path = %remote_path,
                error = %e,
                "failed to run remote cleanup"
            ),
        }
    }
}

impl ExecutionBackend for SshBackend {
    fn execute(&self, invocation: &Invocation, capture: bool) -> Result<Option<String>> {
        let remote_path = self.remote_path(invocation.artifact())?;
        let remote_command = self.remote_command_line(invocation)?;
        if invocation.verbose() {
            info!(
                host = %self.target.host,
                cmd = %remote_command,
                capture,
                "running artifact over ssh"
            );
        } else {
            debug!(
                host = %self.target.host,
                cmd = %remote_command,
                capture,
                "running artifact over ssh"
            );
        }

        let copy = self
            .scp_command(invocation.artifact(), &remote_path)
            .stdout(Stdio::null())
            .status()
            .context("spawning scp")?;
        finish(&format!("scp to {}", self.target.destination()), copy, None)?;
        debug!(path = %remote_path, "artifact copied");

        let mut ssh = self.ssh_command(&remote_command);
        ssh.stdin(Stdio::null()).stderr(Stdio::inherit());
        let result = if capture {
            ssh.stdout(Stdio::piped())
                .output()
                .context("spawning ssh")
                .and_then(|out| finish(&remote_command, out.status, Some(out.stdout)))
        } else {
            ssh.stdout(Stdio::inherit())
                .status()
                .context("spawning ssh")
                .and_then(|status| finish(&remote_command, status, None))
        };

        self.cleanup(&remote_path);
        result
    }
}
