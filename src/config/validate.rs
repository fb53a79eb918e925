// src/config/validate.rs

use std::collections::HashSet;
use std::path::Component;

use crate::config::model::{BackendConfig, ConfigFile, LaunchOptions, RawConfigFile, ScriptOptions};
use crate::errors::{PackrunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PackrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.launch, raw.script, raw.backend))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_launch_options(&cfg.launch)?;
    validate_script_options(&cfg.script)?;
    validate_backend(&cfg.backend)?;
    Ok(())
}

/// Mount points must be well formed and unique.
///
/// Whether each `local_dir` exists is checked by the artifact builder at
/// build time, not here.
pub fn validate_launch_options(opts: &LaunchOptions) -> Result<()> {
    let mut seen = HashSet::new();
    for mount in opts.mounts.iter() {
        mount.validate_shape()?;
        if !seen.insert(mount.normalized_mount_point()) {
            return Err(PackrunError::InvalidMount(format!(
                "duplicate mount point {:?}",
                mount.mount_point
            )));
        }
    }
    Ok(())
}

pub fn validate_script_options(opts: &ScriptOptions) -> Result<()> {
    if opts.interpreter.trim().is_empty() {
        return Err(PackrunError::ConfigError(
            "[script].interpreter must not be empty".to_string(),
        ));
    }
    if opts.target_mount_dir.as_os_str().is_empty() {
        return Err(PackrunError::ConfigError(
            "[script].target_mount_dir must not be empty".to_string(),
        ));
    }
    if opts
        .target_mount_dir
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(PackrunError::ConfigError(format!(
            "[script].target_mount_dir {:?} must not contain '..'",
            opts.target_mount_dir
        )));
    }
    if opts.cli_args.is_empty() {
        return Err(PackrunError::ConfigError(
            "[script].cli_args must contain at least one entry".to_string(),
        ));
    }
    if !opts.run_multiple && opts.cli_args.len() > 1 {
        return Err(PackrunError::ConfigError(format!(
            "[script].cli_args has {} entries but run_multiple = false",
            opts.cli_args.len()
        )));
    }
    Ok(())
}

fn validate_backend(backend: &BackendConfig) -> Result<()> {
    match backend {
        BackendConfig::Ssh { host, .. } if host.trim().is_empty() => Err(
            PackrunError::ConfigError("[backend].host must not be empty".to_string()),
        ),
        BackendConfig::Local { shell: Some(shell) } if shell.trim().is_empty() => Err(
            PackrunError::ConfigError("[backend].shell must not be empty".to_string()),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MountSpec;
    use crate::types::ArgumentBatch;

    #[test]
    fn default_config_is_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.backend(), &BackendConfig::Local { shell: None });
        assert_eq!(cfg.script().interpreter, "python");
    }

    #[test]
    fn duplicate_mount_points_are_rejected() {
        let mut raw = RawConfigFile::default();
        raw.launch.mounts = vec![MountSpec::new("/a", "data"), MountSpec::new("/b", "data/")];
        match ConfigFile::try_from(raw) {
            Err(PackrunError::InvalidMount(msg)) => assert!(msg.contains("duplicate")),
            other => panic!("expected InvalidMount, got {other:?}"),
        }
    }

    #[test]
    fn single_run_with_many_args_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.script.run_multiple = false;
        raw.script.cli_args = ArgumentBatch::from_args(["a", "b"]);
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(PackrunError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_ssh_host_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.backend = BackendConfig::Ssh {
            host: " ".into(),
            user: None,
            port: None,
            identity_file: None,
            remote_dir: "/tmp".into(),
        };
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(PackrunError::ConfigError(_))
        ));
    }
}
