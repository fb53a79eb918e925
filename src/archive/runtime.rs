// src/archive/runtime.rs

//! Wrapper script that runs inside a self-extracting archive.
//!
//! The script extracts the embedded payload into a private work directory,
//! prints [`OUTPUT_BEGIN`], runs the payload (on the host or in a container),
//! prints [`OUTPUT_END`] and exits with the payload's status. Everything the
//! wrapper itself prints to stdout falls outside the markers, so
//! [`strip_framing`] can recover the payload's own output.

use std::fmt::Write as _;
use std::path::Path;

use crate::types::ImageRef;

/// Line separating the wrapper script from the base64 payload.
pub const PAYLOAD_MARKER: &str = "__PACKRUN_PAYLOAD__";
pub const OUTPUT_BEGIN: &str = "__PACKRUN_OUTPUT_BEGIN__";
pub const OUTPUT_END: &str = "__PACKRUN_OUTPUT_END__";

/// Directory inside the payload holding `payload.sh`.
pub const CONTROL_DIR: &str = ".packrun";
/// Directory inside the payload holding relative mounts.
pub const ROOT_DIR: &str = "root";
/// Directory inside the payload holding absolute (container-only) mounts.
pub const ABS_DIR: &str = "abs";
/// Where the payload tree is bound inside a container.
pub const CONTAINER_HOME: &str = "/packrun";

/// An absolute mount point and the payload directory that backs it.
#[derive(Debug, Clone)]
pub struct AbsoluteMount<'a> {
    pub index: usize,
    pub mount_point: &'a Path,
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render the wrapper script (everything up to and including the payload
/// marker line).
pub fn render_wrapper(
    image: Option<&ImageRef>,
    absolute_mounts: &[AbsoluteMount<'_>],
    verbose: bool,
) -> String {
    let mut s = String::new();
    s.push_str("#!/bin/sh\n");
    s.push_str("# packrun self-extracting archive\n");
    s.push_str("PACKRUN_ARCHIVE=\"$0\"\n");
    s.push_str(
        "PACKRUN_WORKDIR=\"$(mktemp -d \"${TMPDIR:-/tmp}/packrun.XXXXXX\")\" || exit 1\n",
    );
    s.push_str("trap 'rm -rf \"$PACKRUN_WORKDIR\"' EXIT\n");
    s.push_str("if [ \"$1\" = \"--\" ]; then shift; fi\n");
    if verbose {
        s.push_str("echo \"packrun: extracting into $PACKRUN_WORKDIR\" >&2\n");
    }
    let _ = writeln!(
        s,
        "PACKRUN_LINE=$(awk '/^{PAYLOAD_MARKER}$/ {{ print NR + 1; exit 0; }}' \"$PACKRUN_ARCHIVE\")"
    );
    s.push_str(
        "tail -n +\"$PACKRUN_LINE\" \"$PACKRUN_ARCHIVE\" | base64 -d | tar -xzf - -C \"$PACKRUN_WORKDIR\" || exit 1\n",
    );
    let _ = writeln!(s, "mkdir -p \"$PACKRUN_WORKDIR/{ROOT_DIR}\"");
    let _ = writeln!(s, "cd \"$PACKRUN_WORKDIR/{ROOT_DIR}\" || exit 1");

    match image {
        None => {
            if verbose {
                s.push_str("echo \"packrun: running payload on host\" >&2\n");
            }
            let _ = writeln!(s, "echo \"{OUTPUT_BEGIN}\"");
            let _ = writeln!(
                s,
                "sh \"$PACKRUN_WORKDIR/{CONTROL_DIR}/payload.sh\" \"$@\""
            );
        }
        Some(image) => {
            if verbose {
                let _ = writeln!(
                    s,
                    "echo \"packrun: running payload in {}\" >&2",
                    image.as_str()
                );
            }
            let _ = writeln!(s, "echo \"{OUTPUT_BEGIN}\"");
            s.push_str("docker run --rm -i \\\n");
            let _ = writeln!(
                s,
                "  -v \"$PACKRUN_WORKDIR/{ROOT_DIR}\":{} \\",
                shell_quote(&format!("{CONTAINER_HOME}/{ROOT_DIR}"))
            );
            let _ = writeln!(
                s,
                "  -v \"$PACKRUN_WORKDIR/{CONTROL_DIR}\":{} \\",
                shell_quote(&format!("{CONTAINER_HOME}/{CONTROL_DIR}:ro"))
            );
            for mount in absolute_mounts {
                let _ = writeln!(
                    s,
                    "  -v \"$PACKRUN_WORKDIR/{ABS_DIR}/{}\":{} \\",
                    mount.index,
                    shell_quote(&mount.mount_point.to_string_lossy())
                );
            }
            let _ = writeln!(
                s,
                "  -w {} \\",
                shell_quote(&format!("{CONTAINER_HOME}/{ROOT_DIR}"))
            );
            let _ = writeln!(
                s,
                "  {} sh {} \"$@\"",
                shell_quote(image.as_str()),
                shell_quote(&format!("{CONTAINER_HOME}/{CONTROL_DIR}/payload.sh"))
            );
        }
    }

    s.push_str("PACKRUN_STATUS=$?\n");
    let _ = writeln!(s, "echo \"{OUTPUT_END}\"");
    s.push_str("exit $PACKRUN_STATUS\n");
    let _ = writeln!(s, "{PAYLOAD_MARKER}");
    s
}

/// Return the payload's own output from captured wrapper output.
///
/// Takes the text between the begin and end markers when present, then drops
/// trailing line breaks.
pub fn strip_framing(raw: &str) -> String {
    let body = match raw.find(OUTPUT_BEGIN) {
        Some(pos) => {
            let after = &raw[pos + OUTPUT_BEGIN.len()..];
            after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after)
        }
        None => raw,
    };
    let body = match body.rfind(OUTPUT_END) {
        Some(pos) => &body[..pos],
        None => body,
    };
    body.trim_end_matches(['\n', '\r']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_framing_keeps_only_payload_output() {
        let raw = format!("noise\n{OUTPUT_BEGIN}\nhello\n{OUTPUT_END}\n");
        assert_eq!(strip_framing(&raw), "hello");
    }

    #[test]
    fn strip_framing_handles_missing_newline_before_end() {
        let raw = format!("{OUTPUT_BEGIN}\nno-newline{OUTPUT_END}\n");
        assert_eq!(strip_framing(&raw), "no-newline");
    }

    #[test]
    fn strip_framing_without_markers_only_trims() {
        assert_eq!(strip_framing("plain\n\n"), "plain");
        assert_eq!(strip_framing(""), "");
    }

    #[test]
    fn strip_framing_keeps_inner_lines() {
        let raw = format!("{OUTPUT_BEGIN}\na\n\nb\n{OUTPUT_END}\n");
        assert_eq!(strip_framing(&raw), "a\n\nb");
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn host_wrapper_runs_payload_with_sh() {
        let script = render_wrapper(None, &[], false);
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("sh \"$PACKRUN_WORKDIR/.packrun/payload.sh\" \"$@\""));
        assert!(!script.contains("docker"));
        assert!(script.ends_with(&format!("exit $PACKRUN_STATUS\n{PAYLOAD_MARKER}\n")));
    }

    #[test]
    fn container_wrapper_binds_absolute_mounts() {
        let image = ImageRef::new("python:3").unwrap();
        let mounts = [AbsoluteMount {
            index: 0,
            mount_point: Path::new("/data"),
        }];
        let script = render_wrapper(Some(&image), &mounts, true);
        assert!(script.contains("docker run --rm -i"));
        assert!(script.contains("-v \"$PACKRUN_WORKDIR/abs/0\":'/data'"));
        assert!(script.contains("'python:3' sh '/packrun/.packrun/payload.sh' \"$@\""));
        assert!(script.contains(">&2"));
    }
}
