#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub use packrun_test_utils::init_tracing;

/// Write `name` under `dir` with `contents` and return its path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Number of entries directly under `dir`.
pub fn entries_in(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
