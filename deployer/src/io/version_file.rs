//! Version file (`.VERSION`) load/save helpers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::version::Version;
use crate::io::config::write_atomic;

/// Read and parse the version file. A missing file is an error.
pub fn load_version(path: &Path) -> Result<Version> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read version file {}", path.display()))?;
    Version::parse(&contents).with_context(|| format!("parse version file {}", path.display()))
}

/// Atomically replace the version file with `version` and a trailing newline.
pub fn write_version(path: &Path, version: Version) -> Result<()> {
    write_atomic(path, &format!("{version}\n"))
}
