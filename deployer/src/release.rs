//! Release orchestration: version bumps and git release metadata.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::core::version::{Version, VersionField};
use crate::io::git::Git;
use crate::io::version_file::{load_version, write_version};

/// Version before and after a bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBump {
    pub previous: Version,
    pub current: Version,
}

/// Load the version file, advance `field`, and write it back.
#[instrument(skip_all, fields(path = %path.display(), field = ?field))]
pub fn bump_version_file(path: &Path, field: VersionField) -> Result<VersionBump> {
    let previous = load_version(path)?;
    let current = previous.bump(field)?;
    write_version(path, current)
        .with_context(|| format!("write version file {}", path.display()))?;
    info!(%previous, %current, "version bumped");
    Ok(VersionBump { previous, current })
}

/// Repository facts printed by `deployer info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub top_level_dir: PathBuf,
    pub current_branch: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<TagRelease>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRelease {
    pub tag: String,
    pub date: String,
}

/// Human-readable `Key: value` lines.
impl fmt::Display for ReleaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TopLevelDir: {}", self.top_level_dir.display())?;
        writeln!(f, "CurrentBranch: {}", self.current_branch)?;
        writeln!(f, "GitUserName: {}", self.user_name)?;
        if let Some(release) = &self.release {
            writeln!(f, "{} Released at {}", release.tag, release.date)?;
        }
        Ok(())
    }
}

/// Gather repository metadata, optionally including the release date of `tag`.
#[instrument(skip_all, fields(tag))]
pub fn collect_release_info(git: &Git, tag: Option<&str>) -> Result<ReleaseInfo> {
    let release = match tag {
        Some(tag) => Some(TagRelease {
            tag: tag.to_string(),
            date: git
                .release_date(tag)
                .with_context(|| format!("release date for {tag}"))?,
        }),
        None => None,
    };
    Ok(ReleaseInfo {
        top_level_dir: git.top_level_dir().context("top level dir")?,
        current_branch: git.current_branch().context("current branch")?,
        user_name: git.user_name().context("git user name")?,
        release,
    })
}
