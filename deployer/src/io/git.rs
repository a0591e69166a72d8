//! Git metadata adapter for release commands.
//!
//! Every query is a single `git` subprocess call in a fixed working
//! directory; stdout is returned trimmed and a non-zero exit becomes an error
//! carrying git's stderr.

use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

/// `git log` format used for changelog entries: `<short sha> <date> <subject>`.
const CHANGELOG_FORMAT: &str = "--pretty=format:%h %ad %s";

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Absolute path of the repository's top-level directory.
    pub fn top_level_dir(&self) -> Result<PathBuf> {
        let out = self.run_capture(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(out.trim()))
    }

    /// Current branch name (`HEAD` when detached).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// Configured `user.name`.
    pub fn user_name(&self) -> Result<String> {
        let out = self.run_capture(&["config", "user.name"])?;
        Ok(out.trim().to_string())
    }

    /// Commit date (`YYYY-MM-DD`) of the given tag or revision.
    #[instrument(skip_all, fields(tag))]
    pub fn release_date(&self, tag: &str) -> Result<String> {
        let out = self.run_capture(&["log", "-1", "--format=%ad", "--date=short", tag])?;
        Ok(out.trim().to_string())
    }

    /// Most recent tag reachable from `HEAD`, or `None` if the history has no tags.
    pub fn latest_tag(&self) -> Result<Option<String>> {
        let output = self.run(&["describe", "--tags", "--abbrev=0"])?;
        if !output.status.success() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "no reachable tag"
            );
            return Ok(None);
        }
        let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(tag))
    }

    /// Log entries in `from..to`, newest first.
    #[instrument(skip_all, fields(from, to))]
    pub fn changelog(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let range = format!("{from}..{to}");
        self.log_lines(&[&range])
    }

    /// Log entries since the latest tag (whole history if untagged).
    #[instrument(skip_all)]
    pub fn unreleased(&self) -> Result<Vec<String>> {
        match self.latest_tag()? {
            Some(tag) => self.changelog(&tag, "HEAD"),
            None => self.log_lines(&["HEAD"]),
        }
    }

    fn log_lines(&self, revs: &[&str]) -> Result<Vec<String>> {
        let mut args = vec!["log", CHANGELOG_FORMAT, "--date=short"];
        args.extend_from_slice(revs);
        let out = self.run_capture(&args)?;
        Ok(out
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}
