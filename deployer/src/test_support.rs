//! Test-only helpers: scripted command runners and throwaway git repositories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::io::runner::{CommandRunner, Invocation, ToolOutput};

/// Predetermined outcome for one scripted tool run.
#[derive(Debug, Clone)]
pub struct ScriptedTool {
    pub code: Option<i32>,
    pub output: String,
}

impl ScriptedTool {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            output: String::new(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }
}

/// Runner that replays queued outcomes and records every invocation.
///
/// Running with an empty queue returns an error, which looks like a tool that
/// could not be spawned.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outcomes: RefCell<VecDeque<ScriptedTool>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(outcomes: Vec<ScriptedTool>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let outcome = self
            .outcomes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted outcome for {}", invocation.program_name()))?;
        Ok(ToolOutput {
            code: outcome.code,
            output: outcome.output.into_bytes(),
            timed_out: false,
        })
    }
}

/// Temporary git repository with a configured identity.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo dir")?;
        let repo = Self { dir };
        repo.git(&["init", "-q"])?;
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"])?;
        repo.git(&["config", "user.name", "Deployer Test"])?;
        repo.git(&["config", "user.email", "deployer@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.git(&["config", "tag.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `name`, stage it, and commit with `message` dated `date` (`YYYY-MM-DD`).
    pub fn commit_file(&self, name: &str, contents: &str, message: &str, date: &str) -> Result<()> {
        fs::write(self.path().join(name), contents)
            .with_context(|| format!("write {name}"))?;
        self.git(&["add", name])?;
        let stamp = format!("{date}T12:00:00");
        let status = Command::new("git")
            .args(["commit", "-q", "-m", message])
            .env("GIT_AUTHOR_DATE", &stamp)
            .env("GIT_COMMITTER_DATE", &stamp)
            .current_dir(self.path())
            .status()
            .context("spawn git commit")?;
        if !status.success() {
            return Err(anyhow!("git commit failed: {status}"));
        }
        Ok(())
    }

    pub fn tag(&self, name: &str) -> Result<()> {
        self.git(&["tag", name])
    }

    pub fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(())
    }
}
