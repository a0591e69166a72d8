//! Command-runner capability used by the file transform pipeline.
//!
//! The [`CommandRunner`] trait decouples the pipeline from the actual cipher
//! binary on `PATH`. Tests use scripted runners that record invocations and
//! return predetermined outcomes without spawning processes.

use std::ffi::OsString;
use std::fmt;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::io::process::run_command;

pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 100_000;

/// One external tool invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Bytes written to the child's stdin (may carry secrets).
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Value following `flag` in the argument list, if any.
    pub fn arg_after(&self, flag: &str) -> Option<&OsString> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outcome of an external tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when killed by a signal or timeout.
    pub code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: Vec<u8>,
    pub timed_out: bool,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }
}

/// Abstraction over external tool execution.
pub trait CommandRunner {
    /// Run the invocation to completion. `Err` means the tool could not be
    /// started or waited on; a non-zero exit is reported through [`ToolOutput`].
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Runner that spawns real processes found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(program = ?invocation.program))]
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        let output = run_command(
            cmd,
            invocation.stdin.as_deref(),
            self.timeout,
            self.output_limit_bytes,
        )?;
        debug!(exit_code = ?output.status.code(), "tool finished");
        Ok(ToolOutput {
            code: output.status.code(),
            output: output.combined(),
            timed_out: output.timed_out,
        })
    }
}
