//! Stable exit codes for deployer CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed (I/O, config, git, decode or version file errors).
pub const FAILED: i32 = 1;
/// Invalid command line; emitted by clap before any command runs.
pub const USAGE: i32 = 2;
/// The external cipher tool ran but exited non-zero.
pub const TOOL_FAILED: i32 = 3;
