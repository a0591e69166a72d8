//! HomeSetup deployer: version bumping, git release metadata, and file
//! encode/encrypt helpers.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (base64 text codec, cipher tool
//!   arguments, version tuples). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, git, child processes).
//!   External tools sit behind [`io::runner::CommandRunner`] so tests can
//!   substitute scripted runners.
//!
//! Orchestration modules ([`security`], [`release`]) coordinate core logic
//! with I/O to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod release;
pub mod security;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
