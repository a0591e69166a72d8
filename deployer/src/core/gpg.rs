//! Argument vectors for the symmetric cipher tool (`gpg` compatible).
//!
//! The passphrase never appears here: it is fed on stdin via `--passphrase-fd 0`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_CIPHER_ALGO: &str = "AES256";
pub const DEFAULT_DIGEST_ALGO: &str = "SHA512";

/// Which way the cipher tool transforms the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt",
        }
    }
}

/// Tool-level knobs that do not vary per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOptions {
    /// Add `--pinentry-mode loopback` (required by GnuPG >= 2.1 for fd passphrases).
    pub pinentry_loopback: bool,
    /// Alternate keyring/home directory (`--homedir`).
    pub homedir: Option<PathBuf>,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            pinentry_loopback: true,
            homedir: None,
        }
    }
}

/// Build the full argument list for one encrypt/decrypt invocation.
pub fn cipher_args(
    direction: Direction,
    cipher_algo: &str,
    digest_algo: &str,
    tool: &ToolOptions,
    source: &Path,
    destination: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(18);
    if let Some(home) = &tool.homedir {
        args.push("--homedir".into());
        args.push(home.into());
    }
    args.extend(["--quiet", "--yes", "--batch"].map(OsString::from));
    if tool.pinentry_loopback {
        args.push("--pinentry-mode".into());
        args.push("loopback".into());
    }
    args.push("--passphrase-fd".into());
    args.push("0".into());
    args.push(match direction {
        Direction::Encrypt => "--symmetric".into(),
        Direction::Decrypt => "--decrypt".into(),
    });
    args.push("--cipher-algo".into());
    args.push(cipher_algo.into());
    args.push("--digest-algo".into());
    args.push(digest_algo.into());
    args.push("--output".into());
    args.push(destination.into());
    args.push(source.into());
    args
}
