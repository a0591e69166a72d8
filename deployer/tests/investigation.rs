//! Investigation tests for external CLI behavior.
//!
//! These tests drive the real `gpg` binary and are excluded from regular CI
//! runs because they depend on a local GnuPG installation.
//!
//! Run with: `cargo test --test investigation -- --ignored`

#[path = "investigation/gpg.rs"]
mod gpg;
