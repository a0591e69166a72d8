//! Deterministic, pure logic shared by the deployer.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (bytes, version tuples, argument vectors) so they can be tested in
//! isolation from `git`, `gpg` and the filesystem.

pub mod codec;
pub mod gpg;
pub mod version;
