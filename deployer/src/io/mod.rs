//! I/O adapters for deployer commands.

pub mod config;
pub mod git;
pub mod process;
pub mod runner;
pub mod version_file;
