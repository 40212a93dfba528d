//! Tooling & Integration Layer
//!
//! Command-line access to the tree cache for inspection and repair outside
//! the application that normally owns it.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, ImportMode};
