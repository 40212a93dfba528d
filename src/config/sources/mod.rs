//! Configuration sources, lowest precedence first.

pub mod global_file;
pub mod explicit_file;
pub mod environment;
