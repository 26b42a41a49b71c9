//! Commands module - all operations as library functions
//!
//! These commands are used by the CLI.

pub mod graph;
pub mod import;
