//! Command-line interface for the standalone runner.
//!
//! The runner exercises the pipeline in-process against the
//! deterministic embedder and memory index; it is a development and
//! inspection surface, not the service deployment.

mod commands;
mod parser;

pub use commands::execute;
pub use parser::{Cli, Commands};
