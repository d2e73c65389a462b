//! Command line entry point for the sparkify pipelines.
//!
//! Every subcommand loads one `PipelineConfig`, checks the keys it needs,
//! and hands the configuration to the crate that does the work.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod handle;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
