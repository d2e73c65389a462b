//! Error types for the command line.

use std::path::PathBuf;

use sparkify_core::ConfigError;
use sparkify_infra::InfraError;
use sparkify_lake::LakeError;
use sparkify_warehouse::{StageFailure, WarehouseError};

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors a subcommand can end with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration could not be loaded or lacks a key.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cluster lifecycle call failed.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Connecting to the warehouse or preparing the load failed.
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    /// A warehouse stage aborted.
    #[error(transparent)]
    Stage(#[from] StageFailure),

    /// The batch transform failed.
    #[error(transparent)]
    Lake(#[from] LakeError),

    /// A cluster handle file could not be read or written.
    #[error("cluster handle {path}: {message}")]
    Handle {
        /// Path of the handle file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}
