//! Error types for the warehouse pipeline.

use sparkify_core::{PipelineStage, StageOrderError, Table};

use crate::pipeline::PipelineReport;

/// Result type for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// A required setting is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connecting to or disconnecting from the warehouse failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement or query failed.
    #[error("database error: {0}")]
    Database(String),

    /// A statement against a specific table failed.
    #[error("statement on {table} failed: {message}")]
    Statement {
        /// Table the statement targeted.
        table: Table,
        /// Error reported by the warehouse.
        message: String,
    },

    /// A row-count checkpoint fell short under an enforcing policy.
    #[error("validation failed for {table}: {rows} rows, {reason}")]
    ValidationFailed {
        /// Table that was counted.
        table: Table,
        /// Rows found.
        rows: u64,
        /// What the policy expected.
        reason: String,
    },

    /// The requested stages are not a consecutive run.
    #[error(transparent)]
    StageOrder(#[from] StageOrderError),
}

impl From<sqlx::Error> for WarehouseError {
    fn from(err: sqlx::Error) -> Self {
        WarehouseError::Database(err.to_string())
    }
}

/// A stage aborted the pipeline.
///
/// Carries the report of the stages that completed before it, so row counts
/// already gathered are not lost.
#[derive(Debug, thiserror::Error)]
#[error("stage {stage} failed: {source}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: PipelineStage,
    /// What completed before the failure.
    pub report: PipelineReport,
    /// Why the stage failed.
    pub source: WarehouseError,
}
