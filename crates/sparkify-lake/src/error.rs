//! Error types for the batch transform.

/// Result type for batch transform operations.
pub type Result<T> = std::result::Result<T, LakeError>;

/// Errors that can occur while transforming the lake.
#[derive(Debug, thiserror::Error)]
pub enum LakeError {
    /// A required setting is missing or unusable.
    #[error(transparent)]
    Config(#[from] sparkify_core::ConfigError),

    /// A storage location could not be parsed.
    #[error("invalid location {location}: {message}")]
    Location {
        /// The location as configured.
        location: String,
        /// Why it was rejected.
        message: String,
    },

    /// The compute engine failed to plan or execute a query.
    #[error("query error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Reading, listing or deleting objects failed.
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// A local path could not be resolved.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
