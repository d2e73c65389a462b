//! Core types shared by the sparkify pipelines.
//!
//! This crate provides the pieces every other crate in the workspace builds on:
//!
//! - **Configuration**: `PipelineConfig` and its sections, loaded once and passed
//!   explicitly into each component
//! - **Tables**: `Table`, the staging, dimension and fact tables of the star schema
//! - **Stages**: `PipelineStage`, the ordered steps of the warehouse load
//! - **Progress**: `Progress`, numbered progress lines written through `tracing`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod progress;
pub mod stage;
pub mod table;

pub use config::{
    AwsCredentials, ClusterParams, PipelineConfig, PollSettings, StorageLocations, Target,
    ValidationPolicy, WarehouseParams,
};
pub use error::{ConfigError, Result};
pub use progress::Progress;
pub use stage::{PipelineStage, StageOrderError};
pub use table::{Table, TableKind};
