//! Schema management and staged load for the sparkify warehouse.
//!
//! The warehouse path runs five stages, each a loop over fixed statements
//! that are executed and committed one at a time:
//!
//! 1. `reset_schema`: drop every table (fact, dimensions, staging) and
//!    recreate them (staging, dimensions, fact)
//! 2. `load_staging`: bulk-copy raw records from object storage
//! 3. `validate_staging`: count staged rows
//! 4. `transform_insert`: populate dimensions, then the fact table
//! 5. `validate_insert`: count final rows
//!
//! Nothing here is resumable. A failed stage aborts the run, statements
//! already committed stay committed, and the fix is to rerun from
//! `reset_schema`.
//!
//! # Example
//!
//! ```no_run
//! use sparkify_core::PipelineConfig;
//! use sparkify_warehouse::{CopySource, PgWarehouse, Pipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load("dwh.json")?;
//! let warehouse = PgWarehouse::connect(&config.warehouse).await?;
//!
//! let report = Pipeline::full()
//!     .with_copy_source(CopySource::from_config(&config)?)
//!     .with_validation(config.validation.clone())
//!     .run(warehouse)
//!     .await?;
//!
//! for count in &report.row_counts {
//!     println!("{count}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod pipeline;
pub mod schema;
pub mod sql;
pub mod validation;
pub mod warehouse;

pub use error::{Result, StageFailure, WarehouseError};
pub use pipeline::{
    load_staging, run_pipeline, transform_insert, validate_insert, validate_staging, Pipeline,
    PipelineReport,
};
pub use schema::{create_tables, drop_tables, reset_schema};
pub use sql::{CopySource, Statement};
pub use validation::{Checkpoint, RowCount};
pub use warehouse::{PgWarehouse, Warehouse};
