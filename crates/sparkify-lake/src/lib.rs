//! Partitioned batch transform for the sparkify lake.
//!
//! Reads the raw song catalog and event logs as JSON, derives the star
//! schema and writes each table as Parquet under the output root:
//!
//! | Table       | Partitioned by        |
//! |-------------|-----------------------|
//! | `songs`     | `year`, `artist_id`   |
//! | `artists`   |                       |
//! | `users`     |                       |
//! | `time`      | `year`, `month`       |
//! | `songplays` | `year`, `month`       |
//!
//! Every write replaces the table's previous contents. Roots may be `s3://`
//! (or `s3a://`) prefixes or local directories.
//!
//! # Example
//!
//! ```no_run
//! use sparkify_core::PipelineConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load("dwh.json")?;
//! let report = sparkify_lake::run(&config).await?;
//!
//! for written in &report.written {
//!     println!("{written}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod error;
pub mod events;
pub mod job;
pub mod location;
pub mod schema;
pub mod tables;
pub mod writer;

use datafusion::prelude::{SessionConfig, SessionContext};
use sparkify_core::{PipelineConfig, Progress, Target};

pub use error::{LakeError, Result};
pub use job::{LakeJob, LakeReport};
pub use location::LakeLocation;
pub use tables::{OutputTable, WrittenTable};

/// A compute session that lists input directories recursively.
///
/// The raw song catalog and event logs sit several directories below their
/// roots, which the default listing would skip.
#[must_use]
pub fn session() -> SessionContext {
    let config = SessionConfig::new()
        .set_bool("datafusion.execution.listing_table_ignore_subdirectory", false);
    SessionContext::new_with_config(config)
}

/// Run the whole transform: song catalog first, then event logs.
///
/// # Errors
///
/// Returns an error if the configuration lacks the lake roots, or if any
/// read, transform or write fails.
pub async fn run(config: &PipelineConfig) -> Result<LakeReport> {
    let mut progress = Progress::slashed(7);

    progress.advance("Creating Session");
    let ctx = session();
    progress.advance("Session Created");

    config.validate_for(Target::Lake)?;
    let job = LakeJob::new(ctx, &config.storage, &config.aws)?;
    progress.advance("Configurations Loaded");

    let mut report = LakeReport::default();

    progress.advance("Processing Song Data");
    report.written.extend(job.process_song_data().await?);
    progress.advance("Song Data Processed");

    progress.advance("Processing Log Data");
    report.written.extend(job.process_log_data().await?);
    progress.advance("Log Data Processed");

    Ok(report)
}
