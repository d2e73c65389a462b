//! One run of the batch transform.

use std::fmt;

use datafusion::prelude::SessionContext;
use sparkify_core::{AwsCredentials, StorageLocations};
use tracing::instrument;

use crate::catalog::process_song_data;
use crate::error::Result;
use crate::events::process_log_data;
use crate::location::LakeLocation;
use crate::tables::{OutputTable, WrittenTable};

/// A compute session bound to an input and an output root.
pub struct LakeJob {
    ctx: SessionContext,
    input: LakeLocation,
    output: LakeLocation,
}

impl LakeJob {
    /// Bind `ctx` to the configured roots and register their stores.
    ///
    /// # Errors
    ///
    /// Returns an error if a root cannot be parsed or its store built.
    pub fn new(
        ctx: SessionContext,
        storage: &StorageLocations,
        aws: &AwsCredentials,
    ) -> Result<Self> {
        let input = LakeLocation::parse(&storage.input_data)?;
        let output = LakeLocation::parse(&storage.output_data)?;
        input.register(&ctx, aws)?;
        output.register(&ctx, aws)?;
        Ok(Self { ctx, input, output })
    }

    /// Build and write the songs and artists tables.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, transforming or writing fails.
    #[instrument(skip(self))]
    pub async fn process_song_data(&self) -> Result<Vec<WrittenTable>> {
        process_song_data(&self.ctx, &self.input, &self.output).await
    }

    /// Build and write the users, time and song plays tables.
    ///
    /// Reads back the songs and artists tables, so it must follow
    /// [`LakeJob::process_song_data`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading, transforming or writing fails.
    #[instrument(skip(self))]
    pub async fn process_log_data(&self) -> Result<Vec<WrittenTable>> {
        process_log_data(&self.ctx, &self.input, &self.output).await
    }
}

impl fmt::Debug for LakeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LakeJob")
            .field("session_id", &self.ctx.session_id())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// Tables written by a run.
#[derive(Debug, Clone, Default)]
pub struct LakeReport {
    /// Every table written, in write order.
    pub written: Vec<WrittenTable>,
}

impl LakeReport {
    /// Rows written to `table`, if it was written.
    #[must_use]
    pub fn rows(&self, table: OutputTable) -> Option<u64> {
        self.written
            .iter()
            .find(|written| written.table == table)
            .map(|written| written.rows)
    }
}
