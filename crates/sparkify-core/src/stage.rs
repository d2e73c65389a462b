//! Ordered stages of the warehouse load.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the warehouse pipeline.
///
/// Stages only make sense in declaration order: the schema is reset before
/// staging is loaded, staging is loaded before it is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Drop and recreate every table.
    ResetSchema,
    /// Bulk-copy raw records into the staging tables.
    LoadStaging,
    /// Count rows in the staging tables.
    ValidateStaging,
    /// Populate dimension and fact tables from staging.
    TransformInsert,
    /// Count rows in the dimension and fact tables.
    ValidateInsert,
}

/// A stage plan that skips or reorders stages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageOrderError {
    /// No stages were requested.
    #[error("stage plan is empty")]
    Empty,

    /// `next` does not directly follow `previous`.
    #[error("stage {next} cannot run after {previous}")]
    OutOfOrder {
        /// The stage before the offending one.
        previous: PipelineStage,
        /// The offending stage.
        next: PipelineStage,
    },
}

impl PipelineStage {
    /// Every stage, in execution order.
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::ResetSchema,
        PipelineStage::LoadStaging,
        PipelineStage::ValidateStaging,
        PipelineStage::TransformInsert,
        PipelineStage::ValidateInsert,
    ];

    /// Stages of the load proper, for runs against an already reset schema.
    pub const LOAD: [PipelineStage; 4] = [
        PipelineStage::LoadStaging,
        PipelineStage::ValidateStaging,
        PipelineStage::TransformInsert,
        PipelineStage::ValidateInsert,
    ];

    /// The stage that must complete before this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<PipelineStage> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        index.checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Progress line logged once the stage completes.
    #[must_use]
    pub const fn completed_label(self) -> &'static str {
        match self {
            PipelineStage::ResetSchema => "Schema Reset",
            PipelineStage::LoadStaging => "Loaded to Staging",
            PipelineStage::ValidateStaging => "Staging Validated",
            PipelineStage::TransformInsert => "Inserted into Tables",
            PipelineStage::ValidateInsert => "Insert Validated",
        }
    }

    /// Check that `plan` is a non-empty run of consecutive stages.
    ///
    /// # Errors
    ///
    /// Returns `StageOrderError` if the plan is empty, skips a stage or
    /// goes backwards.
    pub fn check_plan(plan: &[PipelineStage]) -> Result<(), StageOrderError> {
        if plan.is_empty() {
            return Err(StageOrderError::Empty);
        }
        for pair in plan.windows(2) {
            if pair[1].previous() != Some(pair[0]) {
                return Err(StageOrderError::OutOfOrder {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::ResetSchema => "reset_schema",
            PipelineStage::LoadStaging => "load_staging",
            PipelineStage::ValidateStaging => "validate_staging",
            PipelineStage::TransformInsert => "transform_insert",
            PipelineStage::ValidateInsert => "validate_insert",
        };
        f.write_str(name)
    }
}
