//! Staged load from the bucket into the star schema.

use sparkify_core::{PipelineStage, Progress, Table, ValidationPolicy};
use tracing::{info, instrument, warn};

use crate::error::{Result, StageFailure, WarehouseError};
use crate::schema::reset_schema;
use crate::sql::{copy_statements, count_statements, insert_statements, CopySource};
use crate::validation::{apply_policy, Checkpoint, RowCount};
use crate::warehouse::{execute_all, Warehouse};

/// Bulk-copy the raw records into both staging tables.
///
/// # Errors
///
/// Returns an error for the first copy that fails.
pub async fn load_staging<W: Warehouse>(warehouse: &mut W, source: &CopySource) -> Result<usize> {
    info!(log_data = %source.log_data, song_data = %source.song_data, "Loading to staging");
    execute_all(warehouse, &copy_statements(source)).await
}

/// Count rows in both staging tables.
///
/// # Errors
///
/// Returns an error if a count fails, or if the policy enforces and a
/// count falls short.
pub async fn validate_staging<W: Warehouse>(
    warehouse: &mut W,
    policy: &ValidationPolicy,
) -> Result<Vec<RowCount>> {
    let counts = count_tables(warehouse, &Table::STAGING, Checkpoint::Staged).await?;
    apply_policy(&counts, policy)?;
    Ok(counts)
}

/// Populate the dimension tables, then the fact table, from staging.
///
/// # Errors
///
/// Returns an error for the first insert that fails.
pub async fn transform_insert<W: Warehouse>(warehouse: &mut W) -> Result<usize> {
    execute_all(warehouse, &insert_statements()).await
}

/// Count rows in every dimension and fact table.
///
/// # Errors
///
/// Returns an error if a count fails, or if the policy enforces and a
/// count falls short.
pub async fn validate_insert<W: Warehouse>(
    warehouse: &mut W,
    policy: &ValidationPolicy,
) -> Result<Vec<RowCount>> {
    let counts = count_tables(warehouse, &Table::ANALYTICS, Checkpoint::Inserted).await?;
    apply_policy(&counts, policy)?;
    Ok(counts)
}

async fn count_tables<W: Warehouse>(
    warehouse: &mut W,
    tables: &[Table],
    checkpoint: Checkpoint,
) -> Result<Vec<RowCount>> {
    let mut counts = Vec::with_capacity(tables.len());
    for statement in count_statements(tables) {
        let rows = warehouse
            .count_rows(&statement.sql)
            .await
            .map_err(|e| WarehouseError::Statement {
                table: statement.table,
                message: e.to_string(),
            })?;
        counts.push(RowCount {
            table: statement.table,
            rows,
            checkpoint,
        });
    }
    Ok(counts)
}

/// What a pipeline run got through.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Stages that completed, in order.
    pub completed: Vec<PipelineStage>,
    /// Every row count gathered by the validation stages.
    pub row_counts: Vec<RowCount>,
    /// Statements committed by the non-validation stages.
    pub statements: usize,
}

impl PipelineReport {
    /// Row counts taken at one checkpoint.
    pub fn counts_at(&self, checkpoint: Checkpoint) -> impl Iterator<Item = &RowCount> {
        self.row_counts
            .iter()
            .filter(move |count| count.checkpoint == checkpoint)
    }
}

/// A plan of consecutive stages run against one warehouse session.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
    copy_source: Option<CopySource>,
    policy: ValidationPolicy,
}

impl Pipeline {
    /// Plan the given stages.
    ///
    /// # Errors
    ///
    /// Returns `WarehouseError::StageOrder` if the stages are empty, skip a
    /// stage or run out of order.
    pub fn new(stages: &[PipelineStage]) -> Result<Self> {
        PipelineStage::check_plan(stages)?;
        Ok(Self {
            stages: stages.to_vec(),
            copy_source: None,
            policy: ValidationPolicy::default(),
        })
    }

    /// Reset the schema and run every load stage.
    #[must_use]
    pub fn full() -> Self {
        Self::from_valid_plan(&PipelineStage::ALL)
    }

    /// Run the load stages against the existing schema.
    #[must_use]
    pub fn load_only() -> Self {
        Self::from_valid_plan(&PipelineStage::LOAD)
    }

    fn from_valid_plan(stages: &[PipelineStage]) -> Self {
        Self {
            stages: stages.to_vec(),
            copy_source: None,
            policy: ValidationPolicy::default(),
        }
    }

    /// Set where the bulk copy reads from.
    #[must_use]
    pub fn with_copy_source(mut self, source: CopySource) -> Self {
        self.copy_source = Some(source);
        self
    }

    /// Set the row-count policy for the validation stages.
    #[must_use]
    pub fn with_validation(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The planned stages.
    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Run every planned stage in order, then close the session.
    ///
    /// The session is closed whether or not a stage fails. A failure while
    /// closing is logged and does not change the outcome.
    ///
    /// # Errors
    ///
    /// Returns a `StageFailure` naming the stage that aborted, together with
    /// the report of the stages that completed before it.
    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn run<W: Warehouse>(
        &self,
        mut warehouse: W,
    ) -> std::result::Result<PipelineReport, StageFailure> {
        let total = u32::try_from(self.stages.len() + 1).unwrap_or(u32::MAX);
        let mut progress = Progress::new(total);
        let mut report = PipelineReport::default();
        let mut failure = None;

        for &stage in &self.stages {
            match self.run_stage(stage, &mut warehouse, &mut report).await {
                Ok(()) => {
                    report.completed.push(stage);
                    progress.advance(stage.completed_label());
                }
                Err(source) => {
                    warn!(stage = %stage, error = %source, "Stage failed");
                    failure = Some((stage, source));
                    break;
                }
            }
        }

        match warehouse.close().await {
            Ok(()) => {
                progress.advance("Connection Closed");
            }
            Err(e) => warn!(error = %e, "Failed to close warehouse connection"),
        }

        match failure {
            Some((stage, source)) => Err(StageFailure {
                stage,
                report,
                source,
            }),
            None => Ok(report),
        }
    }

    async fn run_stage<W: Warehouse>(
        &self,
        stage: PipelineStage,
        warehouse: &mut W,
        report: &mut PipelineReport,
    ) -> Result<()> {
        match stage {
            PipelineStage::ResetSchema => {
                report.statements += reset_schema(warehouse).await?;
            }
            PipelineStage::LoadStaging => {
                let source = self.copy_source.as_ref().ok_or_else(|| {
                    WarehouseError::Configuration("no copy source for load_staging".into())
                })?;
                report.statements += load_staging(warehouse, source).await?;
            }
            PipelineStage::ValidateStaging => {
                // Counts are kept even when the policy rejects them.
                let counts =
                    count_tables(warehouse, &Table::STAGING, Checkpoint::Staged).await?;
                report.row_counts.extend_from_slice(&counts);
                apply_policy(&counts, &self.policy)?;
            }
            PipelineStage::TransformInsert => {
                report.statements += transform_insert(warehouse).await?;
            }
            PipelineStage::ValidateInsert => {
                let counts =
                    count_tables(warehouse, &Table::ANALYTICS, Checkpoint::Inserted).await?;
                report.row_counts.extend_from_slice(&counts);
                apply_policy(&counts, &self.policy)?;
            }
        }
        Ok(())
    }
}

/// Plan and run `stages` in one call.
///
/// # Errors
///
/// Returns a `StageFailure` if the plan is invalid or a stage aborts. An
/// invalid plan is reported against its first stage and the session is
/// closed without running anything.
pub async fn run_pipeline<W: Warehouse>(
    warehouse: W,
    stages: &[PipelineStage],
    copy_source: Option<CopySource>,
    policy: ValidationPolicy,
) -> std::result::Result<PipelineReport, StageFailure> {
    let pipeline = match Pipeline::new(stages) {
        Ok(pipeline) => pipeline,
        Err(source) => {
            if let Err(e) = warehouse.close().await {
                warn!(error = %e, "Failed to close warehouse connection");
            }
            return Err(StageFailure {
                stage: stages.first().copied().unwrap_or(PipelineStage::ResetSchema),
                report: PipelineReport::default(),
                source,
            });
        }
    };

    let pipeline = match copy_source {
        Some(source) => pipeline.with_copy_source(source),
        None => pipeline,
    };
    pipeline.with_validation(policy).run(warehouse).await
}
