//! Integration tests for the staged load.

mod common;

use common::{copy_source, RecordingWarehouse};
use sparkify_core::{PipelineStage, Table, ValidationPolicy};
use sparkify_warehouse::{run_pipeline, Checkpoint, Pipeline, RowCount, WarehouseError};

// ============================================================================
// Commit behaviour
// ============================================================================

#[tokio::test]
async fn test_full_run_commits_each_statement_and_closes() {
    let warehouse = RecordingWarehouse::new();
    let handle = warehouse.clone();

    let report = Pipeline::full()
        .with_copy_source(copy_source())
        .run(warehouse)
        .await
        .unwrap();

    assert_eq!(report.completed, PipelineStage::ALL);
    // 7 drops, 7 creates, 2 copies, 5 inserts.
    assert_eq!(report.statements, 21);
    assert_eq!(report.row_counts.len(), 7);

    let log = handle.log();
    // Statements plus the 7 counts, each committed on its own.
    assert_eq!(log.executed.len(), 28);
    assert_eq!(log.commits, 28);
    assert!(log.closed);
    assert!(!log.executed_after_close);
}

#[tokio::test]
async fn test_statements_run_in_stage_order() {
    let warehouse = RecordingWarehouse::new();
    let handle = warehouse.clone();

    Pipeline::full()
        .with_copy_source(copy_source())
        .run(warehouse)
        .await
        .unwrap();

    let log = handle.log();
    let position = |needle: &str| {
        log.executed
            .iter()
            .position(|sql| sql.contains(needle))
            .unwrap()
    };

    assert!(
        position("DROP TABLE IF EXISTS songplays") < position("DROP TABLE IF EXISTS staging_events")
    );
    assert!(
        position("DROP TABLE IF EXISTS staging_songs")
            < position("CREATE TABLE IF NOT EXISTS staging_events")
    );
    assert!(position("COPY staging_events") < position("COPY staging_songs"));
    assert!(position("SELECT COUNT(*) FROM staging_songs") < position("INSERT INTO users"));
    assert!(position("INSERT INTO time") < position("INSERT INTO songplays"));
    assert!(position("INSERT INTO songplays") < position("SELECT COUNT(*) FROM users"));
}

#[tokio::test]
async fn test_close_failure_does_not_fail_run() {
    let warehouse = RecordingWarehouse::new().failing_close();
    let handle = warehouse.clone();

    let report = Pipeline::new(&[PipelineStage::ResetSchema])
        .unwrap()
        .run(warehouse)
        .await
        .unwrap();

    assert_eq!(report.completed, [PipelineStage::ResetSchema]);
    assert!(handle.log().closed);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_staging_counts_survive_insert_failure() {
    let warehouse = RecordingWarehouse::new()
        .with_rows("staging_events", 100)
        .with_rows("staging_songs", 40)
        .failing_on("INSERT INTO users");
    let handle = warehouse.clone();

    let failure = Pipeline::full()
        .with_copy_source(copy_source())
        .run(warehouse)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::TransformInsert);
    assert!(matches!(
        failure.source,
        WarehouseError::Statement {
            table: Table::Users,
            ..
        }
    ));
    assert_eq!(
        failure.report.completed,
        [
            PipelineStage::ResetSchema,
            PipelineStage::LoadStaging,
            PipelineStage::ValidateStaging
        ]
    );

    let staged: Vec<String> = failure
        .report
        .counts_at(Checkpoint::Staged)
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        staged,
        [
            "100 rows staged to staging_events",
            "40 rows staged to staging_songs"
        ]
    );

    let log = handle.log();
    assert!(log.closed);
    assert!(!log.executed.iter().any(|sql| sql.contains("INSERT INTO songs")));
}

#[tokio::test]
async fn test_report_mode_continues_past_empty_staging() {
    let policy = ValidationPolicy {
        min_rows: 1,
        ..ValidationPolicy::default()
    };

    let report = Pipeline::load_only()
        .with_copy_source(copy_source())
        .with_validation(policy)
        .run(RecordingWarehouse::new())
        .await
        .unwrap();

    assert_eq!(report.completed, PipelineStage::LOAD);
    assert!(report.row_counts.iter().all(|count| count.rows == 0));
}

#[tokio::test]
async fn test_enforce_mode_aborts_before_inserts() {
    let policy = ValidationPolicy {
        enforce: true,
        min_rows: 1,
        ..ValidationPolicy::default()
    };
    let warehouse = RecordingWarehouse::new().with_rows("staging_events", 8056);
    let handle = warehouse.clone();

    let failure = Pipeline::load_only()
        .with_copy_source(copy_source())
        .with_validation(policy)
        .run(warehouse)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::ValidateStaging);
    assert!(matches!(
        failure.source,
        WarehouseError::ValidationFailed {
            table: Table::StagingSongs,
            rows: 0,
            ..
        }
    ));
    // The rejected counts are still reported.
    assert_eq!(
        failure.report.row_counts,
        [
            RowCount {
                table: Table::StagingEvents,
                rows: 8056,
                checkpoint: Checkpoint::Staged,
            },
            RowCount {
                table: Table::StagingSongs,
                rows: 0,
                checkpoint: Checkpoint::Staged,
            },
        ]
    );

    let log = handle.log();
    assert!(!log.executed.iter().any(|sql| sql.starts_with("INSERT")));
    assert!(log.closed);
}

#[tokio::test]
async fn test_load_without_copy_source_fails() {
    let warehouse = RecordingWarehouse::new();
    let handle = warehouse.clone();

    let failure = Pipeline::load_only().run(warehouse).await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::LoadStaging);
    assert!(matches!(failure.source, WarehouseError::Configuration(_)));
    assert!(failure.report.completed.is_empty());

    let log = handle.log();
    assert!(log.executed.is_empty());
    assert!(log.closed);
}

// ============================================================================
// Planning
// ============================================================================

#[tokio::test]
async fn test_out_of_order_plan_runs_nothing() {
    let warehouse = RecordingWarehouse::new();
    let handle = warehouse.clone();

    let failure = run_pipeline(
        warehouse,
        &[PipelineStage::ResetSchema, PipelineStage::TransformInsert],
        Some(copy_source()),
        ValidationPolicy::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.source, WarehouseError::StageOrder(_)));
    let log = handle.log();
    assert!(log.executed.is_empty());
    assert!(log.closed);
}

#[tokio::test]
async fn test_validation_only_plan() {
    let warehouse = RecordingWarehouse::new().with_rows("songplays", 319);

    let report = run_pipeline(
        warehouse,
        &[PipelineStage::ValidateInsert],
        None,
        ValidationPolicy::default(),
    )
    .await
    .unwrap();

    let songplays = report
        .counts_at(Checkpoint::Inserted)
        .find(|count| count.table == Table::Songplays)
        .unwrap();
    assert_eq!(songplays.to_string(), "319 rows inserted to songplays");
    assert_eq!(report.statements, 0);
}
