//! Integration tests for the schema reset.

mod common;

use common::RecordingWarehouse;
use sparkify_core::Table;
use sparkify_warehouse::{create_tables, drop_tables, reset_schema, WarehouseError};

#[tokio::test]
async fn test_reset_creates_every_table() {
    let mut warehouse = RecordingWarehouse::new();

    let committed = reset_schema(&mut warehouse).await.unwrap();

    assert_eq!(committed, 14);
    let mut expected: Vec<String> = Table::creation_order()
        .iter()
        .map(|table| table.name().to_string())
        .collect();
    expected.sort();
    let tables: Vec<String> = warehouse.log().tables.iter().cloned().collect();
    assert_eq!(tables, expected);
}

#[tokio::test]
async fn test_reset_twice_yields_same_schema() {
    let mut warehouse = RecordingWarehouse::new();

    reset_schema(&mut warehouse).await.unwrap();
    let first = warehouse.log().tables.clone();
    reset_schema(&mut warehouse).await.unwrap();
    let second = warehouse.log().tables.clone();

    assert_eq!(first, second);
    assert_eq!(warehouse.log().commits, 28);
}

#[tokio::test]
async fn test_drop_on_empty_schema_succeeds() {
    let mut warehouse = RecordingWarehouse::new();

    assert_eq!(drop_tables(&mut warehouse).await.unwrap(), 7);
    assert!(warehouse.log().tables.is_empty());
}

#[tokio::test]
async fn test_create_stops_at_first_failure() {
    let mut warehouse = RecordingWarehouse::new().failing_on("CREATE TABLE IF NOT EXISTS users");

    let err = create_tables(&mut warehouse).await.unwrap_err();

    assert!(matches!(
        err,
        WarehouseError::Statement {
            table: Table::Users,
            ..
        }
    ));
    let log = warehouse.log();
    // Staging tables were created before the failure and stay created.
    assert!(log.tables.contains("staging_events"));
    assert!(log.tables.contains("staging_songs"));
    assert!(!log.tables.contains("songplays"));
}
