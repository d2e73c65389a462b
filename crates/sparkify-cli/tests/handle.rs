//! Cluster handle files.

use chrono::{TimeZone, Utc};
use sparkify_cli::{handle, CliError};
use sparkify_core::PipelineConfig;
use sparkify_infra::ClusterHandle;
use tempfile::TempDir;

fn sample_handle() -> ClusterHandle {
    ClusterHandle {
        cluster_id: "dwhCluster".into(),
        endpoint: "dwhcluster.abc123.us-west-2.redshift.amazonaws.com".into(),
        port: Some(5439),
        role_arn: "arn:aws:iam::123456789012:role/dwhRole".into(),
        provisioned_at: Utc.with_ymd_and_hms(2018, 11, 9, 0, 2, 27).unwrap(),
    }
}

#[test]
fn test_saved_handle_points_config_at_cluster() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cluster.json");
    handle::save(&path, &sample_handle()).unwrap();

    let mut config = PipelineConfig::default();
    assert!(config.warehouse.host.is_none());
    handle::apply(&mut config, Some(&path)).unwrap();

    assert_eq!(
        config.warehouse.host.as_deref(),
        Some("dwhcluster.abc123.us-west-2.redshift.amazonaws.com")
    );
    assert_eq!(
        config.warehouse.iam_role_arn.as_deref(),
        Some("arn:aws:iam::123456789012:role/dwhRole")
    );
    assert_eq!(handle::load(&path).unwrap(), sample_handle());
}

#[test]
fn test_no_handle_leaves_config_alone() {
    let mut config = PipelineConfig::default();
    config.warehouse.host = Some("configured.example.com".into());

    handle::apply(&mut config, None).unwrap();

    assert_eq!(config.warehouse.host.as_deref(), Some("configured.example.com"));
}

#[test]
fn test_unreadable_handle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json");

    let err = handle::load(&path).unwrap_err();
    assert!(matches!(err, CliError::Handle { .. }));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        handle::load(&path),
        Err(CliError::Handle { .. })
    ));
}
