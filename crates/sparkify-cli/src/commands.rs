//! Subcommand implementations.

use std::path::Path;

use sparkify_core::{PipelineConfig, PipelineStage, Target};
use sparkify_infra::{AwsClusterBackend, ClusterManager, ClusterRequest};
use sparkify_warehouse::{run_pipeline, CopySource, PgWarehouse};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::error::Result;
use crate::handle;

/// Load the configuration and run the chosen subcommand.
///
/// # Errors
///
/// Returns the first error the subcommand hits.
pub async fn execute(cli: &Cli) -> Result<()> {
    let mut config = PipelineConfig::load(&cli.config)?;
    handle::apply(&mut config, cli.handle.as_deref())?;
    info!(path = %cli.config.display(), "Configuration loaded");

    match &cli.command {
        Command::Provision { handle_out } => provision(&config, handle_out.as_deref()).await,
        Command::Status => status(&config).await,
        Command::Teardown => teardown(&config).await,
        Command::CreateTables => warehouse(&config, &[PipelineStage::ResetSchema]).await,
        Command::Etl => warehouse(&config, &PipelineStage::LOAD).await,
        Command::Run => warehouse(&config, &PipelineStage::ALL).await,
        Command::Lake => lake(&config).await,
    }
}

async fn cluster_manager(config: &PipelineConfig) -> ClusterManager<AwsClusterBackend> {
    let backend = AwsClusterBackend::connect(&config.aws).await;
    ClusterManager::new(backend, ClusterRequest::from_config(config))
        .with_poll_policy(config.polling.into())
}

async fn provision(config: &PipelineConfig, handle_out: Option<&Path>) -> Result<()> {
    config.validate_for(Target::Provision)?;
    let handle = cluster_manager(config).await.provision().await?;

    info!(
        endpoint = %handle.endpoint,
        role_arn = %handle.role_arn,
        "Set warehouse.host and warehouse.iam_role_arn, or pass --handle"
    );
    if let Some(path) = handle_out {
        handle::save(path, &handle)?;
    }
    Ok(())
}

async fn status(config: &PipelineConfig) -> Result<()> {
    config.validate_for(Target::Teardown)?;
    let status = cluster_manager(config).await.status().await?;
    info!(cluster_id = %config.cluster.identifier, status = %status, "Cluster status");
    Ok(())
}

async fn teardown(config: &PipelineConfig) -> Result<()> {
    config.validate_for(Target::Teardown)?;
    cluster_manager(config).await.teardown().await?;
    Ok(())
}

async fn warehouse(config: &PipelineConfig, stages: &[PipelineStage]) -> Result<()> {
    config.validate_for(Target::Warehouse)?;
    let copy_source = if stages.contains(&PipelineStage::LoadStaging) {
        Some(CopySource::from_config(config)?)
    } else {
        None
    };

    info!(connection = %config.warehouse.redacted_connection_string()?, "Connecting to warehouse");
    let warehouse = PgWarehouse::connect(&config.warehouse).await?;
    info!(
        "Connection Successful @{}:{}/{}",
        config.warehouse.host.as_deref().unwrap_or_default(),
        config.warehouse.port,
        config.warehouse.db_name
    );

    let report = run_pipeline(warehouse, stages, copy_source, config.validation.clone()).await?;
    info!(
        stages = report.completed.len(),
        statements = report.statements,
        counts = report.row_counts.len(),
        "Warehouse pipeline finished"
    );
    Ok(())
}

async fn lake(config: &PipelineConfig) -> Result<()> {
    let report = sparkify_lake::run(config).await?;
    let rows: u64 = report.written.iter().map(|written| written.rows).sum();
    info!(tables = report.written.len(), rows, "Lake transform finished");
    Ok(())
}
