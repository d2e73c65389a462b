//! Argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Provision the warehouse cluster, load it, or transform the lake.
#[derive(Debug, Parser)]
#[command(name = "sparkify", version, about)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "SPARKIFY_CONFIG", default_value = "dwh.json")]
    pub config: PathBuf,

    /// Cluster handle saved by `provision`; supplies the host and role ARN.
    #[arg(long, global = true, env = "SPARKIFY_HANDLE")]
    pub handle: Option<PathBuf>,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create the access role and the cluster, and wait until it is available.
    Provision {
        /// Write the cluster handle to this file.
        #[arg(long)]
        handle_out: Option<PathBuf>,
    },
    /// Print the cluster status.
    Status,
    /// Delete the cluster, wait until it is gone, then delete the role.
    Teardown,
    /// Drop and recreate every warehouse table.
    CreateTables,
    /// Load staging, transform into the star schema, and count rows.
    Etl,
    /// Reset the schema, then run every load stage.
    Run,
    /// Transform the raw JSON records into partitioned Parquet tables.
    Lake,
}
