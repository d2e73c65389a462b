//! Schema reset.
//!
//! There is no transaction around the whole reset. Every drop and create
//! commits on its own, so a failure part-way leaves some tables recreated
//! and some missing; rerunning the reset repairs it.

use tracing::info;

use crate::error::Result;
use crate::sql::{create_statements, drop_statements};
use crate::warehouse::{execute_all, Warehouse};

/// Drop every table, fact first.
///
/// # Errors
///
/// Returns an error for the first statement that fails.
pub async fn drop_tables<W: Warehouse>(warehouse: &mut W) -> Result<usize> {
    let dropped = execute_all(warehouse, &drop_statements()).await?;
    info!(tables = dropped, "Existing tables dropped");
    Ok(dropped)
}

/// Create every table, staging first.
///
/// # Errors
///
/// Returns an error for the first statement that fails.
pub async fn create_tables<W: Warehouse>(warehouse: &mut W) -> Result<usize> {
    let created = execute_all(warehouse, &create_statements()).await?;
    info!(tables = created, "Tables created");
    Ok(created)
}

/// Drop and recreate the whole schema.
///
/// Returns the number of statements committed.
///
/// # Errors
///
/// Returns an error for the first statement that fails.
pub async fn reset_schema<W: Warehouse>(warehouse: &mut W) -> Result<usize> {
    let dropped = drop_tables(warehouse).await?;
    let created = create_tables(warehouse).await?;
    Ok(dropped + created)
}
