//! Row-count checkpoints.

use std::fmt;

use sparkify_core::{Table, ValidationPolicy};
use tracing::{info, warn};

use crate::error::{Result, WarehouseError};

/// Which checkpoint a count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// After the bulk copy into staging.
    Staged,
    /// After the transform into dimension and fact tables.
    Inserted,
}

/// Rows found in one table at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCount {
    /// Table counted.
    pub table: Table,
    /// Rows found.
    pub rows: u64,
    /// Checkpoint the count was taken at.
    pub checkpoint: Checkpoint,
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.checkpoint {
            Checkpoint::Staged => "staged",
            Checkpoint::Inserted => "inserted",
        };
        write!(f, "{} rows {verb} to {}", self.rows, self.table)
    }
}

/// Log every count and apply the policy.
///
/// All counts are logged before any shortfall is reported.
///
/// # Errors
///
/// Returns `WarehouseError::ValidationFailed` for the first shortfall if the
/// policy enforces.
pub(crate) fn apply_policy(counts: &[RowCount], policy: &ValidationPolicy) -> Result<()> {
    let mut first_failure = None;

    for count in counts {
        info!(table = %count.table, rows = count.rows, "{count}");

        if let Some(reason) = policy.evaluate(count.table.name(), count.rows) {
            warn!(
                table = %count.table,
                rows = count.rows,
                reason = %reason,
                "Row count check failed"
            );
            if first_failure.is_none() {
                first_failure = Some(WarehouseError::ValidationFailed {
                    table: count.table,
                    rows: count.rows,
                    reason,
                });
            }
        }
    }

    match first_failure {
        Some(err) if policy.enforce => Err(err),
        _ => Ok(()),
    }
}
