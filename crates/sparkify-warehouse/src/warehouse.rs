//! Warehouse connection.

use async_trait::async_trait;
use sparkify_core::WarehouseParams;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor};
use tracing::{debug, info};

use crate::error::{Result, WarehouseError};
use crate::sql::Statement;

/// A single warehouse session.
///
/// Each call runs in its own transaction and commits before returning. The
/// session is used by one stage at a time and is never shared.
#[async_trait]
pub trait Warehouse: Send {
    /// Execute a statement and commit it.
    async fn execute_and_commit(&mut self, sql: &str) -> Result<()>;

    /// Run a `SELECT COUNT(*)` query and commit.
    async fn count_rows(&mut self, sql: &str) -> Result<u64>;

    /// Close the session.
    async fn close(self) -> Result<()>;
}

/// Execute and commit each statement in order, stopping at the first failure.
///
/// Returns the number of statements committed.
pub(crate) async fn execute_all<W: Warehouse>(
    warehouse: &mut W,
    statements: &[Statement],
) -> Result<usize> {
    for statement in statements {
        debug!(table = %statement.table, "Executing statement");
        warehouse
            .execute_and_commit(&statement.sql)
            .await
            .map_err(|e| WarehouseError::Statement {
                table: statement.table,
                message: e.to_string(),
            })?;
    }
    Ok(statements.len())
}

/// Warehouse session over the Postgres wire protocol.
#[derive(Debug)]
pub struct PgWarehouse {
    conn: PgConnection,
}

impl PgWarehouse {
    /// Connect using the warehouse section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unknown or the connection fails.
    pub async fn connect(params: &WarehouseParams) -> Result<Self> {
        let host = params.host.as_deref().ok_or_else(|| {
            WarehouseError::Configuration(
                "warehouse.host is not set; provision the cluster first".into(),
            )
        })?;

        let options = PgConnectOptions::new()
            .host(host)
            .port(params.port)
            .username(&params.db_user)
            .password(&params.db_password)
            .database(&params.db_name);

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;

        info!(
            host = %host,
            port = params.port,
            db = %params.db_name,
            "Connected to warehouse"
        );
        Ok(Self { conn })
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn execute_and_commit(&mut self, sql: &str) -> Result<()> {
        let mut tx = self.conn.begin().await?;
        // Unprepared: COPY and DDL cannot go through the extended protocol.
        let result = (&mut *tx).execute(sqlx::raw_sql(sql)).await?;
        tx.commit().await?;
        debug!(rows_affected = result.rows_affected(), "Statement committed");
        Ok(())
    }

    async fn count_rows(&mut self, sql: &str) -> Result<u64> {
        let mut tx = self.conn.begin().await?;
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        u64::try_from(count)
            .map_err(|_| WarehouseError::Database(format!("negative row count {count}")))
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| WarehouseError::Connection(e.to_string()))
    }
}
