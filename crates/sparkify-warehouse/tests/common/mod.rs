//! Recording warehouse for pipeline tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sparkify_warehouse::{CopySource, Result, Warehouse, WarehouseError};

#[derive(Debug, Default)]
pub struct Log {
    /// Every statement and query, in order.
    pub executed: Vec<String>,
    pub commits: usize,
    pub closed: bool,
    pub executed_after_close: bool,
    /// Tables present after the DDL seen so far.
    pub tables: BTreeSet<String>,
    /// Row count returned per table name; missing tables count zero.
    pub row_counts: HashMap<String, u64>,
    /// Statements containing this text fail.
    pub fail_on: Option<String>,
    pub fail_close: bool,
}

/// Warehouse that records statements instead of running them.
///
/// Cloning shares the log, so a test keeps one handle after the pipeline
/// consumes the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingWarehouse {
    log: Arc<Mutex<Log>>,
}

impl RecordingWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: u64) -> Self {
        self.log
            .lock()
            .unwrap()
            .row_counts
            .insert(table.to_string(), rows);
        self
    }

    pub fn failing_on(self, pattern: &str) -> Self {
        self.log.lock().unwrap().fail_on = Some(pattern.to_string());
        self
    }

    pub fn failing_close(self) -> Self {
        self.log.lock().unwrap().fail_close = true;
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }

    fn record(&self, sql: &str) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.closed {
            log.executed_after_close = true;
        }
        log.executed.push(sql.to_string());
        if log.fail_on.as_deref().is_some_and(|p| sql.contains(p)) {
            return Err(WarehouseError::Database(format!("simulated failure: {sql}")));
        }
        log.commits += 1;
        Ok(())
    }
}

fn table_after(sql: &str, keyword: &str) -> Option<String> {
    let rest = sql.split(keyword).nth(1)?;
    rest.split(|c: char| c.is_whitespace() || c == ';' || c == '(')
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn execute_and_commit(&mut self, sql: &str) -> Result<()> {
        self.record(sql)?;
        let mut log = self.log.lock().unwrap();
        if let Some(table) = table_after(sql, "DROP TABLE IF EXISTS ") {
            log.tables.remove(&table);
        } else if let Some(table) = table_after(sql, "CREATE TABLE IF NOT EXISTS ") {
            log.tables.insert(table);
        }
        Ok(())
    }

    async fn count_rows(&mut self, sql: &str) -> Result<u64> {
        self.record(sql)?;
        let table = table_after(sql, "FROM ").unwrap_or_default();
        Ok(self
            .log
            .lock()
            .unwrap()
            .row_counts
            .get(&table)
            .copied()
            .unwrap_or(0))
    }

    async fn close(self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.closed = true;
        if log.fail_close {
            return Err(WarehouseError::Connection("simulated close failure".into()));
        }
        Ok(())
    }
}

pub fn copy_source() -> CopySource {
    CopySource {
        log_data: "s3://udacity-dend/log_data".into(),
        log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
        song_data: "s3://udacity-dend/song_data".into(),
        role_arn: "arn:aws:iam::123456789012:role/dwhRole".into(),
        region: "us-west-2".into(),
    }
}
