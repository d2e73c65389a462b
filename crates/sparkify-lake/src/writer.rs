//! Overwrite-mode Parquet writes.

use datafusion::arrow::array::RecordBatch;
use datafusion::arrow::datatypes::DataType;
use datafusion::common::cast::as_uint64_array;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::prelude::{cast, col, DataFrame, SessionContext};
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{debug, info};

use crate::error::Result;
use crate::location::LakeLocation;
use crate::tables::{OutputTable, WrittenTable};

/// Replace `table` under `output` with the rows of `df`.
///
/// Everything under the table's directory is deleted first. Partition
/// columns are written as Hive-style directory names.
///
/// # Errors
///
/// Returns an error if clearing the directory or writing fails.
pub async fn write_table(
    ctx: &SessionContext,
    df: DataFrame,
    output: &LakeLocation,
    table: OutputTable,
) -> Result<WrittenTable> {
    let url = output.join(table.name())?;
    let store = ctx.runtime_env().object_store_registry.get_store(&url)?;
    let removed = clear_prefix(store.as_ref(), &output.prefix(table.name())?).await?;
    debug!(table = %table, removed, "Cleared previous output");

    let partition_by: Vec<String> = table
        .partition_columns()
        .iter()
        .map(ToString::to_string)
        .collect();

    // Directory names are text whatever the column type.
    let mut df = df;
    for column in &partition_by {
        df = df.with_column(column, cast(col(column.as_str()), DataType::Utf8))?;
    }

    let batches = df
        .write_parquet(
            url.as_str(),
            DataFrameWriteOptions::new().with_partition_by(partition_by),
            None,
        )
        .await?;

    let written = WrittenTable {
        table,
        rows: written_rows(&batches)?,
    };
    info!(table = %table, rows = written.rows, location = %url, "{written}");
    Ok(written)
}

/// Delete every object under `prefix`. Returns how many were deleted.
pub(crate) async fn clear_prefix(store: &dyn ObjectStore, prefix: &ObjectPath) -> Result<usize> {
    let locations = store
        .list(Some(prefix))
        .map_ok(|meta| meta.location)
        .boxed();

    match store.delete_stream(locations).try_collect::<Vec<_>>().await {
        Ok(deleted) => Ok(deleted.len()),
        Err(object_store::Error::NotFound { .. }) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn written_rows(batches: &[RecordBatch]) -> Result<u64> {
    let mut rows = 0;
    for batch in batches.iter().filter(|batch| batch.num_columns() > 0) {
        rows += as_uint64_array(batch.column(0))?.iter().flatten().sum::<u64>();
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    async fn put_text(store: &dyn ObjectStore, path: &str, text: &'static str) {
        store
            .put(&ObjectPath::from(path), PutPayload::from_static(text.as_bytes()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_prefix_only_touches_the_table() {
        let store = InMemory::new();
        put_text(&store, "out/songs/year=2018/a.parquet", "a").await;
        put_text(&store, "out/songs/year=2019/b.parquet", "b").await;
        put_text(&store, "out/songplays/c.parquet", "c").await;

        let removed = clear_prefix(&store, &ObjectPath::from("out/songs"))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        let left: Vec<_> = store
            .list(Some(&ObjectPath::from("out")))
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(left, ["out/songplays/c.parquet"]);
    }

    #[tokio::test]
    async fn test_clear_missing_prefix() {
        let store = InMemory::new();
        let removed = clear_prefix(&store, &ObjectPath::from("out/users"))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
