//! Users, time and song plays from the raw event logs.
//!
//! Only `NextSong` events count as plays. The filtered events are registered
//! as the `events` view so the time and song play tables can be expressed in
//! SQL.

use datafusion::arrow::datatypes::DataType;
use datafusion::logical_expr::Partitioning;
use datafusion::prelude::{
    col, lit, DataFrame, NdJsonReadOptions, ParquetReadOptions, SessionContext,
};
use tracing::{info, instrument};

use crate::error::Result;
use crate::location::LakeLocation;
use crate::schema::{artists_file_schema, log_schema, songs_file_schema};
use crate::tables::{OutputTable, WrittenTable};
use crate::writer::write_table;

/// Directory of the event logs under the input root.
pub const LOG_DATA_DIR: &str = "log_data";

/// Page value of an event that played a song.
pub const NEXT_SONG: &str = "NextSong";

const EVENTS_VIEW: &str = "events";
const TIME_VIEW: &str = "time_table";
const SONGS_VIEW: &str = "songs";
const ARTISTS_VIEW: &str = "artists";

// Latest record per user, so a level change leaves one row at the new level.
const USERS_SQL: &str = r#"
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT
        "userId" AS user_id,
        "firstName" AS first_name,
        "lastName" AS last_name,
        gender,
        level,
        ROW_NUMBER() OVER (PARTITION BY "userId" ORDER BY ts DESC) AS row_num
    FROM events
    WHERE "userId" IS NOT NULL
) latest
WHERE row_num = 1
"#;

const TIME_SQL: &str = r#"
SELECT
    start_time,
    CAST(date_part('hour', start_time) AS INT) AS "hour",
    CAST(date_part('day', start_time) AS INT) AS "day",
    CAST(date_part('week', start_time) AS INT) AS "week",
    CAST(date_part('month', start_time) AS INT) AS "month",
    CAST(date_part('year', start_time) AS INT) AS "year",
    to_char(start_time, '%a') AS weekday
FROM (SELECT DISTINCT to_timestamp_millis(ts) AS start_time FROM events)
"#;

// Songs and artists are matched by display name: events carry no catalog id.
const SONGPLAYS_SQL: &str = r#"
SELECT
    t.start_time,
    e."userId" AS user_id,
    e.level,
    s.song_id,
    a.artist_id,
    e."sessionId" AS session_id,
    e.location,
    e."userAgent" AS user_agent,
    t."year",
    t."month"
FROM events e
JOIN songs s ON e.song = s.title
JOIN artists a ON e.artist = a.artist_name
LEFT JOIN time_table t ON to_timestamp_millis(e.ts) = t.start_time
"#;

/// Read every `.json` event record under `input`/log_data.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a record does not
/// match the event layout.
pub async fn read_log_data(ctx: &SessionContext, input: &LakeLocation) -> Result<DataFrame> {
    let url = input.join(LOG_DATA_DIR)?;
    let schema = log_schema();
    let df = ctx
        .read_json(url.as_str(), NdJsonReadOptions::default().schema(&schema))
        .await?;
    Ok(df)
}

/// Keep only song plays.
///
/// # Errors
///
/// Returns an error if the `page` column is missing.
pub fn next_song_events(events: DataFrame) -> Result<DataFrame> {
    Ok(events.filter(col("page").eq(lit(NEXT_SONG)))?)
}

/// One row per user, taken from their most recent play.
///
/// # Errors
///
/// Returns an error if the events view is not registered.
pub async fn users_table(ctx: &SessionContext) -> Result<DataFrame> {
    Ok(ctx.sql(USERS_SQL).await?)
}

/// Register `events` as the view the time and song play queries read.
///
/// # Errors
///
/// Returns an error if the view cannot be replaced.
pub fn register_events(ctx: &SessionContext, events: DataFrame) -> Result<()> {
    replace_view(ctx, EVENTS_VIEW, events)
}

/// One row per distinct play timestamp with its calendar fields.
///
/// `start_time` is the event's millisecond epoch as a UTC timestamp. `week`
/// is the ISO week and `weekday` the abbreviated day name.
///
/// # Errors
///
/// Returns an error if the events view is not registered.
pub async fn time_table(ctx: &SessionContext) -> Result<DataFrame> {
    Ok(ctx.sql(TIME_SQL).await?)
}

/// Join plays against the written songs and artists and the time table.
///
/// Songs and artists are read back from `output`, so both must have been
/// written first. Plays with no matching song title or artist name are
/// dropped.
///
/// # Errors
///
/// Returns an error if the written tables cannot be read or the join fails.
pub async fn songplays_table(
    ctx: &SessionContext,
    time: DataFrame,
    output: &LakeLocation,
) -> Result<DataFrame> {
    replace_view(ctx, TIME_VIEW, time)?;

    let songs_schema = songs_file_schema();
    ctx.deregister_table(SONGS_VIEW)?;
    ctx.register_parquet(
        SONGS_VIEW,
        output.join(OutputTable::Songs.name())?.as_str(),
        ParquetReadOptions::default()
            .schema(&songs_schema)
            .table_partition_cols(vec![
                ("year".to_string(), DataType::Utf8),
                ("artist_id".to_string(), DataType::Utf8),
            ]),
    )
    .await?;

    let artists_schema = artists_file_schema();
    ctx.deregister_table(ARTISTS_VIEW)?;
    ctx.register_parquet(
        ARTISTS_VIEW,
        output.join(OutputTable::Artists.name())?.as_str(),
        ParquetReadOptions::default().schema(&artists_schema),
    )
    .await?;

    let partitions = ctx.copied_config().target_partitions();
    Ok(ctx
        .sql(SONGPLAYS_SQL)
        .await?
        .repartition(Partitioning::Hash(
            vec![col("year"), col("month")],
            partitions,
        ))?)
}

/// Build and write the users, time and song plays tables.
///
/// # Errors
///
/// Returns an error if reading, transforming or writing fails.
#[instrument(skip(ctx), fields(input = %input, output = %output))]
pub async fn process_log_data(
    ctx: &SessionContext,
    input: &LakeLocation,
    output: &LakeLocation,
) -> Result<Vec<WrittenTable>> {
    info!("Loading log data");
    let events = next_song_events(read_log_data(ctx, input).await?)?;
    register_events(ctx, events)?;

    let users = write_table(ctx, users_table(ctx).await?, output, OutputTable::Users).await?;

    let time = time_table(ctx).await?;
    let time_written = write_table(ctx, time.clone(), output, OutputTable::Time).await?;

    let songplays = songplays_table(ctx, time, output).await?;
    let songplays = write_table(ctx, songplays, output, OutputTable::Songplays).await?;

    Ok(vec![users, time_written, songplays])
}

fn replace_view(ctx: &SessionContext, name: &str, df: DataFrame) -> Result<()> {
    ctx.deregister_table(name)?;
    ctx.register_table(name, df.into_view())?;
    Ok(())
}
