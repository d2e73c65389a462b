//! Songs and artists from the raw song catalog.

use datafusion::prelude::{DataFrame, NdJsonReadOptions, SessionContext};
use tracing::{info, instrument};

use crate::error::Result;
use crate::location::LakeLocation;
use crate::schema::song_schema;
use crate::tables::{OutputTable, WrittenTable};
use crate::writer::write_table;

/// Directory of the song catalog under the input root.
pub const SONG_DATA_DIR: &str = "song_data";

/// Read every `.json` catalog record under `input`/song_data.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a record does not
/// match the catalog layout.
pub async fn read_song_data(ctx: &SessionContext, input: &LakeLocation) -> Result<DataFrame> {
    let url = input.join(SONG_DATA_DIR)?;
    let schema = song_schema();
    let df = ctx
        .read_json(url.as_str(), NdJsonReadOptions::default().schema(&schema))
        .await?;
    Ok(df)
}

/// One row per distinct song.
///
/// # Errors
///
/// Returns an error if a catalog column is missing.
pub fn songs_table(catalog: DataFrame) -> Result<DataFrame> {
    Ok(catalog
        .select_columns(&["song_id", "title", "artist_id", "year", "duration"])?
        .distinct()?)
}

/// One row per distinct artist.
///
/// # Errors
///
/// Returns an error if a catalog column is missing.
pub fn artists_table(catalog: DataFrame) -> Result<DataFrame> {
    Ok(catalog
        .select_columns(&[
            "artist_id",
            "artist_name",
            "artist_location",
            "artist_latitude",
            "artist_longitude",
        ])?
        .distinct()?)
}

/// Build and write the songs and artists tables.
///
/// # Errors
///
/// Returns an error if reading, transforming or writing fails.
#[instrument(skip(ctx), fields(input = %input, output = %output))]
pub async fn process_song_data(
    ctx: &SessionContext,
    input: &LakeLocation,
    output: &LakeLocation,
) -> Result<Vec<WrittenTable>> {
    info!("Loading song data");
    let catalog = read_song_data(ctx, input).await?;

    let songs = write_table(ctx, songs_table(catalog.clone())?, output, OutputTable::Songs).await?;
    let artists = write_table(ctx, artists_table(catalog)?, output, OutputTable::Artists).await?;

    Ok(vec![songs, artists])
}
