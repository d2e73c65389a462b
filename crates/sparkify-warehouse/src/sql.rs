//! Fixed statement lists for every stage.
//!
//! Each list is ordered the way its stage must run it: drops go fact first,
//! creates go staging first, inserts go dimensions first.

use sparkify_core::{PipelineConfig, Table};

use crate::error::{Result, WarehouseError};

/// One statement and the table it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Target table.
    pub table: Table,
    /// SQL text.
    pub sql: String,
}

impl Statement {
    fn new(table: Table, sql: impl Into<String>) -> Self {
        Self {
            table,
            sql: sql.into(),
        }
    }
}

/// Where the bulk copy reads from and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource {
    /// Prefix of the raw event logs.
    pub log_data: String,
    /// JSONPaths file for the event logs.
    pub log_jsonpath: String,
    /// Prefix of the raw song catalog.
    pub song_data: String,
    /// Role the warehouse assumes to read the bucket.
    pub role_arn: String,
    /// Region of the bucket.
    pub region: String,
}

impl CopySource {
    /// Build the copy source from the storage, warehouse and aws sections.
    ///
    /// # Errors
    ///
    /// Returns `WarehouseError::Configuration` if the role ARN is not set.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let role_arn = config.warehouse.iam_role_arn.clone().ok_or_else(|| {
            WarehouseError::Configuration(
                "warehouse.iam_role_arn is not set; provision the cluster first".into(),
            )
        })?;

        Ok(Self {
            log_data: config.storage.log_data.clone(),
            log_jsonpath: config.storage.log_jsonpath.clone(),
            song_data: config.storage.song_data.clone(),
            role_arn,
            region: config.aws.region.clone(),
        })
    }
}

/// `DROP TABLE IF EXISTS` for every table, fact first.
#[must_use]
pub fn drop_statements() -> Vec<Statement> {
    Table::drop_order()
        .into_iter()
        .map(|table| Statement::new(table, format!("DROP TABLE IF EXISTS {table};")))
        .collect()
}

/// `CREATE TABLE IF NOT EXISTS` for every table, staging first.
#[must_use]
pub fn create_statements() -> Vec<Statement> {
    Table::creation_order()
        .into_iter()
        .map(|table| Statement::new(table, create_sql(table)))
        .collect()
}

/// Bulk copy into each staging table.
#[must_use]
pub fn copy_statements(source: &CopySource) -> Vec<Statement> {
    vec![
        Statement::new(
            Table::StagingEvents,
            format!(
                "COPY staging_events FROM '{}' \
                 CREDENTIALS 'aws_iam_role={}' \
                 FORMAT AS JSON '{}' \
                 STATUPDATE ON REGION '{}';",
                source.log_data, source.role_arn, source.log_jsonpath, source.region
            ),
        ),
        Statement::new(
            Table::StagingSongs,
            format!(
                "COPY staging_songs FROM '{}' \
                 CREDENTIALS 'aws_iam_role={}' \
                 FORMAT AS JSON 'auto' \
                 ACCEPTINVCHARS AS '^' \
                 STATUPDATE ON REGION '{}';",
                source.song_data, source.role_arn, source.region
            ),
        ),
    ]
}

/// Insert-from-select into each dimension, then the fact table.
#[must_use]
pub fn insert_statements() -> Vec<Statement> {
    Table::ANALYTICS
        .iter()
        .filter_map(|table| insert_sql(*table).map(|sql| Statement::new(*table, sql)))
        .collect()
}

/// `SELECT COUNT(*)` against each table.
#[must_use]
pub fn count_statements(tables: &[Table]) -> Vec<Statement> {
    tables
        .iter()
        .map(|table| Statement::new(*table, format!("SELECT COUNT(*) FROM {table};")))
        .collect()
}

fn create_sql(table: Table) -> &'static str {
    match table {
        Table::StagingEvents => {
            "CREATE TABLE IF NOT EXISTS staging_events (
                artist          VARCHAR,
                auth            VARCHAR,
                firstName       VARCHAR,
                gender          VARCHAR,
                itemInSession   INTEGER,
                lastName        VARCHAR,
                length          FLOAT,
                level           VARCHAR,
                location        VARCHAR,
                method          VARCHAR,
                page            VARCHAR,
                registration    BIGINT,
                sessionId       INTEGER,
                song            VARCHAR,
                status          INTEGER,
                ts              BIGINT,
                userAgent       VARCHAR,
                userId          INTEGER
            );"
        }
        Table::StagingSongs => {
            "CREATE TABLE IF NOT EXISTS staging_songs (
                num_songs           INTEGER,
                artist_id           VARCHAR,
                artist_latitude     FLOAT,
                artist_longitude    FLOAT,
                artist_location     VARCHAR(MAX),
                artist_name         VARCHAR(MAX),
                song_id             VARCHAR,
                title               VARCHAR(MAX),
                duration            FLOAT,
                year                INTEGER
            );"
        }
        Table::Songplays => {
            "CREATE TABLE IF NOT EXISTS songplays (
                songplay_id     INTEGER IDENTITY(0,1) PRIMARY KEY,
                start_time      TIMESTAMP NOT NULL SORTKEY DISTKEY,
                user_id         INTEGER NOT NULL,
                level           VARCHAR,
                song_id         VARCHAR NOT NULL,
                artist_id       VARCHAR NOT NULL,
                session_id      INTEGER,
                location        VARCHAR,
                user_agent      VARCHAR
            );"
        }
        Table::Users => {
            "CREATE TABLE IF NOT EXISTS users (
                user_id     INTEGER NOT NULL SORTKEY PRIMARY KEY,
                first_name  VARCHAR,
                last_name   VARCHAR,
                gender      VARCHAR,
                level       VARCHAR
            );"
        }
        Table::Songs => {
            "CREATE TABLE IF NOT EXISTS songs (
                song_id     VARCHAR NOT NULL SORTKEY PRIMARY KEY,
                title       VARCHAR(MAX) NOT NULL,
                artist_id   VARCHAR NOT NULL,
                year        INTEGER NOT NULL,
                duration    FLOAT
            );"
        }
        Table::Artists => {
            "CREATE TABLE IF NOT EXISTS artists (
                artist_id   VARCHAR NOT NULL SORTKEY PRIMARY KEY,
                name        VARCHAR(MAX),
                location    VARCHAR(MAX),
                latitude    FLOAT,
                longitude   FLOAT
            );"
        }
        Table::Time => {
            "CREATE TABLE IF NOT EXISTS time (
                start_time  TIMESTAMP NOT NULL DISTKEY SORTKEY PRIMARY KEY,
                hour        INTEGER NOT NULL,
                day         INTEGER NOT NULL,
                week        INTEGER NOT NULL,
                month       INTEGER NOT NULL,
                year        INTEGER NOT NULL,
                weekday     VARCHAR(3) NOT NULL
            );"
        }
    }
}

fn insert_sql(table: Table) -> Option<&'static str> {
    let sql = match table {
        Table::StagingEvents | Table::StagingSongs => return None,
        // Songs and artists are matched by display name: the event logs
        // carry no catalog identifier.
        Table::Songplays => {
            "INSERT INTO songplays (
                start_time, user_id, level, song_id, artist_id, session_id, location, user_agent
            )
            SELECT DISTINCT
                TIMESTAMP 'epoch' + se.ts / 1000 * INTERVAL '1 second' AS start_time,
                se.userId,
                se.level,
                ss.song_id,
                ss.artist_id,
                se.sessionId,
                se.location,
                se.userAgent
            FROM staging_events se
            JOIN staging_songs ss
                ON se.song = ss.title
                AND se.artist = ss.artist_name
            WHERE se.page = 'NextSong';"
        }
        // Redshift does not enforce primary keys, so each dimension keeps
        // one row per key. A user's row comes from their latest play.
        Table::Users => {
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
            SELECT userId, firstName, lastName, gender, level
            FROM (
                SELECT
                    userId, firstName, lastName, gender, level,
                    ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC) AS row_num
                FROM staging_events
                WHERE page = 'NextSong' AND userId IS NOT NULL
            ) latest
            WHERE row_num = 1;"
        }
        Table::Songs => {
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
            SELECT song_id, title, artist_id, year, duration
            FROM (
                SELECT
                    song_id, title, artist_id, year, duration,
                    ROW_NUMBER() OVER (PARTITION BY song_id ORDER BY year DESC) AS row_num
                FROM staging_songs
                WHERE song_id IS NOT NULL
            ) ranked
            WHERE row_num = 1;"
        }
        Table::Artists => {
            "INSERT INTO artists (artist_id, name, location, latitude, longitude)
            SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
            FROM (
                SELECT
                    artist_id, artist_name, artist_location, artist_latitude, artist_longitude,
                    ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY artist_name) AS row_num
                FROM staging_songs
                WHERE artist_id IS NOT NULL
            ) ranked
            WHERE row_num = 1;"
        }
        Table::Time => {
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
            SELECT DISTINCT
                start_time,
                EXTRACT(hour FROM start_time),
                EXTRACT(day FROM start_time),
                EXTRACT(week FROM start_time),
                EXTRACT(month FROM start_time),
                EXTRACT(year FROM start_time),
                TO_CHAR(start_time, 'Dy')
            FROM (
                SELECT TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second' AS start_time
                FROM staging_events
                WHERE page = 'NextSong'
            ) plays;"
        }
    };
    Some(sql)
}
