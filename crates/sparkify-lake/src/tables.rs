//! Output tables of the batch transform.

use std::fmt;

/// A table written under the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTable {
    /// Songs, partitioned by year and artist.
    Songs,
    /// Artists, unpartitioned.
    Artists,
    /// Users, unpartitioned.
    Users,
    /// Time, partitioned by year and month.
    Time,
    /// Song plays, partitioned by year and month.
    Songplays,
}

impl OutputTable {
    /// Directory name under the output root.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OutputTable::Songs => "songs",
            OutputTable::Artists => "artists",
            OutputTable::Users => "users",
            OutputTable::Time => "time",
            OutputTable::Songplays => "songplays",
        }
    }

    /// Hive partition columns, outermost first.
    #[must_use]
    pub const fn partition_columns(self) -> &'static [&'static str] {
        match self {
            OutputTable::Songs => &["year", "artist_id"],
            OutputTable::Artists | OutputTable::Users => &[],
            OutputTable::Time | OutputTable::Songplays => &["year", "month"],
        }
    }
}

impl fmt::Display for OutputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows written to one output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenTable {
    /// Table written.
    pub table: OutputTable,
    /// Rows written.
    pub rows: u64,
}

impl fmt::Display for WrittenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows written to {}", self.rows, self.table)
    }
}
