//! Tables of the star schema.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a table plays in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Disposable landing copy of source records.
    Staging,
    /// Deduplicated descriptive table keyed by a natural key.
    Dimension,
    /// Event-grained table referencing dimension keys.
    Fact,
}

/// Every table the warehouse schema owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Raw event log records.
    StagingEvents,
    /// Raw song catalog records.
    StagingSongs,
    /// Song plays (fact).
    Songplays,
    /// Users (dimension).
    Users,
    /// Songs (dimension).
    Songs,
    /// Artists (dimension).
    Artists,
    /// Time (dimension).
    Time,
}

impl Table {
    /// Staging tables, in load order.
    pub const STAGING: [Table; 2] = [Table::StagingEvents, Table::StagingSongs];

    /// Dimension and fact tables in dependency order: dimensions before the fact.
    pub const ANALYTICS: [Table; 5] = [
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
        Table::Songplays,
    ];

    /// Creation order: staging, then dimensions, then the fact table.
    #[must_use]
    pub fn creation_order() -> Vec<Table> {
        Self::STAGING
            .iter()
            .chain(Self::ANALYTICS.iter())
            .copied()
            .collect()
    }

    /// Drop order, the reverse of creation order.
    #[must_use]
    pub fn drop_order() -> Vec<Table> {
        let mut tables = Self::creation_order();
        tables.reverse();
        tables
    }

    /// Table name as it appears in SQL.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Table::StagingEvents => "staging_events",
            Table::StagingSongs => "staging_songs",
            Table::Songplays => "songplays",
            Table::Users => "users",
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Time => "time",
        }
    }

    /// Role of this table.
    #[must_use]
    pub const fn kind(self) -> TableKind {
        match self {
            Table::StagingEvents | Table::StagingSongs => TableKind::Staging,
            Table::Songplays => TableKind::Fact,
            Table::Users | Table::Songs | Table::Artists | Table::Time => TableKind::Dimension,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
