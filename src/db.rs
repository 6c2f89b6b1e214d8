//! Read-only access to the message database.
//!
//! Messages live in the `streamed_messages` table; only its `timestamp`
//! (`YYYY-MM-DD HH:MM:SS`) and `category` columns are read here.

use crate::error::Result;
use crate::{CategoryCount, Interval};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};

pub const MESSAGES_TABLE: &str = "streamed_messages";

/// Message counts per (period, category), ordered by period then category.
/// The connection is opened read-only and dropped before returning.
pub fn get_category_counts_over_time(
    db_path: &Path,
    interval: Interval,
) -> Result<Vec<CategoryCount>> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let sql = format!(
        "SELECT strftime(?1, timestamp) AS period, category, COUNT(*) AS message_count
         FROM {}
         WHERE timestamp IS NOT NULL AND category IS NOT NULL
         GROUP BY period, category
         HAVING period IS NOT NULL
         ORDER BY period, category",
        MESSAGES_TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![interval.sqlite_format()], |row| {
        Ok(CategoryCount {
            period: row.get(0)?,
            category: row.get(1)?,
            count: row.get(2)?,
        })
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    tracing::debug!(
        "fetched {} {} buckets from {}",
        counts.len(),
        interval,
        db_path.display()
    );
    Ok(counts)
}

/// Where the pipeline gets its rows from.
pub trait CategoryCountSource {
    fn category_counts(&self, interval: Interval) -> Result<Vec<CategoryCount>>;
}

/// A SQLite database file on disk.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    pub db_path: PathBuf,
}

impl SqliteSource {
    pub fn new(db_path: PathBuf) -> SqliteSource {
        SqliteSource { db_path }
    }
}

impl CategoryCountSource for SqliteSource {
    fn category_counts(&self, interval: Interval) -> Result<Vec<CategoryCount>> {
        get_category_counts_over_time(&self.db_path, interval)
    }
}
