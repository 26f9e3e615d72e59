//! SQLite connection helpers and catalog lookups

use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, ColumnType, TableSchema};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, instrument};

/// In-memory database location accepted by [`open`]
pub const MEMORY: &str = ":memory:";

/// Open (or create) the database at `location`.
///
/// Parent directories are created as needed. `:memory:` opens a private
/// in-memory database.
#[instrument]
pub fn open(location: &str) -> Result<Connection> {
    if location != MEMORY {
        if let Some(parent) = Path::new(location).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
    }

    let conn = Connection::open(location)?;
    debug!("Opened database");
    Ok(conn)
}

/// Whether a table named `name` exists (SQLite names are case-insensitive)
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Read back the column list of an existing table.
///
/// Columns come out in declaration order, which is the order the loader
/// binds values in.
#[instrument(skip(conn))]
pub fn introspect(conn: &Connection, table: &str) -> Result<TableSchema> {
    if !table_exists(conn, table)? {
        return Err(Error::TableNotFound(table.to_string()));
    }

    let mut stmt =
        conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;

    let columns = stmt
        .query_map(params![table], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            Ok(ColumnDefinition::new(name, ColumnType::from_declared(&declared)))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(columns = columns.len(), "Introspected table");
    TableSchema::new(table, columns)
}

/// Number of rows currently in `table`
pub fn row_count(conn: &Connection, table: &str) -> Result<i64> {
    let schema = introspect(conn, table)?;
    let sql = format!("SELECT COUNT(*) FROM {}", schema.quoted_name()?);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}
