//! Bulk loading of parsed scan rows into SQLite
//!
//! All ingestion goes through [`Loader`]: read the file, derive the schema,
//! create the table if needed, then insert every data row inside a single
//! transaction with one prepared, positionally-bound statement.

use crate::error::{Error, Result};
use crate::ident;
use crate::reader::{RawRecord, ScanFile, TabularReader};
use crate::schema::{SchemaBuilder, TableSchema};
use crate::store;
use rusqlite::{params_from_iter, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// What to do when the target table is already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the existing table untouched and append into it
    #[default]
    SkipIfExists,
    /// Refuse to load
    FailIfExists,
}

/// Outcome of a successful load
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub table: String,
    /// `false` when the table already existed
    pub created: bool,
    pub rows_inserted: usize,
    pub schema: TableSchema,
}

/// `CREATE TABLE IF NOT EXISTS` statement for `schema`, columns in order
pub fn create_table_sql(schema: &TableSchema) -> Result<String> {
    let columns = schema
        .columns()
        .iter()
        .map(|c| Ok(format!("{} {}", ident::quote(&c.name)?, c.column_type.as_sql())))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.quoted_name()?,
        columns.join(", ")
    ))
}

/// Insert statement with one numbered placeholder per column
pub fn insert_sql(schema: &TableSchema) -> Result<String> {
    let placeholders = (1..=schema.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.quoted_name()?,
        ident::quote_list(schema.column_names())?,
        placeholders
    ))
}

/// Create the table for `schema` unless it exists.
///
/// Returns whether the table was created. An existing table is never
/// altered; if its shape does not match, the inserts fail later with the
/// store's own error.
#[instrument(skip(conn, schema), fields(table = %schema.name()))]
pub fn ensure_table(conn: &Connection, schema: &TableSchema, policy: ConflictPolicy) -> Result<bool> {
    if store::table_exists(conn, schema.name())? {
        return match policy {
            ConflictPolicy::FailIfExists => Err(Error::TableExists(schema.name().to_string())),
            ConflictPolicy::SkipIfExists => {
                info!("Table already exists, reusing it");
                Ok(false)
            },
        };
    }

    let sql = create_table_sql(schema)?;
    debug!(sql = %sql, "Creating table");
    conn.execute(&sql, [])?;
    info!(columns = schema.len(), "Created table");
    Ok(true)
}

/// Insert `rows` in one transaction, all or nothing.
pub fn load_rows(conn: &mut Connection, schema: &TableSchema, rows: &[RawRecord]) -> Result<usize> {
    load_rows_with(conn, schema, rows, |_| {})
}

/// [`load_rows`] with a callback invoked after each inserted row
#[instrument(skip_all, fields(table = %schema.name(), rows = rows.len()))]
pub fn load_rows_with<F>(
    conn: &mut Connection,
    schema: &TableSchema,
    rows: &[RawRecord],
    mut on_row: F,
) -> Result<usize>
where
    F: FnMut(usize),
{
    let sql = insert_sql(schema)?;
    debug!(sql = %sql, "Prepared insert");

    let tx = conn.transaction()?;
    match insert_all(&tx, &sql, schema.len(), rows, &mut on_row) {
        Ok(affected) => {
            tx.commit()?;
            info!(affected, "Committed rows");
            Ok(affected)
        },
        Err(err) => {
            error!(error = %err, "Load failed, rolling back");
            if let Err(rollback) = tx.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(err)
        },
    }
}

fn insert_all<F>(
    tx: &Transaction<'_>,
    sql: &str,
    width: usize,
    rows: &[RawRecord],
    on_row: &mut F,
) -> Result<usize>
where
    F: FnMut(usize),
{
    let mut stmt = tx.prepare(sql)?;
    let mut affected = 0;

    for (idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::MalformedRow {
                row: idx,
                expected: width,
                found: row.len(),
            });
        }

        affected += stmt
            .execute(params_from_iter(row.iter()))
            .map_err(|source| Error::Insert { row: idx, source })?;
        on_row(idx);
    }

    Ok(affected)
}

/// Replace NULL with `''` in every column of `table`.
///
/// Tables filled by [`Loader`] never hold NULLs; this is for tables that were
/// populated or extended by other tools. Returns the number of rows touched.
#[instrument(skip(conn))]
pub fn fill_nulls(conn: &Connection, table: &str) -> Result<usize> {
    let schema = store::introspect(conn, table)?;
    let assignments = schema
        .columns()
        .iter()
        .map(|c| {
            let col = ident::quote(&c.name)?;
            Ok(format!("{col} = COALESCE({col}, '')"))
        })
        .collect::<Result<Vec<_>>>()?;

    let sql = format!("UPDATE {} SET {}", schema.quoted_name()?, assignments.join(", "));
    debug!(sql = %sql, "Filling NULLs");
    let changed = conn.execute(&sql, [])?;
    info!(changed, "Replaced NULLs with empty strings");
    Ok(changed)
}

/// Single entry point for every CSV ingestion path
#[derive(Debug, Clone)]
pub struct Loader {
    table: String,
    policy: ConflictPolicy,
    schema_builder: SchemaBuilder,
    reader: TabularReader,
}

impl Loader {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            policy: ConflictPolicy::default(),
            schema_builder: SchemaBuilder::default(),
            reader: TabularReader::default(),
        }
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn numeric_column(mut self, name: impl Into<String>) -> Self {
        self.schema_builder = self.schema_builder.numeric_column(name);
        self
    }

    pub fn reader(mut self, reader: TabularReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Read `path` and load it. Returns the parsed file alongside the summary
    /// so callers can also render the raw rows.
    #[instrument(skip(self, conn, path), fields(table = %self.table, path = %path.display()))]
    pub fn load_file(&self, conn: &mut Connection, path: &Path) -> Result<(ScanFile, LoadSummary)> {
        let scan = self.reader.read_scan_file(path)?;
        let summary = self.load_scan(conn, &scan)?;
        Ok((scan, summary))
    }

    pub fn load_scan(&self, conn: &mut Connection, scan: &ScanFile) -> Result<LoadSummary> {
        self.load_scan_with(conn, scan, |_| {})
    }

    pub fn load_scan_with<F>(
        &self,
        conn: &mut Connection,
        scan: &ScanFile,
        on_row: F,
    ) -> Result<LoadSummary>
    where
        F: FnMut(usize),
    {
        let schema = self.schema_builder.build(&self.table, &scan.header)?;
        let created = ensure_table(conn, &schema, self.policy)?;
        let rows_inserted = load_rows_with(conn, &schema, &scan.rows, on_row)?;

        Ok(LoadSummary {
            table: self.table.clone(),
            created,
            rows_inserted,
            schema,
        })
    }
}
