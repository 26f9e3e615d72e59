//! Table definitions derived from CSV headers
//!
//! A [`TableSchema`] is the single ordered column list that drives table
//! creation, positional insert binding and identifier resolution in reports.

use crate::error::{Error, Result};
use crate::ident;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Column that receives NUMERIC affinity unless configured otherwise
pub const DEFAULT_NUMERIC_COLUMN: &str = "CVSS";

/// Declared SQLite type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Numeric,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Numeric => "NUMERIC",
        }
    }

    /// Map a declared type read back from `PRAGMA table_info`.
    ///
    /// Follows SQLite's affinity rules loosely: anything that would get
    /// INTEGER, REAL or NUMERIC affinity counts as numeric.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        let numeric = ["INT", "REAL", "FLOA", "DOUB", "NUM", "DEC"]
            .iter()
            .any(|marker| upper.contains(marker));

        if numeric && !upper.contains("CHAR") && !upper.contains("TEXT") {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Turn a raw header into a column name: every `.` becomes `_`.
///
/// Idempotent. Other characters are kept as-is; quoting makes them safe.
pub fn sanitize_column_name(raw: &str) -> String {
    raw.replace('.', "_")
}

/// Named table with its columns in header order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    /// Build a schema from already-sanitized columns.
    ///
    /// Rejects an empty column list and names that collide. SQLite compares
    /// column names case-insensitively, so `Host` and `host` collide too.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Result<Self> {
        let name = name.into();
        ident::quote(&name)?;

        if columns.is_empty() {
            return Err(Error::schema(format!("table '{}' has no columns", name)));
        }

        let mut seen: HashMap<String, usize> = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            ident::quote(&column.name).map_err(|_| {
                Error::schema(format!("column at position {} has an empty name", idx + 1))
            })?;

            if let Some(first) = seen.insert(column.name.to_lowercase(), idx) {
                return Err(Error::schema(format!(
                    "duplicate column name '{}' at positions {} and {}",
                    column.name,
                    first + 1,
                    idx + 1
                )));
            }
        }

        Ok(Self { name, columns })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column, exact spelling first, then case-insensitively
    pub fn column(&self, name: &str) -> Result<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| {
                Error::schema(format!(
                    "column '{}' does not exist in table '{}'",
                    name, self.name
                ))
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_ok()
    }

    pub fn last_column(&self) -> Option<&ColumnDefinition> {
        self.columns.last()
    }

    pub fn quoted_name(&self) -> Result<String> {
        ident::quote(&self.name)
    }

    /// Resolve `name` against this schema and quote the stored spelling.
    ///
    /// This is the only way report queries obtain column identifiers.
    pub fn quoted_column(&self, name: &str) -> Result<String> {
        ident::quote(&self.column(name)?.name)
    }
}

/// Derives a [`TableSchema`] from a header row
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    numeric_column: String,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self {
            numeric_column: DEFAULT_NUMERIC_COLUMN.to_string(),
        }
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numeric_column(mut self, name: impl Into<String>) -> Self {
        self.numeric_column = name.into();
        self
    }

    pub fn build(&self, table: &str, header: &[String]) -> Result<TableSchema> {
        if header.is_empty() {
            return Err(Error::schema("header row is empty"));
        }

        let columns: Vec<ColumnDefinition> = header
            .iter()
            .map(|raw| {
                let name = sanitize_column_name(raw);
                let column_type = if name == self.numeric_column {
                    ColumnType::Numeric
                } else {
                    ColumnType::Text
                };
                ColumnDefinition::new(name, column_type)
            })
            .collect();

        if !columns.iter().any(|c| c.column_type == ColumnType::Numeric) {
            warn!(
                table,
                numeric_column = %self.numeric_column,
                "Header has no numeric score column; CVSS reports will fail"
            );
        }

        TableSchema::new(table, columns)
    }
}
