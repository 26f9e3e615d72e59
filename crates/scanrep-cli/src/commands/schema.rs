//! `scanrep schema` command implementation

use super::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use scanrep_core::{store, TableSchema};
use tracing::info;

/// Run the schema command
pub async fn run(config: Config) -> Result<()> {
    info!(table = %config.table, "Running schema command");

    let (schema, rows) = tokio::task::spawn_blocking(move || {
        let conn = open_store(&config)?;
        let schema = store::introspect(&conn, &config.table).map_err(CliError::from_core)?;
        let rows = store::row_count(&conn, &config.table).map_err(CliError::from_core)?;
        Ok::<_, CliError>((schema, rows))
    })
    .await??;

    println!("{}", format!("Table '{}':", schema.name()).cyan().bold());
    print!("{}", format_schema(&schema));
    println!("  Rows: {}", rows);
    Ok(())
}

/// Columns as a table: position, name, declared type
pub fn format_schema(schema: &TableSchema) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["#", "Column", "Type"]);

    for (idx, column) in schema.columns().iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            column.name.clone(),
            column.column_type.to_string(),
        ]);
    }

    format!("{}\n", table)
}
