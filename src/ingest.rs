//! Ingestion Pipeline
//!
//! Hands raw delimited text to the query engine, creates one named table,
//! reads it back in full, and returns an owned `Table`. The table handle is
//! threaded explicitly through subsequent calls; there is no ambient
//! "current table" state. A new ingestion simply replaces the caller's
//! previous `Table` value.

use crate::engine::QueryEngine;
use crate::error::Result;
use crate::schema;
use crate::store::TableStore;
use crate::table::Table;
use tracing::{info, warn};

/// Default table name used for a single-file workflow.
pub const DEFAULT_TABLE_NAME: &str = "csv_data";

/// Register `raw_text` with the engine under `table_name` and read the table
/// back in full.
///
/// Input is UTF-8 delimited text with the first row as header; the engine
/// auto-detects column types. On a malformed input the engine error is
/// surfaced as-is and no `Table` is returned, so the caller's previous table
/// (if any) stays untouched. The full-row read preserves source row order.
pub async fn ingest_text(
    engine: &dyn QueryEngine,
    table_name: &str,
    raw_text: &str,
) -> Result<Table> {
    info!(
        "ingesting {} bytes into table '{}'",
        raw_text.len(),
        table_name
    );
    engine.create_table_from_text(table_name, raw_text).await?;

    let output = match engine
        .query(&format!("SELECT * FROM \"{}\"", table_name))
        .await
    {
        Ok(output) => output,
        Err(e) => {
            // a failed read-back must not leave the half-created table
            // visible to later queries
            if let Err(drop_err) = engine.drop_table(table_name).await {
                warn!(
                    "dropping half-created table '{}' failed: {}",
                    table_name, drop_err
                );
            }
            return Err(e);
        }
    };
    let columns = schema::columns_from_fields(&output.fields);
    info!(
        "ingested table '{}': {} columns, {} rows",
        table_name,
        columns.len(),
        output.rows.len()
    );
    Ok(Table::new(table_name, columns, output.rows))
}

/// Re-feed a stored entry through the ingestion path.
pub async fn ingest_stored_entry(
    engine: &dyn QueryEngine,
    store: &TableStore,
    entry_name: &str,
    table_name: &str,
) -> Result<Table> {
    let entry = store.load(entry_name).await?;
    ingest_text(engine, table_name, &entry.raw_text).await
}
