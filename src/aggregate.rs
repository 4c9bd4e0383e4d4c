//! Aggregation Pipeline
//!
//! Computes the arithmetic mean of each numeric column and appends the result
//! as one synthetic summary row. Non-numeric columns in that row carry the
//! fixed sentinel label instead of an aggregate. The summary row shares the
//! table's column set, is always exactly one row, and is always last.

use crate::engine::QueryEngine;
use crate::error::Result;
use crate::schema::{Column, ColumnKind};
use crate::table::{Row, Table, Value};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, info};

/// Sentinel written into non-numeric columns of the synthetic summary row.
/// Display text only; the summary row itself is tracked by the table's
/// `has_summary` flag, never by matching cell content.
pub const AVERAGE_LABEL: &str = "平均";

fn summary_row(columns: &[Column], means: &HashMap<String, f64>) -> Row {
    let values = columns
        .iter()
        .map(|c| match c.kind {
            ColumnKind::Number => Value::Num(*means.get(&c.field).unwrap_or(&0.0)),
            _ => Value::Str(AVERAGE_LABEL.to_string()),
        })
        .collect();
    Row::new(values)
}

fn normalize(mean: f64) -> f64 {
    // 0/0 over an empty table; display as 0 rather than NaN
    if mean.is_finite() {
        mean
    } else {
        0.0
    }
}

fn push_summary(table: &mut Table, means: HashMap<String, f64>) {
    // appending twice replaces the previous summary instead of stacking
    if table.has_summary {
        table.rows.pop();
    }
    table.rows.push(summary_row(&table.columns, &means));
    table.has_summary = true;
}

/// Issue a mean-aggregate query per numeric column and append the synthetic
/// average row. With no numeric columns present, no query is issued and the
/// summary row carries the sentinel in every cell.
pub async fn append_average_row(engine: &dyn QueryEngine, table: &mut Table) -> Result<()> {
    let numeric: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Number)
        .map(|c| c.field.clone())
        .collect();

    let mut means = HashMap::new();
    if !numeric.is_empty() {
        // null cells from ragged rows count as zero, matching the fallback
        // parser's numeric coercion
        let select = numeric
            .iter()
            .map(|field| format!("AVG(COALESCE(\"{0}\", 0)) AS \"{0}\"", field))
            .join(", ");
        let sql = format!("SELECT {} FROM \"{}\"", select, table.name);
        debug!("aggregation query: {}", sql);

        let output = engine.query(&sql).await?;
        if let Some(row) = output.rows.first() {
            for (idx, field) in output.fields.iter().enumerate() {
                means.insert(field.name.clone(), normalize(row.get(idx).as_number()));
            }
        }
    }

    push_summary(table, means);
    info!(
        "appended average row to '{}' ({} numeric columns)",
        table.name,
        numeric.len()
    );
    Ok(())
}

/// Engineless variant of [`append_average_row`] used on the fallback parser
/// path: means are folded directly over the in-memory rows.
pub fn append_average_row_in_memory(table: &mut Table) {
    let mut means = HashMap::new();
    for (idx, column) in table.columns.iter().enumerate() {
        if column.kind != ColumnKind::Number {
            continue;
        }
        let data = table.data_rows();
        let sum: f64 = data.iter().map(|row| row.get(idx).as_number()).sum();
        means.insert(column.field.clone(), normalize(sum / data.len() as f64));
    }

    push_summary(table, means);
}

/// Mean of one column over the data rows, excluding the synthetic summary
/// row so it is never double-counted.
pub fn mean_of_column(table: &Table, field: &str) -> f64 {
    let Some(idx) = table.field_index(field) else {
        return 0.0;
    };
    let data = table.data_rows();
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().map(|row| row.get(idx).as_number()).sum();
    normalize(sum / data.len() as f64)
}
