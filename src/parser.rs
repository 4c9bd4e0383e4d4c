//! Delimited Text Parser
//!
//! Fallback path used when no query engine is available (for example when
//! re-reading a stored entry directly). Splits raw text on `\n` rows and `,`
//! fields with the first row as header. There is no quoting or escaping
//! support: a separator inside a field is always treated as a delimiter.
//! Field counts are not validated against the header; missing trailing
//! fields resolve to `Null` and extra fields are silently dropped.

use crate::schema;
use crate::table::{Row, Table, Value};

const ROW_SEPARATOR: char = '\n';
const FIELD_SEPARATOR: char = ',';

/// Coerce a single cell into a typed value. Empty cells become `Null`,
/// anything that parses as a number becomes `Num`, everything else `Str`.
fn coerce_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return Value::Num(n);
        }
    }
    Value::Str(trimmed.to_string())
}

/// Parse raw delimited text into a table.
///
/// An empty input (or an input with only a blank header) yields a table with
/// zero columns, not an error; callers treat zero columns as "no data".
pub fn parse_delimited(name: &str, raw_text: &str) -> Table {
    let mut lines = raw_text
        .split(ROW_SEPARATOR)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty());

    let header: Vec<String> = match lines.next() {
        Some(line) => line
            .split(FIELD_SEPARATOR)
            .map(|s| s.to_string())
            .collect(),
        None => Vec::new(),
    };

    let columns = schema::columns_from_header(&header);
    if columns.is_empty() {
        return Table::new(name, columns, Vec::new());
    }

    let rows = lines
        .map(|line| {
            let mut values: Vec<Value> = line
                .split(FIELD_SEPARATOR)
                .take(columns.len())
                .map(coerce_cell)
                .collect();
            // missing trailing fields map to Null, extra ones were dropped above
            values.resize(columns.len(), Value::Null);
            Row::new(values)
        })
        .collect();

    Table::new(name, columns, rows)
}
