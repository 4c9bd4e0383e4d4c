//! In-memory table model
//!
//! A `Table` is the typed row/column structure produced by ingestion. Rows are
//! index-aligned with the column list: the column set is closed at ingestion
//! time, so field access never depends on per-row shape.

use crate::schema::Column;
use serde::{Deserialize, Serialize};

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Str(String),
    Num(f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of a cell. Failed parses and nulls coerce to 0 rather
    /// than NaN so averages and chart axes stay well-defined.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Num(n) if n.is_finite() => *n,
            Value::Num(_) => 0.0,
            Value::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Null => 0.0,
        }
    }

    /// Display form of a cell, used for axis labels and grid output.
    pub fn as_label(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

/// One row of a table, index-aligned with the table's column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> &Value {
        self.values.get(idx).unwrap_or(&Value::Null)
    }
}

/// The in-memory table produced by ingestion.
///
/// Created by the ingestion pipeline, mutated only by appending the synthetic
/// average row, and replaced wholesale when a new file is ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// True when the last row is the synthetic average row. This flag, not
    /// cell content, decides which row is the summary: a data row may
    /// legitimately carry the sentinel label as a value.
    #[serde(default)]
    pub has_summary: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
            has_summary: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows excluding the synthetic average row.
    pub fn data_rows(&self) -> &[Row] {
        if self.has_summary && !self.rows.is_empty() {
            &self.rows[..self.rows.len() - 1]
        } else {
            &self.rows
        }
    }

    /// The synthetic average row, if one has been appended.
    pub fn summary_row(&self) -> Option<&Row> {
        if self.has_summary {
            self.rows.last()
        } else {
            None
        }
    }

    /// Index of a column by field identifier (exact match, case preserved).
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }

    /// Cell lookup by row index and field identifier.
    pub fn value(&self, row_idx: usize, field: &str) -> Option<&Value> {
        let col = self.field_index(field)?;
        self.rows.get(row_idx).map(|r| r.get(col))
    }
}
