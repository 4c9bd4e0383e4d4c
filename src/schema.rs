//! Column Schema Inference
//!
//! Derives the ordered column list either from a raw header row (fallback
//! parser path) or from query-result field metadata (engine path). Field
//! identifiers are the raw header text, whitespace and case preserved,
//! because downstream aggregate queries must reference the identical
//! identifier.

use crate::engine::{EngineField, FieldKind};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    String,
    Number,
    Date,
}

/// One column of a table: field identifier, display label, and inferred type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(field: impl Into<String>, kind: ColumnKind) -> Self {
        let field = field.into();
        let label = display_label(&field);
        Self { field, label, kind }
    }
}

lazy_static! {
    /// Display-name overrides for known domain fields. Anything not listed
    /// here keeps its raw header text as the label.
    static ref LABEL_OVERRIDES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("DATE", "Date");
        m.insert("MIN", "Minutes");
        m.insert("PTS", "Points");
        m.insert("REB", "Rebounds");
        m.insert("AST", "Assists");
        m.insert("年月", "Month");
        m
    };
}

/// Field identifiers recognized as date columns on the header-only path.
const DATE_FIELDS: &[&str] = &["DATE", "年月"];

fn display_label(field: &str) -> String {
    LABEL_OVERRIDES
        .get(field)
        .map(|s| s.to_string())
        .unwrap_or_else(|| field.to_string())
}

fn is_date_field(field: &str) -> bool {
    DATE_FIELDS.contains(&field)
}

/// Infer columns from a raw header row.
///
/// Without engine metadata the only type signal is the field name itself, so
/// a recognized date-field name yields `Date` and everything else `String`.
/// An empty header yields an empty column list; callers treat zero columns
/// as "no data" and skip rendering.
pub fn columns_from_header(header: &[String]) -> Vec<Column> {
    header
        .iter()
        .map(|field| {
            let kind = if is_date_field(field) {
                ColumnKind::Date
            } else {
                ColumnKind::String
            };
            Column::new(field.clone(), kind)
        })
        .collect()
}

/// Infer columns from query-result field metadata.
///
/// The engine reports detected types, so numeric and temporal fields map
/// through directly; the recognized date-field names still force `Date` for
/// sources where the engine left the column as plain text.
pub fn columns_from_fields(fields: &[EngineField]) -> Vec<Column> {
    fields
        .iter()
        .map(|f| {
            let kind = if is_date_field(&f.name) {
                ColumnKind::Date
            } else {
                match f.kind {
                    FieldKind::Number => ColumnKind::Number,
                    FieldKind::Temporal => ColumnKind::Date,
                    FieldKind::Text => ColumnKind::String,
                }
            };
            Column::new(f.name.clone(), kind)
        })
        .collect()
}

/// Index of a field within a column list (exact identifier match).
pub fn field_index(columns: &[Column], field: &str) -> Option<usize> {
    columns.iter().position(|c| c.field == field)
}

/// First date-kind column, used as the label axis when present.
pub fn date_column_index(columns: &[Column]) -> Option<usize> {
    columns.iter().position(|c| c.kind == ColumnKind::Date)
}
