//! View Projection
//!
//! Reshapes a canonical table into the exact input each visualization
//! consumes: label/series arrays for bar and line charts, category/value
//! slices for pie charts. Every function here is a pure function of
//! `(table, selection)`: selection state lives with the caller, and
//! recomputing a projection never mutates the canonical rows. The synthetic
//! average row is recognized through the table's summary flag.

use crate::schema::{self, Column, ColumnKind};
use crate::table::{Row, Table};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Fixed denominator for the play-time pie: minutes in a full game.
pub const FULL_GAME_MINUTES: f64 = 48.0;

/// One chart series: a display label and its ordered values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Bar/line chart input: one label per axis position plus one series per
/// selected value column, all aligned 1:1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl CategorySeries {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// One pie slice: category label and percentage value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

/// Date formats the label axis understands when sorting chronologically.
const DAY_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];
const MONTH_FORMATS: &[&str] = &["%Y/%m", "%Y-%m"];

fn parse_date_label(label: &str) -> Option<NaiveDate> {
    for fmt in DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(label, fmt) {
            return Some(d);
        }
    }
    // month-only labels (e.g. 年月 values) parse with an implied first day
    for fmt in MONTH_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{} 1", label), &format!("{} %d", fmt)) {
            return Some(d);
        }
    }
    None
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    match (parse_date_label(a), parse_date_label(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        _ => a.cmp(b),
    }
}

/// Label axis column: the date column when one exists, else the first column.
fn label_column(columns: &[Column]) -> Option<usize> {
    if columns.is_empty() {
        return None;
    }
    Some(schema::date_column_index(columns).unwrap_or(0))
}

/// Project rows into bar/line chart shape.
///
/// `selected_fields` are the user-chosen value columns; an empty selection
/// defaults to the first non-label column. Unknown fields are skipped. With
/// `sort_by_date` set and a date-kind label column, data rows are ordered
/// ascending by date before projecting (ingestion order is not guaranteed
/// chronological); the synthetic average row stays pinned last either way,
/// so its axis label aligns 1:1 with its value.
///
/// Fewer than two columns, or a selection resolving to no value column,
/// yields an empty result rather than an error.
pub fn bar_line_series(
    table: &Table,
    selected_fields: &[String],
    sort_by_date: bool,
) -> CategorySeries {
    let columns = &table.columns;
    if columns.len() < 2 {
        debug!("projection skipped: fewer than 2 columns");
        return CategorySeries::default();
    }
    let label_idx = match label_column(columns) {
        Some(idx) => idx,
        None => return CategorySeries::default(),
    };

    let value_indices: Vec<usize> = if selected_fields.is_empty() {
        (0..columns.len()).find(|i| *i != label_idx).into_iter().collect()
    } else {
        selected_fields
            .iter()
            .filter_map(|f| schema::field_index(columns, f))
            .filter(|i| *i != label_idx)
            .collect()
    };
    if value_indices.is_empty() {
        return CategorySeries::default();
    }

    let mut data_rows: Vec<&Row> = table.data_rows().iter().collect();
    if sort_by_date && columns[label_idx].kind == ColumnKind::Date {
        data_rows.sort_by(|a, b| {
            compare_labels(&a.get(label_idx).as_label(), &b.get(label_idx).as_label())
        });
    }

    let ordered: Vec<&Row> = data_rows.into_iter().chain(table.summary_row()).collect();

    let labels = ordered
        .iter()
        .map(|row| row.get(label_idx).as_label())
        .collect();
    let series = value_indices
        .iter()
        .map(|&idx| ChartSeries {
            label: columns[idx].label.clone(),
            values: ordered.iter().map(|row| row.get(idx).as_number()).collect(),
        })
        .collect();

    CategorySeries { labels, series }
}

/// Split one numeric field into "used" vs "remaining" percentages against a
/// fixed denominator, for the single row matching `category` on the label
/// axis. No matching row (or a missing field) yields an empty result.
pub fn pie_used_remaining(
    table: &Table,
    category: &str,
    value_field: &str,
    denominator: f64,
) -> Vec<PieSlice> {
    let Some(label_idx) = label_column(&table.columns) else {
        return Vec::new();
    };
    let Some(value_idx) = table.field_index(value_field) else {
        return Vec::new();
    };
    if denominator <= 0.0 {
        return Vec::new();
    }

    let row = table
        .data_rows()
        .iter()
        .find(|row| row.get(label_idx).as_label() == category);
    let Some(row) = row else {
        debug!("no row matches category '{}'", category);
        return Vec::new();
    };

    let used = (row.get(value_idx).as_number() / denominator * 100.0).clamp(0.0, 100.0);
    vec![
        PieSlice {
            label: category.to_string(),
            value: used,
        },
        PieSlice {
            label: "remaining".to_string(),
            value: 100.0 - used,
        },
    ]
}

/// Per-row share of a numeric field as a percentage of a fixed denominator,
/// optionally restricted to the caller's selected labels (checkbox state).
/// The synthetic average row is not a data point and is always excluded.
pub fn pie_share_per_row(
    table: &Table,
    value_field: &str,
    denominator: f64,
    selected_labels: Option<&[String]>,
) -> Vec<PieSlice> {
    let Some(label_idx) = label_column(&table.columns) else {
        return Vec::new();
    };
    let Some(value_idx) = table.field_index(value_field) else {
        return Vec::new();
    };
    if denominator <= 0.0 {
        return Vec::new();
    }

    table
        .data_rows()
        .iter()
        .filter_map(|row| {
            let label = row.get(label_idx).as_label();
            if let Some(selected) = selected_labels {
                if !selected.iter().any(|s| s == &label) {
                    return None;
                }
            }
            Some(PieSlice {
                value: row.get(value_idx).as_number() / denominator * 100.0,
                label,
            })
        })
        .collect()
}

/// Labels available for selection on the label axis, in row order, summary
/// row excluded. This is what a checkbox group is populated from.
pub fn available_labels(table: &Table) -> Vec<String> {
    let Some(label_idx) = label_column(&table.columns) else {
        return Vec::new();
    };
    table
        .data_rows()
        .iter()
        .map(|row| row.get(label_idx).as_label())
        .collect()
}
