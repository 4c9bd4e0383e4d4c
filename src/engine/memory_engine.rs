//! In-memory query engine
//!
//! Engine-shaped fake over the fallback delimited parser. It understands only
//! the two statement shapes the pipelines emit (full-table read and a list of
//! column means) and exists so the data path can run, and be tested, without
//! the real analytical engine.

use crate::engine::{EngineField, FieldKind, QueryEngine, QueryOutput};
use crate::error::{ChartError, Result};
use crate::parser;
use crate::schema::ColumnKind;
use crate::table::{Row, Table, Value};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

lazy_static! {
    static ref SELECT_ALL_RE: Regex =
        Regex::new(r#"(?i)^\s*SELECT\s+\*\s+FROM\s+"?([^"\s;]+)"?\s*;?\s*$"#)
            .expect("static regex");
    // accepts both AVG("X") and the null-coercing AVG(COALESCE("X", 0))
    static ref AVG_PAIR_RE: Regex =
        Regex::new(r#"(?i)AVG\((?:COALESCE\()?"([^"]+)"(?:,\s*0\))?\)\s+AS\s+"([^"]+)""#)
            .expect("static regex");
    static ref FROM_RE: Regex =
        Regex::new(r#"(?i)\sFROM\s+"?([^"\s;]+)"?"#).expect("static regex");
}

struct MemoryState {
    tables: HashMap<String, Table>,
    closed: bool,
}

/// In-memory engine backed by the fallback parser.
pub struct MemoryEngine {
    state: Mutex<MemoryState>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::open()
    }
}

impl MemoryEngine {
    pub fn open() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tables: HashMap::new(),
                closed: false,
            }),
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ChartError::Engine("engine state mutex poisoned".to_string()))
    }

    /// Auto type detection over a parsed table: a column whose non-null cells
    /// all parsed numeric becomes a number column.
    fn detect_kinds(table: &mut Table) {
        for (idx, column) in table.columns.iter_mut().enumerate() {
            if column.kind != ColumnKind::String {
                continue;
            }
            let mut saw_value = false;
            let all_numeric = table.rows.iter().all(|row| match row.get(idx) {
                Value::Num(_) => {
                    saw_value = true;
                    true
                }
                Value::Null => true,
                Value::Str(_) => false,
            });
            if saw_value && all_numeric {
                column.kind = ColumnKind::Number;
            }
        }
    }

    fn fields_of(table: &Table) -> Vec<EngineField> {
        table
            .columns
            .iter()
            .map(|c| {
                let kind = match c.kind {
                    ColumnKind::Number => FieldKind::Number,
                    ColumnKind::Date => FieldKind::Temporal,
                    ColumnKind::String => FieldKind::Text,
                };
                EngineField::new(c.field.clone(), kind)
            })
            .collect()
    }

    fn select_all(table: &Table) -> QueryOutput {
        QueryOutput {
            fields: Self::fields_of(table),
            rows: table.rows.clone(),
        }
    }

    fn select_averages(table: &Table, pairs: &[(String, String)]) -> Result<QueryOutput> {
        let mut fields = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for (source, alias) in pairs {
            let idx = table.field_index(source).ok_or_else(|| {
                ChartError::Engine(format!(
                    "unknown column '{}' in table '{}'",
                    source, table.name
                ))
            })?;
            let count = table.rows.len();
            let value = if count == 0 {
                Value::Null
            } else {
                let sum: f64 = table.rows.iter().map(|r| r.get(idx).as_number()).sum();
                Value::Num(sum / count as f64)
            };
            fields.push(EngineField::new(alias.clone(), FieldKind::Number));
            values.push(value);
        }
        Ok(QueryOutput {
            fields,
            rows: vec![Row::new(values)],
        })
    }
}

#[async_trait]
impl QueryEngine for MemoryEngine {
    async fn create_table_from_text(&self, table: &str, raw_text: &str) -> Result<()> {
        let mut parsed = parser::parse_delimited(table, raw_text);
        Self::detect_kinds(&mut parsed);

        let mut state = self.lock_state()?;
        if state.closed {
            return Err(ChartError::Engine("connection is closed".to_string()));
        }
        debug!(
            "memory engine created table '{}' ({} rows)",
            table,
            parsed.rows.len()
        );
        state.tables.insert(table.to_string(), parsed);
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryOutput> {
        let state = self.lock_state()?;
        if state.closed {
            return Err(ChartError::Engine("connection is closed".to_string()));
        }

        if let Some(caps) = SELECT_ALL_RE.captures(sql) {
            let name = &caps[1];
            let table = state
                .tables
                .get(name)
                .ok_or_else(|| ChartError::Engine(format!("unknown table '{}'", name)))?;
            return Ok(Self::select_all(table));
        }

        let pairs: Vec<(String, String)> = AVG_PAIR_RE
            .captures_iter(sql)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect();
        if !pairs.is_empty() {
            let name = FROM_RE
                .captures(sql)
                .map(|c| c[1].to_string())
                .ok_or_else(|| {
                    ChartError::Engine(format!("missing FROM clause in query: {}", sql))
                })?;
            let table = state
                .tables
                .get(&name)
                .ok_or_else(|| ChartError::Engine(format!("unknown table '{}'", name)))?;
            return Self::select_averages(table, &pairs);
        }

        Err(ChartError::Engine(format!(
            "unsupported query shape: {}",
            sql
        )))
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.closed {
            return Err(ChartError::Engine("connection is closed".to_string()));
        }
        state.tables.remove(table);
        debug!("memory engine dropped table '{}'", table);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        state.closed = true;
        state.tables.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_table_read_preserves_source_order() {
        let engine = MemoryEngine::open();
        engine
            .create_table_from_text("foo", "DATE,PTS\n2024/01/02,20\n2024/01/01,10\n")
            .await
            .unwrap();

        let out = engine.query("SELECT * FROM \"foo\"").await.unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].get(0), &Value::Str("2024/01/02".into()));
        assert_eq!(out.rows[1].get(0), &Value::Str("2024/01/01".into()));
        assert_eq!(out.fields[1].kind, FieldKind::Number);
    }

    #[tokio::test]
    async fn average_query_returns_one_row_of_means() {
        let engine = MemoryEngine::open();
        engine
            .create_table_from_text("foo", "DATE,PTS,REB\nd1,10,4\nd2,20,6\n")
            .await
            .unwrap();

        let out = engine
            .query("SELECT AVG(\"PTS\") AS \"PTS\", AVG(\"REB\") AS \"REB\" FROM \"foo\"")
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get(0), &Value::Num(15.0));
        assert_eq!(out.rows[0].get(1), &Value::Num(5.0));
    }

    #[tokio::test]
    async fn null_coercing_average_shape_is_understood() {
        let engine = MemoryEngine::open();
        engine
            .create_table_from_text("foo", "A,B\n1\n2,3\n")
            .await
            .unwrap();

        let out = engine
            .query(
                "SELECT AVG(COALESCE(\"A\", 0)) AS \"A\", AVG(COALESCE(\"B\", 0)) AS \"B\" FROM \"foo\"",
            )
            .await
            .unwrap();
        assert_eq!(out.rows[0].get(0), &Value::Num(1.5));
        // the missing B cell counts as zero against the full row count
        assert_eq!(out.rows[0].get(1), &Value::Num(1.5));
    }

    #[tokio::test]
    async fn dropped_table_is_gone_from_later_queries() {
        let engine = MemoryEngine::open();
        engine
            .create_table_from_text("foo", "A\n1\n")
            .await
            .unwrap();

        engine.drop_table("foo").await.unwrap();
        assert!(engine.query("SELECT * FROM \"foo\"").await.is_err());
        // dropping again is a no-op
        engine.drop_table("foo").await.unwrap();
    }

    #[tokio::test]
    async fn queries_after_close_fail() {
        let engine = MemoryEngine::open();
        engine
            .create_table_from_text("foo", "A\n1\n")
            .await
            .unwrap();
        engine.close().await.unwrap();

        let err = engine.query("SELECT * FROM \"foo\"").await;
        assert!(err.is_err());
    }
}
