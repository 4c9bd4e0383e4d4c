//! Polars-backed query engine
//!
//! Concrete `QueryEngine` built on Polars' native CSV reader and SQL context.
//! Raw text is registered as a virtual file under the engine's data
//! directory, loaded with header and auto type detection, and then queried
//! through `SQLContext`. The connection serializes queries: one statement at
//! a time, no pipelining.

use crate::engine::{EngineField, FieldKind, QueryEngine, QueryOutput};
use crate::error::{ChartError, Result};
use crate::table::{Row, Value};
use async_trait::async_trait;
use polars::prelude::*;
use polars::sql::SQLContext;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, info};

struct ConnState {
    ctx: SQLContext,
    closed: bool,
}

/// Query engine backed by Polars (CSV reader + SQL context).
pub struct PolarsEngine {
    data_dir: PathBuf,
    state: Mutex<ConnState>,
}

impl PolarsEngine {
    /// Open a connection, creating the virtual-file data directory if needed.
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir).await?;
        Ok(Self {
            data_dir,
            state: Mutex::new(ConnState {
                ctx: SQLContext::new(),
                closed: false,
            }),
        })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ConnState>> {
        self.state
            .lock()
            .map_err(|_| ChartError::Engine("engine connection mutex poisoned".to_string()))
    }

    fn dataframe_to_output(df: &DataFrame) -> Result<QueryOutput> {
        let mut fields = Vec::new();
        for f in df.schema().iter_fields() {
            let kind = if f.data_type().is_numeric() {
                FieldKind::Number
            } else if f.data_type().is_temporal() {
                FieldKind::Temporal
            } else {
                FieldKind::Text
            };
            fields.push(EngineField::new(f.name().to_string(), kind));
        }

        let mut rows = Vec::with_capacity(df.height());
        for row_idx in 0..df.height() {
            let mut values = Vec::with_capacity(fields.len());
            for series in df.get_columns() {
                values.push(Self::series_value(series, row_idx)?);
            }
            rows.push(Row::new(values));
        }

        Ok(QueryOutput { fields, rows })
    }

    fn series_value(series: &Series, row_idx: usize) -> Result<Value> {
        if series.is_null().get(row_idx).unwrap_or(false) {
            return Ok(Value::Null);
        }

        let any_val = series.get(row_idx).map_err(|_| {
            ChartError::Engine(format!("failed to read value at row {}", row_idx))
        })?;

        let value = match series.dtype() {
            dt if dt.is_numeric() => any_val
                .try_extract::<f64>()
                .map(Value::Num)
                .unwrap_or(Value::Null),
            DataType::String => match any_val.get_str() {
                Some("") | None => Value::Null,
                Some(s) => Value::Str(s.to_string()),
            },
            DataType::Boolean => Value::Str(any_val.to_string()),
            // dates, datetimes and anything else render through Display
            _ => Value::Str(any_val.to_string()),
        };
        Ok(value)
    }
}

#[async_trait]
impl QueryEngine for PolarsEngine {
    async fn create_table_from_text(&self, table: &str, raw_text: &str) -> Result<()> {
        let path = self.data_dir.join(format!("{}.csv", table));
        fs::write(&path, raw_text).await?;
        debug!("registered virtual file {:?} for table '{}'", path, table);

        // Collect eagerly so malformed input fails here, before the table
        // name becomes visible to queries.
        let df = LazyCsvReader::new(&path)
            .with_has_header(true)
            .with_truncate_ragged_lines(true)
            .finish()?
            .collect()?;

        let mut state = self.lock_state()?;
        if state.closed {
            return Err(ChartError::Engine("connection is closed".to_string()));
        }
        info!(
            "created table '{}' ({} rows, {} columns)",
            table,
            df.height(),
            df.width()
        );
        state.ctx.register(table, df.lazy());
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryOutput> {
        debug!("executing query: {}", sql);
        // Lock held across execution: one query in flight per connection.
        let mut state = self.lock_state()?;
        if state.closed {
            return Err(ChartError::Engine("connection is closed".to_string()));
        }
        let df = state.ctx.execute(sql)?.collect()?;
        Self::dataframe_to_output(&df)
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        {
            let mut state = self.lock_state()?;
            if state.closed {
                return Err(ChartError::Engine("connection is closed".to_string()));
            }
            state.ctx.unregister(table);
        }
        let path = self.data_dir.join(format!("{}.csv", table));
        if let Err(e) = fs::remove_file(&path).await {
            debug!("virtual file {:?} already gone: {}", path, e);
        }
        debug!("dropped table '{}'", table);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        state.closed = true;
        state.ctx = SQLContext::new();
        debug!("engine connection closed");
        Ok(())
    }
}
