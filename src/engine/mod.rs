//! Query engine boundary
//!
//! The embedded analytical engine is an external collaborator reached through
//! a narrow asynchronous request/response contract: register raw text as a
//! table with header and auto type detection, run a read query returning rows
//! plus field metadata, drop a table, and close the connection. The core
//! pipeline never
//! depends on engine internals beyond this trait, which keeps it testable
//! against the in-memory engine.

pub mod memory_engine;
pub mod polars_engine;

use crate::error::Result;
use crate::table::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory_engine::MemoryEngine;
pub use polars_engine::PolarsEngine;

/// Type class reported by the engine for a result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    Temporal,
}

/// Result-field metadata as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineField {
    pub name: String,
    pub kind: FieldKind,
}

impl EngineField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Rows plus field metadata returned by a query. Row order matches whatever
/// order the engine produced, which for full-table reads must be source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutput {
    pub fields: Vec<EngineField>,
    pub rows: Vec<Row>,
}

/// The black-box SQL executor behind the ingestion and aggregation pipelines.
///
/// One query is in flight per connection at a time; there is no pipelining
/// and no cancellation. A failed `create_table_from_text` must not leave a
/// partially created table visible to later queries.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Register raw delimited text under `table`, reading the first row as
    /// header and auto-detecting column types.
    async fn create_table_from_text(&self, table: &str, raw_text: &str) -> Result<()>;

    /// Execute a read query, returning rows and field metadata.
    async fn query(&self, sql: &str) -> Result<QueryOutput>;

    /// Remove a registered table so later queries no longer see it.
    /// Dropping a name that was never registered is not an error.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Close the connection. Subsequent calls fail with an engine error.
    async fn close(&self) -> Result<()>;
}
