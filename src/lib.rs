//! chartdeck - delimited-data dashboard core
//!
//! The data path behind a CSV dashboard: ingest raw delimited text into a
//! typed table through an embedded query engine, derive a synthetic average
//! row, persist uploads in a durable store, and project rows/columns into
//! chart-ready series. UI rendering and the engine internals are external
//! collaborators.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod project;
pub mod schema;
pub mod scrape;
pub mod store;
pub mod table;

pub use error::{ChartError, Result};
pub use table::{Row, Table, Value};
