use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<polars::prelude::PolarsError> for ChartError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        ChartError::Engine(e.to_string())
    }
}

impl From<csv::Error> for ChartError {
    fn from(e: csv::Error) -> Self {
        ChartError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
