//! Runtime settings for the data path: where the engine keeps its virtual
//! files and where the durable store lives. Environment variables override
//! the defaults; CLI flags override both.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "CHARTDECK_DATA_DIR";
pub const STORE_DIR_ENV: &str = "CHARTDECK_STORE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the engine registers virtual files under.
    pub data_dir: PathBuf,
    /// Root of the durable table store.
    pub store_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            store_dir: PathBuf::from("store"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            store_dir: std::env::var(STORE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
        }
    }
}
