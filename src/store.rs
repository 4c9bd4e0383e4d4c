//! Durable Table Store
//!
//! Persists raw uploaded text as named entries under a private root
//! directory, the process-wide analog of an origin-private file area. Writes
//! are whole-file overwrites (name collisions replace content, last write
//! wins), enumeration lists only file-kind entries, and a single unreadable
//! entry never takes down the listing.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// A stored upload: entry name plus the raw text as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub name: String,
    pub raw_text: String,
}

/// Durable store rooted at a single directory.
pub struct TableStore {
    root: PathBuf,
}

impl TableStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| ChartError::Storage(format!("cannot create store root: {}", e)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ChartError::Storage(format!(
                "invalid entry name '{}'",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    /// Persist `raw_text` under `name`, overwriting any existing entry.
    pub async fn save(&self, name: &str, raw_text: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        fs::write(&path, raw_text)
            .await
            .map_err(|e| ChartError::Storage(format!("write '{}' failed: {}", name, e)))?;
        info!("stored entry '{}' ({} bytes)", name, raw_text.len());
        Ok(())
    }

    /// Enumerate entry names, file-kind entries only, sorted for a
    /// deterministic listing. Unreadable children are skipped with a warning
    /// so the rest of the listing survives.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| ChartError::Storage(format!("cannot list store: {}", e)))?;

        let mut names = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("skipping unreadable store entry: {}", e);
                    continue;
                }
            };
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {
                    names.push(entry.file_name().to_string_lossy().to_string());
                }
                Ok(_) => debug!("skipping non-file entry {:?}", entry.file_name()),
                Err(e) => warn!("skipping entry {:?}: {}", entry.file_name(), e),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read an entry back. A missing or unreadable entry surfaces as a
    /// storage error without affecting anything else.
    pub async fn load(&self, name: &str) -> Result<StoredEntry> {
        let path = self.entry_path(name)?;
        let raw_text = fs::read_to_string(&path)
            .await
            .map_err(|e| ChartError::Storage(format!("read '{}' failed: {}", name, e)))?;
        debug!("loaded entry '{}' ({} bytes)", name, raw_text.len());
        Ok(StoredEntry {
            name: name.to_string(),
            raw_text,
        })
    }
}
