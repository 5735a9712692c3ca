//! Persisted set of archives that have been extracted.
//!
//! The ledger (`manifest.json`) lets the organize and package stages find their work without
//! rescanning the source directory. It is an ordered set: identifiers keep the order in which
//! they were first added.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;

/// Default file name of the ledger.
pub const DEFAULT_LEDGER_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    extracted: Vec<String>,
    /// Time of the last [`Ledger::save`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Ledger {
    /// Loads the ledger at `path`; a missing file yields an empty ledger.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the ledger as pretty JSON, stamping `updated_at`.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now());
        let text = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, text).await?;
        log::debug!("ledger saved to {:?} ({} entries)", path, self.extracted.len());
        Ok(())
    }

    /// Removes the ledger file; a missing file is not an error.
    pub async fn clear(path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Records `id`; returns false when it was already present.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.extracted.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.extracted.iter().any(|e| e == id)
    }

    /// Identifiers in insertion order.
    pub fn extracted(&self) -> &[String] {
        &self.extracted
    }

    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extracted.len()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
