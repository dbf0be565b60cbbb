use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::ItemConfig;
use crate::models::{Fact, TrackedItem};
use crate::utils::error::{AppError, Result};

/// Item id -> tracked item. Absence of an id means "never checked".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct HistoryStore {
    items: BTreeMap<String, TrackedItem>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedItem> {
        self.items.get(id)
    }

    /// Append `fact` to the item's history, creating the item on first sight.
    /// Name, url, kind and threshold follow the current configuration.
    pub fn upsert(&mut self, item: &ItemConfig, fact: Fact) -> &TrackedItem {
        let tracked = self.items.entry(item.id.clone()).or_insert_with(|| {
            TrackedItem::new(item.name.clone(), item.url.clone(), item.kind, item.threshold)
        });

        tracked.name = item.name.clone();
        tracked.url = item.url.clone();
        tracked.kind = item.kind;
        tracked.threshold = item.threshold;
        tracked.record(fact);
        tracked
    }

    pub fn set_alert_triggered(&mut self, id: &str, triggered: bool) {
        if let Some(tracked) = self.items.get_mut(id) {
            tracked.alert_triggered = triggered;
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The JSON file backing a [`HistoryStore`].
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty store. Anything else that fails to
    /// parse is an error; overwriting it would lose history.
    pub fn load(&self) -> Result<HistoryStore> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No history at {}, starting empty", self.path.display());
                return Ok(HistoryStore::new());
            }
            Err(e) => {
                return Err(AppError::Persistence(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if data.trim().is_empty() {
            return Ok(HistoryStore::new());
        }

        serde_json::from_str(&data).map_err(|e| {
            AppError::Persistence(format!("corrupt history file {}: {}", self.path.display(), e))
        })
    }

    /// Replace the file with `store` in one step: the new content is written to a
    /// temporary file beside it and renamed over the old one.
    pub fn save(&self, store: &HistoryStore) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let persistence = |e: io::Error| {
            AppError::Persistence(format!("cannot write {}: {}", self.path.display(), e))
        };

        fs::create_dir_all(&dir).map_err(persistence)?;

        let mut data = serde_json::to_string_pretty(store)?;
        data.push('\n');

        let mut tmp = NamedTempFile::new_in(&dir).map_err(persistence)?;
        tmp.write_all(data.as_bytes()).map_err(persistence)?;
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(&self.path).map_err(|e| persistence(e.error))?;

        debug!("Saved {} items to {}", store.len(), self.path.display());
        Ok(())
    }
}
