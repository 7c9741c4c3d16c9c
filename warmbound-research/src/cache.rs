//! Local research cache.
//!
//! Maps a normalized company identifier to the last research record
//! fetched for it. No expiry: a fresh fetch overwrites the whole entry.
//! Backends normalize keys themselves, so callers may pass raw input.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, ResearchResult};
use crate::record::{normalize_identifier, ResearchRecord};

/// A cached record and when it was fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub record: ResearchRecord,
}

/// Keyed store for research records.
pub trait ResearchCache: Send + Sync {
    fn get(&self, identifier: &str) -> ResearchResult<Option<CacheEntry>>;

    /// Replace the entry for `identifier` with `record`, stamped now.
    fn set(&self, identifier: &str, record: &ResearchRecord) -> ResearchResult<()>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResearchCache for MemoryCache {
    fn get(&self, identifier: &str) -> ResearchResult<Option<CacheEntry>> {
        Ok(self.entries.read().get(&normalize_identifier(identifier)).cloned())
    }

    fn set(&self, identifier: &str, record: &ResearchRecord) -> ResearchResult<()> {
        let entry = CacheEntry {
            fetched_at: Utc::now(),
            record: record.clone(),
        };
        self.entries.write().insert(normalize_identifier(identifier), entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// All entries in one JSON object file, keyed by normalized identifier.
///
/// Writes go to a sibling temp file that is renamed over the original, so
/// a reader sees either the old file or the new one, never a partial write.
pub struct JsonFileCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ResearchResult<BTreeMap<String, CacheEntry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ResearchError::Cache(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn store(&self, entries: &BTreeMap<String, CacheEntry>) -> ResearchResult<()> {
        let io_err = |e: std::io::Error| {
            ResearchError::Cache(format!("Failed to write '{}': {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(entries)?).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl ResearchCache for JsonFileCache {
    fn get(&self, identifier: &str) -> ResearchResult<Option<CacheEntry>> {
        Ok(self.load()?.remove(&normalize_identifier(identifier)))
    }

    fn set(&self, identifier: &str, record: &ResearchRecord) -> ResearchResult<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        entries.insert(
            normalize_identifier(identifier),
            CacheEntry {
                fetched_at: Utc::now(),
                record: record.clone(),
            },
        );
        self.store(&entries)
    }
}
