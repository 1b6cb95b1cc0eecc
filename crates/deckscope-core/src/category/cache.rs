//! Classification Cache
//!
//! External classifier answers keyed by card name, persisted as JSON so the
//! same card is never sent twice. Owned by whoever runs the backfill: load
//! it, use it, flush it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::builtin::CategorySet;

pub const CACHE_FILE: &str = "llm_category_cache.json";

#[derive(Debug, Default)]
pub struct ClassificationCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CategorySet>,
    dirty: bool,
}

impl ClassificationCache {
    /// Load `llm_category_cache.json` from `base_dir` (empty when absent)
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CACHE_FILE);
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            entries,
            dirty: false,
        })
    }

    /// Cache that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CategorySet> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, labels: CategorySet) {
        self.entries.insert(name.into(), labels);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write pending entries. No-op when nothing changed or in-memory.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        }
        self.dirty = false;
        Ok(())
    }
}
