//! Tracked-set registry
//!
//! Holds the roots the user wants proven. Every operation takes the single
//! registry lock, so a snapshot never observes a half-applied add or remove.

use crate::error::RegistryError;
use crate::tree::path::{normalize_tracked_path, textual_key};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A registered filesystem root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntry {
    pub path: PathBuf,
    pub is_directory: bool,
    pub recursive: bool,
}

/// Registry of tracked roots, unique by normalized path
#[derive(Debug, Default)]
pub struct TrackedSet {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Canonical key -> entry
    entries: BTreeMap<PathBuf, TrackedEntry>,
    /// Caller spelling (textual key) -> canonical key
    aliases: HashMap<PathBuf, PathBuf>,
}

impl Inner {
    /// Key of the entry `path` names, if any
    ///
    /// Falls back to the spelling used at registration so a root that has
    /// since vanished, or was reached through a symlink, still resolves.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let key = normalize_tracked_path(path);
        if self.entries.contains_key(&key) {
            return Some(key);
        }
        self.aliases
            .get(&textual_key(path))
            .filter(|key| self.entries.contains_key(*key))
            .cloned()
    }
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self, path: &Path) -> bool {
        self.inner.lock().resolve(path).is_some()
    }

    /// Register a root and return the key it is stored under.
    /// A duplicate never replaces the existing entry.
    pub fn add(&self, mut entry: TrackedEntry) -> Result<PathBuf, RegistryError> {
        let key = normalize_tracked_path(&entry.path);
        let alias = textual_key(&entry.path);
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&key) {
            return Err(RegistryError::AlreadyTracked(key));
        }
        entry.path = key.clone();
        inner.entries.insert(key.clone(), entry);
        inner.aliases.insert(alias, key.clone());
        Ok(key)
    }

    pub fn remove(&self, path: &Path) -> Result<TrackedEntry, RegistryError> {
        let mut inner = self.inner.lock();
        let key = inner
            .resolve(path)
            .ok_or_else(|| RegistryError::NotTracked(normalize_tracked_path(path)))?;
        inner.aliases.retain(|_, target| *target != key);
        inner
            .entries
            .remove(&key)
            .ok_or(RegistryError::NotTracked(key))
    }

    /// Point-in-time copy ordered by path
    pub fn snapshot(&self) -> Vec<TrackedEntry> {
        self.inner.lock().entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}
