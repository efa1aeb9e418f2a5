use super::persistence::{StoreContents, StoreFile};
use crate::core::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Durable endpoint → credential mapping.
///
/// The store is the only writer of its file. Every upsert rewrites the file
/// in full; when that write fails the in-memory value is kept and the store
/// remembers that disk is behind until the next successful save.
pub struct CredentialStore {
    file: StoreFile,
    entries: BTreeMap<String, String>,
    synced: bool,
}

impl CredentialStore {
    /// Load the store at `path`.
    ///
    /// Never fails: a missing file is created empty, and an unreadable or
    /// unparseable file degrades to an empty store so the tool stays usable.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let file = StoreFile::new(path);
        let entries = match file.read() {
            Ok(StoreContents::Created) => {
                info!(path = %file.path().display(), "credential store not found, created empty file");
                BTreeMap::new()
            }
            Ok(StoreContents::Loaded(entries)) => {
                info!(path = %file.path().display(), entries = entries.len(), "credential store loaded");
                entries
            }
            Err(e) => {
                warn!(path = %file.path().display(), error = %e, "credential store unusable, starting empty");
                BTreeMap::new()
            }
        };

        Self {
            file,
            entries,
            synced: true,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current credential for `endpoint`, empty if none is recorded
    pub fn get(&self, endpoint: &str) -> &str {
        self.entries.get(endpoint).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, endpoint: &str) -> bool {
        self.entries.contains_key(endpoint)
    }

    /// Set `endpoint`'s credential and persist the whole store.
    ///
    /// Returns whether the write reached disk. A failed write is logged and
    /// not propagated.
    pub fn upsert(&mut self, endpoint: &str, credential: &str) -> bool {
        self.entries.insert(endpoint.to_string(), credential.to_string());
        self.flush()
    }

    /// Add an empty entry unless one exists. Memory only; call [`flush`](Self::flush) after.
    pub(crate) fn insert_if_absent(&mut self, endpoint: &str) -> bool {
        if self.entries.contains_key(endpoint) {
            return false;
        }
        self.entries.insert(endpoint.to_string(), String::new());
        self.synced = false;
        true
    }

    /// Write the current entries to disk, logging instead of failing
    pub fn flush(&mut self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.file.path().display(), error = %e, "credential store not persisted");
                false
            }
        }
    }

    /// Write the current entries to disk
    pub(crate) fn save(&mut self) -> Result<()> {
        self.synced = false;
        self.file.write(&self.entries)?;
        self.synced = true;
        Ok(())
    }

    /// Whether disk matches memory as of the last write attempt
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Snapshot of every entry
    pub fn dump(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
