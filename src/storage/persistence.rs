//! On-disk layout of the credential store.
//!
//! The file is a flat TOML table. Each key is an instance endpoint with its
//! `:` separator replaced by `_`; each value is the plaintext credential.
//! A literal `_` or `%` in an endpoint is percent-escaped so every key maps
//! back to exactly one endpoint.

use crate::core::{AdminError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Key Encoding
// ============================================================================

const ADDRESS_SEPARATOR: char = ':';
const KEY_SEPARATOR: char = '_';
const ESCAPED_UNDERSCORE: &str = "%5F";
const ESCAPED_PERCENT: &str = "%25";

/// Turn an endpoint into a flat store key
pub fn encode_key(endpoint: &str) -> String {
    let mut key = String::with_capacity(endpoint.len());
    for c in endpoint.chars() {
        match c {
            ADDRESS_SEPARATOR => key.push(KEY_SEPARATOR),
            KEY_SEPARATOR => key.push_str(ESCAPED_UNDERSCORE),
            '%' => key.push_str(ESCAPED_PERCENT),
            c => key.push(c),
        }
    }
    key
}

/// Turn a flat store key back into an endpoint
pub fn decode_key(key: &str) -> String {
    let mut endpoint = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix(ESCAPED_UNDERSCORE) {
            endpoint.push(KEY_SEPARATOR);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(ESCAPED_PERCENT) {
            endpoint.push('%');
            rest = tail;
        } else {
            endpoint.push(if c == KEY_SEPARATOR { ADDRESS_SEPARATOR } else { c });
            rest = &rest[c.len_utf8()..];
        }
    }
    endpoint
}

// ============================================================================
// Store File
// ============================================================================

/// Outcome of reading the store file
#[derive(Debug)]
pub enum StoreContents {
    /// The file did not exist and an empty one was created
    Created,
    /// Entries keyed by endpoint
    Loaded(BTreeMap<String, String>),
}

pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry, creating an empty file when none exists yet
    pub fn read(&self) -> Result<StoreContents> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.create_empty()?;
                return Ok(StoreContents::Created);
            }
            Err(e) => return Err(self.load_error(e)),
        };

        let raw: BTreeMap<String, String> = toml::from_str(&text).map_err(|e| self.load_error(e))?;
        let entries = raw
            .into_iter()
            .map(|(key, credential)| (decode_key(&key), credential))
            .collect();
        Ok(StoreContents::Loaded(entries))
    }

    /// Rewrite the whole file from `entries` (keyed by endpoint).
    ///
    /// The new contents go to a sibling temp file first and are renamed over
    /// the old file, so a failed write never leaves a truncated store.
    pub fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let encoded: BTreeMap<String, &String> = entries
            .iter()
            .map(|(endpoint, credential)| (encode_key(endpoint), credential))
            .collect();
        let serialized = toml::to_string(&encoded).map_err(|e| self.persist_error(e))?;

        let dir = self.parent_dir();
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.persist_error(e))?;
        temp.write_all(serialized.as_bytes()).map_err(|e| self.persist_error(e))?;
        temp.flush().map_err(|e| self.persist_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.persist_error(e))?;
        temp.persist(&self.path).map_err(|e| self.persist_error(e.error))?;
        Ok(())
    }

    fn create_empty(&self) -> Result<()> {
        fs::create_dir_all(self.parent_dir()).map_err(|e| self.persist_error(e))?;
        File::create(&self.path).map_err(|e| self.persist_error(e))?;
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn load_error(&self, e: impl std::fmt::Display) -> AdminError {
        AdminError::StoreLoad {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }

    fn persist_error(&self, e: impl std::fmt::Display) -> AdminError {
        AdminError::StorePersist {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
