use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{CacheRecord, ContactField, IdentityCache};
use crate::error::SessionError;

/// The config needed for the file-backed cache: a parent directory plus a
/// namespace subdirectory holding the record and contact keys.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FileCacheConfig {
    pub dir: String,
    pub namespace: String,
}

const RECORD_KEY: &str = "identity.json";

/// A cache backed by one JSON file per key under a fixed namespace
/// directory. Writes replace the whole file through a temp file and an
/// atomic rename, so concurrent execution contexts see either the old
/// record or the new one, never a torn write. Last write wins.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(config: &FileCacheConfig) -> Result<Self, SessionError> {
        let root = PathBuf::from(&config.dir).join(&config.namespace);
        fs::create_dir_all(&root).map_err(|e| {
            SessionError::CacheUnavailable(format!("cannot create cache directory: {}", e))
        })?;
        debug!("File cache rooted at {}", root.display());
        Ok(FileCache { root })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn write_key(&self, key: &str, contents: &str) -> Result<(), SessionError> {
        let tmp = self.key_path(&format!("{}.tmp", key));
        fs::write(&tmp, contents).map_err(|e| {
            SessionError::CacheUnavailable(format!("cannot write cache key '{}': {}", key, e))
        })?;
        fs::rename(&tmp, self.key_path(key)).map_err(|e| {
            SessionError::CacheUnavailable(format!("cannot replace cache key '{}': {}", key, e))
        })
    }

    fn read_key(&self, key: &str) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::CacheUnavailable(format!(
                "cannot read cache key '{}': {}",
                key, e
            ))),
        }
    }

    fn remove_key(&self, key: &str) -> Result<(), SessionError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::CacheUnavailable(format!(
                "cannot remove cache key '{}': {}",
                key, e
            ))),
        }
    }
}

impl IdentityCache for FileCache {
    fn read(&self) -> Result<Option<CacheRecord>, SessionError> {
        let contents = match self.read_key(RECORD_KEY)? {
            Some(contents) => contents,
            None => return Ok(None),
        };

        match serde_json::from_str::<CacheRecord>(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Cache record unparsable, clearing it: {}", e);
                self.remove_key(RECORD_KEY)?;
                Err(SessionError::CacheCorrupt(e.to_string()))
            }
        }
    }

    fn write(&self, record: &CacheRecord) -> Result<(), SessionError> {
        let contents = serde_json::to_string(record).map_err(|e| {
            SessionError::CacheUnavailable(format!("cannot serialize cache record: {}", e))
        })?;
        self.write_key(RECORD_KEY, &contents)
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.remove_key(RECORD_KEY)
    }

    fn write_contact(&self, field: ContactField, value: &str) -> Result<(), SessionError> {
        self.write_key(field.key(), value)
    }

    fn read_contact(&self, field: ContactField) -> Result<Option<String>, SessionError> {
        self.read_key(field.key())
    }

    fn clear_contacts(&self) -> Result<(), SessionError> {
        self.remove_key(ContactField::Email.key())?;
        self.remove_key(ContactField::Phone.key())
    }
}
