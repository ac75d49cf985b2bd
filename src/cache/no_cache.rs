use super::base::{CacheRecord, ContactField, IdentityCache};
use crate::error::SessionError;

/// A no-op cache for embedders that run without durable storage. Reads
/// find nothing and writes succeed silently; the store then always waits
/// for the authoritative fetch instead of rendering optimistically.
pub struct NoCache;

impl NoCache {
    pub fn new() -> Self {
        NoCache
    }
}

impl Default for NoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityCache for NoCache {
    fn read(&self) -> Result<Option<CacheRecord>, SessionError> {
        Ok(None)
    }

    fn write(&self, _record: &CacheRecord) -> Result<(), SessionError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn write_contact(&self, _field: ContactField, _value: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn read_contact(&self, _field: ContactField) -> Result<Option<String>, SessionError> {
        Ok(None)
    }

    fn clear_contacts(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
