pub mod base;
pub mod file_cache;
pub mod no_cache;

// Re-export the primary cache items so code outside can do
// "use crate::cache::{IdentityCache, create_cache};"
pub use base::{create_cache, CacheRecord, ContactField, IdentityCache};
