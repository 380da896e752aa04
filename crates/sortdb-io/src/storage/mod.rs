//! Storage adapters implementing `sortdb_mem::Storage`.
//!
//! - `fs`: local filesystem (default).
//! - `MemoryStorage`: HashMap-backed, selected with `memory://`.
//!
//! `build_storage_from_config` picks the backend from the configured storage
//! URI (e.g. `file:///var/db`, `memory://`, or no URI at all).

mod fs;
pub use fs::FsStorage;

use std::sync::Arc;

use sortdb_core::config::StorageConfig;
use sortdb_mem::Storage;

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

/// Build the storage backend named by the configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Arc<dyn Storage>> {
    tracing::debug!(uri = ?cfg.uri, root = %cfg.root, "building storage backend");
    match cfg.scheme() {
        // Bare paths and file:// URIs both mean the host filesystem.
        Some("file") | None => Ok(Arc::new(FsStorage::new())),
        Some("memory") | Some("mem") => Ok(Arc::new(MemoryStorage::new())),
        Some(other) => Err(Error::Config(format!(
            "unsupported storage scheme '{other}'"
        ))),
    }
}
