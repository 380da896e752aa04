//! Abstract byte storage underneath paged files.
//!
//! Implemented by `sortdb-io::FsStorage` for the local filesystem and by
//! `sortdb-io::MemoryStorage` for tests. Paths are plain strings so that
//! object-store style backends can implement the same trait.

use crate::error::Result;

pub trait Storage: Send + Sync {
    /// Write bytes to a path, replacing any previous content. Creates parent
    /// directories if needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Append bytes to the end of a path, creating it if missing.
    /// Returns the offset at which the bytes were written.
    fn append(&self, path: &str, bytes: &[u8]) -> Result<u64>;

    /// Read a byte range from a path. Returns at most `len` bytes.
    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &str) -> Result<()>;

    /// Move `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Size of a path in bytes.
    fn size(&self, path: &str) -> Result<u64>;

    fn exists(&self, path: &str) -> bool;

    /// List all paths under a prefix (for cleanup/debugging).
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
