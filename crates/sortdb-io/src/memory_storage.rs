//! In-memory storage backend for testing.
//!
//! HashMap-backed implementation of the `Storage` trait, selected with the
//! `memory://` URI scheme so tests avoid file I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sortdb_mem::error::{Error as MemError, Result as MemResult};
use sortdb_mem::Storage;

/// Thread-safe in-memory storage. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> MemResult<()> {
        self.data().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn append(&self, path: &str, bytes: &[u8]) -> MemResult<u64> {
        let mut data = self.data();
        let entry = data.entry(path.to_string()).or_default();
        let offset = entry.len() as u64;
        entry.extend_from_slice(bytes);
        Ok(offset)
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> MemResult<Vec<u8>> {
        let data = self.data();
        let bytes = data
            .get(path)
            .ok_or_else(|| MemError::NotFound(path.to_string()))?;

        let start = (offset as usize).min(bytes.len());
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn delete(&self, path: &str) -> MemResult<()> {
        self.data().remove(path);
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> MemResult<()> {
        let mut data = self.data();
        let bytes = data
            .remove(from)
            .ok_or_else(|| MemError::NotFound(from.to_string()))?;
        data.insert(to.to_string(), bytes);
        Ok(())
    }

    fn size(&self, path: &str) -> MemResult<u64> {
        self.data()
            .get(path)
            .map(|b| b.len() as u64)
            .ok_or_else(|| MemError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.data().contains_key(path)
    }

    fn list(&self, prefix: &str) -> MemResult<Vec<String>> {
        let mut result: Vec<String> = self
            .data()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_read_range() {
        let storage = MemoryStorage::new();
        storage.write("t/file", b"hello world").unwrap();

        assert_eq!(storage.read_range("t/file", 6, 5).unwrap(), b"world");
        assert_eq!(storage.read_range("t/file", 9, 10).unwrap(), b"ld");
        assert!(storage.read_range("t/file", 40, 1).unwrap().is_empty());
    }

    #[test]
    fn test_memory_storage_append() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.append("log", b"ab").unwrap(), 0);
        assert_eq!(storage.append("log", b"cd").unwrap(), 2);
        assert_eq!(storage.size("log").unwrap(), 4);
    }

    #[test]
    fn test_memory_storage_rename_and_delete() {
        let storage = MemoryStorage::new();
        storage.write("a", b"1").unwrap();
        storage.write("b", b"22").unwrap();

        storage.rename("a", "b").unwrap();
        assert!(!storage.exists("a"));
        assert_eq!(storage.size("b").unwrap(), 1);
        assert!(matches!(storage.rename("a", "c"), Err(MemError::NotFound(_))));

        storage.delete("b").unwrap();
        storage.delete("b").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_list() {
        let storage = MemoryStorage::new();
        storage.write("dir/file2", b"2").unwrap();
        storage.write("dir/file1", b"1").unwrap();
        storage.write("other/file3", b"3").unwrap();

        assert_eq!(storage.list("dir/").unwrap(), vec!["dir/file1", "dir/file2"]);
    }
}
