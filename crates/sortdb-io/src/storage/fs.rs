use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use sortdb_mem::error::{Error as MemError, Result as MemResult};
use sortdb_mem::Storage;

/// Local filesystem storage (paths are host paths).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

fn make_parent(p: &Path) -> MemResult<()> {
    if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MemError::Storage(format!("mkparent: {e}")))?;
    }
    Ok(())
}

impl Storage for FsStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> MemResult<()> {
        let p = Path::new(path);
        make_parent(p)?;
        let mut f = File::create(p).map_err(|e| MemError::Storage(format!("create {path}: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| MemError::Storage(format!("write {path}: {e}")))?;
        f.flush()
            .map_err(|e| MemError::Storage(format!("flush {path}: {e}")))?;
        Ok(())
    }

    fn append(&self, path: &str, bytes: &[u8]) -> MemResult<u64> {
        let p = Path::new(path);
        make_parent(p)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(p)
            .map_err(|e| MemError::Storage(format!("open {path}: {e}")))?;
        let offset = f
            .seek(SeekFrom::End(0))
            .map_err(|e| MemError::Storage(format!("seek {path}: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| MemError::Storage(format!("append {path}: {e}")))?;
        Ok(offset)
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> MemResult<Vec<u8>> {
        let mut f = File::open(Path::new(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MemError::NotFound(path.to_string()),
            _ => MemError::Storage(format!("open {path}: {e}")),
        })?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| MemError::Storage(format!("seek {path}: {e}")))?;
        let mut buf = Vec::with_capacity(len);
        f.take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| MemError::Storage(format!("read {path}: {e}")))?;
        Ok(buf)
    }

    fn delete(&self, path: &str) -> MemResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemError::Storage(format!("delete {path}: {e}"))),
        }
    }

    fn rename(&self, from: &str, to: &str) -> MemResult<()> {
        make_parent(Path::new(to))?;
        fs::rename(from, to).map_err(|e| MemError::Storage(format!("rename {from} -> {to}: {e}")))
    }

    fn size(&self, path: &str) -> MemResult<u64> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MemError::NotFound(path.to_string()),
            _ => MemError::Storage(format!("size {path}: {e}")),
        })?;
        Ok(meta.len())
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn list(&self, prefix: &str) -> MemResult<Vec<String>> {
        let prefix_path = Path::new(prefix);
        let mut results = Vec::new();

        if !prefix_path.exists() {
            return Ok(results);
        }

        if prefix_path.is_file() {
            if let Some(s) = prefix_path.to_str() {
                results.push(s.to_string());
            }
            return Ok(results);
        }

        fn visit_dirs(dir: &Path, results: &mut Vec<String>) -> std::io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    visit_dirs(&path, results)?;
                } else if let Some(s) = path.to_str() {
                    results.push(s.to_string());
                }
            }
            Ok(())
        }

        visit_dirs(prefix_path, &mut results)
            .map_err(|e| MemError::Storage(format!("list {prefix}: {e}")))?;
        results.sort();
        Ok(results)
    }
}
