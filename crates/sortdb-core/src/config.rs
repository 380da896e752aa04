//! Sort/storage configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest page size accepted; leaves room for the page header and a few records.
pub const MIN_PAGE_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Pages of records sorted in memory per run during phase 1. Default run
    /// length for new sorted files (`SortInfo::from_config`); a sorted file
    /// keeps the run length recorded in its metadata.
    pub run_length_pages: usize,

    /// Size in bytes of every page in scratch and data files.
    pub page_size: usize,

    /// Capacity (records) of the bounded pipes feeding and draining a sort.
    pub pipe_capacity: usize,

    /// Directory for scratch run files (legacy local-path configuration).
    pub scratch_dir: String,

    /// Optional fully-qualified storage URI (e.g., `file:///data` or `memory://`).
    pub storage_uri: Option<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            run_length_pages: 16,
            page_size: 128 * 1024,
            pipe_capacity: 100,
            scratch_dir: "/tmp/sortdb-scratch".to_string(),
            storage_uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub uri: Option<String>,
    pub root: String,
}

impl StorageConfig {
    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .and_then(|uri| uri.split_once("://").map(|(scheme, _)| scheme))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

impl SortConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SORTDB_RUN_LENGTH_PAGES`: pages per sorted run
    /// - `SORTDB_PAGE_SIZE`: page size in bytes
    /// - `SORTDB_PIPE_CAPACITY`: records buffered per pipe
    /// - `SORTDB_SCRATCH_DIR`: scratch directory
    /// - `SORTDB_STORAGE_URI`: storage URI
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SORTDB_RUN_LENGTH_PAGES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.run_length_pages = v;
            }
        }

        if let Ok(s) = std::env::var("SORTDB_PAGE_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.page_size = v;
            }
        }

        if let Ok(s) = std::env::var("SORTDB_PIPE_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.pipe_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("SORTDB_SCRATCH_DIR") {
            cfg.scratch_dir = s;
        }

        if let Ok(s) = std::env::var("SORTDB_STORAGE_URI") {
            cfg.storage_uri = Some(s);
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject settings no sort can run with.
    pub fn validate(&self) -> Result<()> {
        if self.run_length_pages == 0 {
            return Err(Error::Config("run_length_pages must be at least 1".into()));
        }
        if self.page_size < MIN_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size {} is below the minimum of {MIN_PAGE_SIZE}",
                self.page_size
            )));
        }
        if self.pipe_capacity == 0 {
            return Err(Error::Config("pipe_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Produce a storage configuration snapshot used by the IO layer.
    pub fn storage_config(&self) -> StorageConfig {
        let root = match self.storage_uri.as_deref() {
            Some(uri) if uri.starts_with("file://") => {
                file_uri_to_path(uri).unwrap_or_else(|| self.scratch_dir.clone())
            }
            Some(uri) if uri.contains("://") => uri.trim_end_matches('/').to_string(),
            _ => self.scratch_dir.clone(),
        };

        StorageConfig {
            uri: self.storage_uri.clone(),
            root,
        }
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
