//! Append-only file of fixed-size pages on top of a `Storage`.
//!
//! Physical page 0 is reserved for the file header:
//! [ magic: u32 ][ version: u16 ][ reserved: u16 ][ page_size: u32 ] (zero padded)
//! Data pages follow in append order. Page indices handed out by this type
//! are data-page indices: index `i` lives at physical page `i + 1`.

use std::sync::Arc;

use sortdb_core::config::MIN_PAGE_SIZE;

use crate::error::{Error, Result};
use crate::page::{header::read_u32, Page};
use crate::storage::Storage;

pub const FILE_MAGIC: u32 = 0x5344_4246; // "SDBF"
pub const FILE_VERSION: u16 = 1;
const FILE_HEADER_LEN: usize = 4 + 2 + 2 + 4;

pub struct PagedFile {
    storage: Arc<dyn Storage>,
    path: String,
    page_size: usize,
    page_count: u64,
}

impl std::fmt::Debug for PagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFile")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .field("page_count", &self.page_count)
            .finish()
    }
}

impl PagedFile {
    /// Create (or truncate) a paged file holding no data pages.
    pub fn create(storage: Arc<dyn Storage>, path: impl Into<String>, page_size: usize) -> Result<Self> {
        if page_size < MIN_PAGE_SIZE || page_size > u32::MAX as usize {
            return Err(sortdb_core::Error::Config(format!(
                "page size {page_size} out of range (minimum {MIN_PAGE_SIZE})"
            ))
            .into());
        }
        let path = path.into();

        let mut header = Vec::with_capacity(page_size);
        header.extend_from_slice(&FILE_MAGIC.to_le_bytes());
        header.extend_from_slice(&FILE_VERSION.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&(page_size as u32).to_le_bytes());
        header.resize(page_size, 0);
        storage.write(&path, &header)?;
        tracing::debug!(path = %path, page_size, "created paged file");

        Ok(Self {
            storage,
            path,
            page_size,
            page_count: 0,
        })
    }

    /// Open an existing paged file, reading its page size from page 0.
    pub fn open(storage: Arc<dyn Storage>, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !storage.exists(&path) {
            return Err(Error::NotFound(path));
        }

        let head = storage.read_range(&path, 0, FILE_HEADER_LEN)?;
        if head.len() < FILE_HEADER_LEN {
            return Err(Error::Codec(format!("{path}: short file header")));
        }
        let magic = read_u32(&head[0..4]);
        let version = u16::from_le_bytes([head[4], head[5]]);
        if magic != FILE_MAGIC || version != FILE_VERSION {
            return Err(Error::Codec(format!("{path}: bad magic/version")));
        }
        let page_size = read_u32(&head[8..12]) as usize;
        if page_size < MIN_PAGE_SIZE {
            return Err(Error::Codec(format!("{path}: bad page size {page_size}")));
        }

        let size = storage.size(&path)?;
        if size % page_size as u64 != 0 || size == 0 {
            return Err(Error::Codec(format!(
                "{path}: size {size} is not a whole number of {page_size} byte pages"
            )));
        }

        Ok(Self {
            storage,
            path,
            page_size,
            page_count: size / page_size as u64 - 1,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of data pages (page 0 excluded).
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// An empty page sized for this file.
    pub fn new_page(&self) -> Page {
        Page::new(self.page_size)
    }

    /// Append `page` after the last data page and return its index.
    pub fn append_page(&mut self, page: &Page) -> Result<u64> {
        if page.capacity() != self.page_size {
            return Err(Error::Codec(format!(
                "page of {} bytes appended to {} ({} byte pages)",
                page.capacity(),
                self.path,
                self.page_size
            )));
        }
        let bytes = page.to_bytes()?;
        let offset = self.storage.append(&self.path, &bytes)?;
        let expected = (self.page_count + 1) * self.page_size as u64;
        if offset != expected {
            return Err(Error::Storage(format!(
                "{}: page appended at offset {offset}, expected {expected}",
                self.path
            )));
        }
        let index = self.page_count;
        self.page_count += 1;
        tracing::trace!(path = %self.path, index, "appended page");
        Ok(index)
    }

    /// Read data page `index`.
    pub fn get_page(&self, index: u64) -> Result<Page> {
        if index >= self.page_count {
            return Err(Error::PageOutOfRange {
                index,
                len: self.page_count,
            });
        }
        let offset = (index + 1) * self.page_size as u64;
        let bytes = self.storage.read_range(&self.path, offset, self.page_size)?;
        if bytes.len() < self.page_size {
            return Err(Error::Storage(format!(
                "{}: short read of page {index}",
                self.path
            )));
        }
        Page::from_bytes(&bytes, self.page_size, index)
    }

    /// Remove the file from storage.
    pub fn delete(self) -> Result<()> {
        self.storage.delete(&self.path)
    }
}
