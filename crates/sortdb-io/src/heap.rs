//! Unordered heap file: records appended in insertion order, scanned with a
//! cursor that can be saved and restored.
//!
//! Writes are buffered in one dirty page that is appended to the underlying
//! `PagedFile` when it fills up or on `flush`/`close`. Scans only see flushed
//! pages; `move_first` flushes before rewinding.

use std::sync::Arc;

use sortdb_core::types::Record;
use sortdb_mem::{Page, PagedFile, Storage};

use crate::error::Result;

/// Scan position: the data page being read and its unread records.
///
/// `page` is `None` until the page at `page_index` has been loaded.
#[derive(Debug, Clone)]
pub struct Cursor {
    page_index: u64,
    page: Option<Page>,
}

impl Cursor {
    fn at(page_index: u64) -> Self {
        Self {
            page_index,
            page: None,
        }
    }

    pub fn page_index(&self) -> u64 {
        self.page_index
    }
}

#[derive(Debug)]
pub struct HeapFile {
    file: PagedFile,
    dirty: Option<Page>,
    cursor: Cursor,
}

impl HeapFile {
    /// Create (or truncate) an empty heap file.
    pub fn create(storage: Arc<dyn Storage>, path: impl Into<String>, page_size: usize) -> Result<Self> {
        let file = PagedFile::create(storage, path, page_size)?;
        Ok(Self {
            file,
            dirty: None,
            cursor: Cursor::at(0),
        })
    }

    pub fn open(storage: Arc<dyn Storage>, path: impl Into<String>) -> Result<Self> {
        let file = PagedFile::open(storage, path)?;
        Ok(Self {
            file,
            dirty: None,
            cursor: Cursor::at(0),
        })
    }

    pub fn path(&self) -> &str {
        self.file.path()
    }

    pub fn page_size(&self) -> usize {
        self.file.page_size()
    }

    /// Flushed data pages.
    pub fn page_count(&self) -> u64 {
        self.file.page_count()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.file.storage()
    }

    /// Append a record at the end of the file.
    pub fn add(&mut self, record: Record) -> Result<()> {
        Page::check_fits_empty(self.file.page_size(), &record)?;
        let page = self.dirty.get_or_insert_with(|| self.file.new_page());
        if let Err(record) = page.try_append(record) {
            self.file.append_page(page)?;
            page.clear();
            let bytes = Page::footprint(&record);
            page.try_append(record)
                .map_err(|_| sortdb_mem::Error::RecordTooLarge {
                    bytes,
                    capacity: page.capacity(),
                })?;
        }
        Ok(())
    }

    /// Write out the partially filled page, if any.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(page) = self.dirty.take() {
            if !page.is_empty() {
                self.file.append_page(&page)?;
            }
        }
        Ok(())
    }

    /// Flush and hand back the number of data pages written.
    pub fn close(&mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.file.page_count())
    }

    /// Remove the file from storage.
    pub fn delete(self) -> Result<()> {
        Ok(self.file.delete()?)
    }

    /// Rewind the scan to the first record.
    pub fn move_first(&mut self) -> Result<()> {
        self.flush()?;
        self.cursor = Cursor::at(0);
        Ok(())
    }

    /// Next record in file order, or `None` at end of file.
    pub fn get_next(&mut self) -> Result<Option<Record>> {
        if self.peek_current()?.is_none() {
            return Ok(None);
        }
        Ok(self.cursor.page.as_mut().and_then(Page::pop_first))
    }

    /// The record `get_next` would return, without consuming it.
    ///
    /// Loads pages as needed, so the cursor's page index may advance past
    /// exhausted pages.
    pub fn peek_current(&mut self) -> Result<Option<&Record>> {
        loop {
            match self.cursor.page.as_ref().map(Page::is_empty) {
                Some(false) => break,
                Some(true) => self.cursor = Cursor::at(self.cursor.page_index + 1),
                None => {
                    if self.cursor.page_index >= self.file.page_count() {
                        return Ok(None);
                    }
                    let page = self.file.get_page(self.cursor.page_index)?;
                    tracing::trace!(path = %self.file.path(), page = self.cursor.page_index, records = page.len(), "loaded page");
                    self.cursor.page = Some(page);
                }
            }
        }
        Ok(self.cursor.page.as_ref().and_then(Page::first))
    }

    /// Page index the cursor is on.
    pub fn current_page(&self) -> u64 {
        self.cursor.page_index
    }

    /// Position the cursor at the first record of page `index`.
    pub fn seek_page(&mut self, index: u64) {
        self.cursor = Cursor::at(index);
    }

    /// Read a page without moving the cursor.
    pub fn read_page(&self, index: u64) -> Result<Page> {
        Ok(self.file.get_page(index)?)
    }

    /// Snapshot of the scan position.
    pub fn position(&self) -> Cursor {
        self.cursor.clone()
    }

    /// Return to a position taken with `position`.
    pub fn restore(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemoryStorage;
    use sortdb_core::types::Scalar;

    fn rec(v: i32) -> Record {
        Record::new(vec![Scalar::Int(v), Scalar::Str(format!("row-{v}"))])
    }

    fn heap_with(n: i32) -> HeapFile {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut heap = HeapFile::create(storage, "heap.bin", 128).unwrap();
        for v in 0..n {
            heap.add(rec(v)).unwrap();
        }
        heap.move_first().unwrap();
        heap
    }

    #[test]
    fn scans_in_insertion_order_across_pages() {
        let mut heap = heap_with(20);
        assert!(heap.page_count() > 1);

        let mut got = Vec::new();
        while let Some(r) = heap.get_next().unwrap() {
            got.push(r);
        }
        assert_eq!(got, (0..20).map(rec).collect::<Vec<_>>());
        assert!(heap.get_next().unwrap().is_none());
    }

    #[test]
    fn restore_rewinds_to_saved_position() {
        let mut heap = heap_with(20);
        for _ in 0..7 {
            heap.get_next().unwrap();
        }
        let saved = heap.position();
        let next = heap.get_next().unwrap();
        for _ in 0..5 {
            heap.get_next().unwrap();
        }
        heap.restore(saved);
        assert_eq!(heap.get_next().unwrap(), next);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut heap = heap_with(3);
        assert_eq!(heap.peek_current().unwrap(), Some(&rec(0)));
        assert_eq!(heap.get_next().unwrap(), Some(rec(0)));
        assert_eq!(heap.peek_current().unwrap(), Some(&rec(1)));
    }

    #[test]
    fn seek_and_read_page() {
        let mut heap = heap_with(20);
        let second = heap.read_page(1).unwrap();
        heap.seek_page(1);
        assert_eq!(heap.current_page(), 1);
        assert_eq!(heap.get_next().unwrap().as_ref(), second.first());
    }

    #[test]
    fn empty_file_scans_nothing() {
        let mut heap = heap_with(0);
        assert_eq!(heap.page_count(), 0);
        assert!(heap.get_next().unwrap().is_none());
    }

    #[test]
    fn reopen_sees_flushed_pages() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut heap = HeapFile::create(storage.clone(), "h", 256).unwrap();
        heap.add(rec(1)).unwrap();
        heap.add(rec(2)).unwrap();
        assert_eq!(heap.close().unwrap(), 1);

        let mut again = HeapFile::open(storage, "h").unwrap();
        assert_eq!(again.get_next().unwrap(), Some(rec(1)));
        assert_eq!(again.get_next().unwrap(), Some(rec(2)));
    }
}
