//! Fixed-capacity page of records.
//!
//! A `Page` is the unit of transfer between memory and a `PagedFile`. It
//! tracks how many serialized bytes its records occupy so callers can ask
//! whether one more record fits before appending.

pub mod codec;
pub mod header;

use std::collections::VecDeque;

use sortdb_core::types::Record;

use crate::error::{Error, Result};

pub use header::{PageHeader, HEADER_LEN};

/// Per-record length prefix inside the page payload.
pub const RECORD_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct Page {
    capacity: usize,
    used: usize,
    records: VecDeque<Record>,
}

impl Page {
    /// Create an empty page that serializes to exactly `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: HEADER_LEN,
            records: VecDeque::new(),
        }
    }

    /// Bytes a record occupies inside a page.
    pub fn footprint(record: &Record) -> usize {
        RECORD_PREFIX_LEN + codec::encoded_len(record)
    }

    /// Fail unless `record` fits in an empty page of `capacity` bytes.
    pub fn check_fits_empty(capacity: usize, record: &Record) -> Result<()> {
        let bytes = Self::footprint(record);
        if HEADER_LEN + bytes > capacity {
            return Err(Error::RecordTooLarge { bytes, capacity });
        }
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fits(&self, record: &Record) -> bool {
        self.used + Self::footprint(record) <= self.capacity
    }

    /// Append `record` if it fits, otherwise hand it back untouched.
    pub fn try_append(&mut self, record: Record) -> std::result::Result<(), Record> {
        if !self.fits(&record) {
            return Err(record);
        }
        self.used += Self::footprint(&record);
        self.records.push_back(record);
        Ok(())
    }

    /// Remove and return the first record.
    pub fn pop_first(&mut self) -> Option<Record> {
        let rec = self.records.pop_front()?;
        self.used -= Self::footprint(&rec);
        Some(rec)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Take every record out in order, leaving the page empty.
    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, Record> {
        self.used = HEADER_LEN;
        self.records.drain(..)
    }

    /// Drop every record, keeping the capacity.
    pub fn clear(&mut self) {
        self.records.clear();
        self.used = HEADER_LEN;
    }

    /// Serialize to exactly `capacity` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(self.used - HEADER_LEN);
        let mut scratch = Vec::new();
        for rec in &self.records {
            scratch.clear();
            codec::encode_record(rec, &mut scratch)?;
            payload.extend_from_slice(&(scratch.len() as u32).to_le_bytes());
            payload.extend_from_slice(&scratch);
        }

        let header = PageHeader::for_payload(self.records.len() as u32, &payload);
        let mut out = Vec::with_capacity(self.capacity);
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&payload);
        if out.len() > self.capacity {
            return Err(Error::Codec(format!(
                "page overflow: {} bytes in a {} byte page",
                out.len(),
                self.capacity
            )));
        }
        out.resize(self.capacity, 0);
        Ok(out)
    }

    /// Parse a serialized page. `index` is only used for error reporting.
    pub fn from_bytes(bytes: &[u8], capacity: usize, index: u64) -> Result<Self> {
        let header = PageHeader::from_bytes(bytes)?;
        let end = HEADER_LEN + header.payload_len as usize;
        if end > bytes.len() || end > capacity {
            return Err(Error::Codec(format!(
                "page {index} payload length {} exceeds page size",
                header.payload_len
            )));
        }
        let payload = &bytes[HEADER_LEN..end];
        if !header.verify(payload) {
            return Err(Error::ChecksumMismatch(index));
        }

        let mut page = Page::new(capacity);
        let mut pos = 0;
        for _ in 0..header.record_count {
            if pos + RECORD_PREFIX_LEN > payload.len() {
                return Err(Error::Codec(format!("page {index} truncated")));
            }
            let len = header::read_u32(&payload[pos..]) as usize;
            pos += RECORD_PREFIX_LEN;
            let rec_bytes = payload
                .get(pos..pos + len)
                .ok_or_else(|| Error::Codec(format!("page {index} truncated")))?;
            pos += len;
            let rec = codec::decode_record(rec_bytes)?;
            page.try_append(rec)
                .map_err(|_| Error::Codec(format!("page {index} overflows its capacity")))?;
        }
        Ok(page)
    }
}
