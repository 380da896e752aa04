//! Phase 1 of the external sort: sorted run generation, and the per-run read
//! state used by phase 2.
//!
//! Records are accumulated into page-sized buffers exactly as they will be
//! laid out in the scratch file. Once the batch spans the configured page
//! budget it is sorted and written out as one contiguous run of pages.

use sortdb_core::compare::Comparator;
use sortdb_core::id::RunId;
use sortdb_core::types::Record;
use sortdb_mem::{Page, PagedFile, Pipe};

use crate::error::Result;

/// Placement of one sorted run inside the scratch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMeta {
    pub id: RunId,
    pub start_page: u64,
    pub pages: u64,
    pub records: u64,
}

/// Every run produced by phase 1.
#[derive(Debug, Clone, Default)]
pub struct RunSet {
    pub runs: Vec<RunMeta>,
    /// Data pages in the scratch file once phase 1 is done.
    pub total_pages: u64,
}

impl RunSet {
    pub fn records(&self) -> u64 {
        self.runs.iter().map(|r| r.records).sum()
    }
}

/// Summary of a completed sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    pub runs: usize,
    pub scratch_pages: u64,
    pub records: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Alive,
    Exhausted,
}

/// Read side of one run during the merge. Owns a single page buffer.
#[derive(Debug)]
pub struct Run {
    meta: RunMeta,
    next_page: u64,
    pages_fetched: u64,
    page: Page,
    state: RunState,
}

impl Run {
    pub fn new(meta: RunMeta, page_size: usize) -> Self {
        Self {
            meta,
            next_page: meta.start_page,
            pages_fetched: 0,
            page: Page::new(page_size),
            state: RunState::Alive,
        }
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Whether another page of this run may be read from a scratch file of
    /// `total_pages` data pages.
    pub fn can_fetch_page(&self, total_pages: u64) -> bool {
        self.state == RunState::Alive
            && self.pages_fetched < self.meta.pages
            && self.next_page < total_pages
    }

    /// Next record of the run in sorted order, paging in lazily.
    ///
    /// Returns `None` once the run is exhausted; it stays exhausted.
    pub fn next_record(&mut self, scratch: &PagedFile) -> Result<Option<Record>> {
        loop {
            if let Some(rec) = self.page.pop_first() {
                return Ok(Some(rec));
            }
            if !self.can_fetch_page(scratch.page_count()) {
                self.state = RunState::Exhausted;
                return Ok(None);
            }
            self.page = scratch.get_page(self.next_page)?;
            self.next_page += 1;
            self.pages_fetched += 1;
        }
    }
}

/// Splits an input stream into sorted runs.
pub struct RunGenerator {
    comparator: Comparator,
    run_len_pages: usize,
}

impl RunGenerator {
    pub fn new(comparator: Comparator, run_len_pages: usize) -> Self {
        Self {
            comparator,
            run_len_pages: run_len_pages.max(1),
        }
    }

    /// Drain `input` until end-of-stream, writing one run per full batch.
    pub fn generate(&self, input: &Pipe<Record>, scratch: &mut PagedFile) -> Result<RunSet> {
        let mut set = RunSet::default();
        let mut full: Vec<Page> = Vec::with_capacity(self.run_len_pages);
        let mut current = scratch.new_page();

        while let Some(rec) = input.remove() {
            Page::check_fits_empty(scratch.page_size(), &rec)?;
            let Err(rec) = current.try_append(rec) else {
                continue;
            };
            full.push(std::mem::replace(&mut current, scratch.new_page()));
            if full.len() == self.run_len_pages {
                self.flush_run(&mut full, scratch, &mut set)?;
            }
            push_into_empty(&mut current, rec)?;
        }

        if !current.is_empty() {
            full.push(current);
        }
        if !full.is_empty() {
            self.flush_run(&mut full, scratch, &mut set)?;
        }
        set.total_pages = scratch.page_count();
        Ok(set)
    }

    /// Sort the batch held in `pages` and append it to scratch as one run.
    fn flush_run(&self, pages: &mut Vec<Page>, scratch: &mut PagedFile, set: &mut RunSet) -> Result<()> {
        let mut batch: Vec<Record> = pages.iter_mut().flat_map(|p| p.drain()).collect();
        pages.clear();
        batch.sort_by(|a, b| self.comparator.compare(a, b));

        let start_page = scratch.page_count();
        let records = batch.len() as u64;
        let mut page = scratch.new_page();
        for rec in batch {
            if let Err(rec) = page.try_append(rec) {
                scratch.append_page(&page)?;
                page.clear();
                push_into_empty(&mut page, rec)?;
            }
        }
        if !page.is_empty() {
            scratch.append_page(&page)?;
        }

        let meta = RunMeta {
            id: RunId::new(set.runs.len() as u64),
            start_page,
            pages: scratch.page_count() - start_page,
            records,
        };
        tracing::debug!(run = %meta.id, start = meta.start_page, pages = meta.pages, records, "flushed sorted run");
        set.runs.push(meta);
        Ok(())
    }
}

fn push_into_empty(page: &mut Page, rec: Record) -> Result<()> {
    let bytes = Page::footprint(&rec);
    let capacity = page.capacity();
    page.try_append(rec)
        .map_err(|_| sortdb_mem::Error::RecordTooLarge { bytes, capacity }.into())
}
