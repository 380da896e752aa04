//! Sorted file: a heap file kept in a fixed sort order, with new records
//! merged in incrementally.
//!
//! Records added while the file is open go through an `ExternalSort`. The
//! first read, lookup or `close` after a batch of adds streams the sorted
//! batch and the existing file through a two-way merge into a temp file next
//! to the data file, which then replaces it.

mod meta;
mod search;

pub use meta::{meta_path, SortInfo};

use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sortdb_core::cnf::Cnf;
use sortdb_core::compare::Comparator;
use sortdb_core::config::SortConfig;
use sortdb_core::schema::Schema;
use sortdb_core::types::Record;
use sortdb_io::{HeapFile, TblReader};
use sortdb_mem::{Page, Pipe, Storage};

use crate::error::{OpError, Result};
use crate::sort::ExternalSort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reading,
    Writing,
}

/// Engine and pipes holding records added since the last merge.
struct Pending {
    input: Arc<Pipe<Record>>,
    output: Arc<Pipe<Record>>,
    engine: ExternalSort,
    added: u64,
}

pub struct SortedFile {
    storage: Arc<dyn Storage>,
    config: SortConfig,
    info: SortInfo,
    heap: HeapFile,
    pending: Option<Pending>,
}

impl SortedFile {
    /// Create an empty sorted file and its metadata.
    pub fn create(
        storage: Arc<dyn Storage>,
        path: &str,
        info: SortInfo,
        config: &SortConfig,
    ) -> Result<Self> {
        info.validate()?;
        config.validate()?;
        let heap = HeapFile::create(Arc::clone(&storage), path, config.page_size)?;
        meta::write(storage.as_ref(), path, &info)?;
        tracing::debug!(path, order = ?info.order, run_length = info.run_length, "created sorted file");
        Ok(Self {
            storage,
            config: config.clone(),
            info,
            heap,
            pending: None,
        })
    }

    /// Open an existing sorted file, reading its sort order from metadata.
    pub fn open(storage: Arc<dyn Storage>, path: &str, config: &SortConfig) -> Result<Self> {
        config.validate()?;
        if !storage.exists(path) {
            return Err(OpError::NotFound(path.to_string()));
        }
        let info = meta::read(storage.as_ref(), path)?;
        let heap = HeapFile::open(Arc::clone(&storage), path)?;
        Ok(Self {
            storage,
            config: config.clone(),
            info,
            heap,
            pending: None,
        })
    }

    pub fn path(&self) -> &str {
        self.heap.path()
    }

    pub fn info(&self) -> &SortInfo {
        &self.info
    }

    pub fn mode(&self) -> Mode {
        if self.pending.is_some() {
            Mode::Writing
        } else {
            Mode::Reading
        }
    }

    /// Data pages currently on disk (pending records excluded).
    pub fn page_count(&self) -> u64 {
        self.heap.page_count()
    }

    /// Queue a record for the next merge.
    ///
    /// A record too large for one page is rejected here, leaving records
    /// already queued untouched.
    pub fn add(&mut self, record: Record) -> Result<()> {
        Page::check_fits_empty(self.heap.page_size(), &record)?;
        if self.pending.is_none() {
            self.pending = Some(self.start_pending()?);
        }
        let Some(pending) = self.pending.as_mut() else {
            return Err(OpError::Exec("no pending sort".into()));
        };
        if pending.input.insert(record).is_err() {
            // The worker closes its input only when it has failed.
            let failed = self.pending.take();
            return Err(match failed.map(|p| p.engine.finish()) {
                Some(Err(e)) => e,
                _ => OpError::Exec("sort input closed unexpectedly".into()),
            });
        }
        pending.added += 1;
        Ok(())
    }

    fn start_pending(&self) -> Result<Pending> {
        // Scratch pages match the data file so every record that sorts also fits.
        let config = SortConfig {
            page_size: self.heap.page_size(),
            ..self.config.clone()
        };
        let input = Arc::new(Pipe::with_capacity(config.pipe_capacity));
        let output = Arc::new(Pipe::with_capacity(config.pipe_capacity));
        let engine = ExternalSort::start(
            Arc::clone(&input),
            Arc::clone(&output),
            self.info.order.clone(),
            self.info.run_length,
            Arc::clone(&self.storage),
            &config,
        )?;
        Ok(Pending {
            input,
            output,
            engine,
            added: 0,
        })
    }

    /// Merge pending records into the file. No-op when nothing is pending.
    pub fn close(&mut self) -> Result<()> {
        self.merge_pending()
    }

    /// Rewind to the first record, merging pending records first.
    pub fn move_first(&mut self) -> Result<()> {
        self.merge_pending()?;
        Ok(self.heap.move_first()?)
    }

    /// Next record in sort order.
    pub fn get_next(&mut self) -> Result<Option<Record>> {
        self.merge_pending()?;
        Ok(self.heap.get_next()?)
    }

    /// Next record at or after the cursor that satisfies `cnf` against
    /// `literal`. The cursor is left untouched when there is none.
    pub fn get_next_matching(&mut self, cnf: &Cnf, literal: &Record) -> Result<Option<Record>> {
        self.merge_pending()?;
        search::next_matching(&mut self.heap, &self.info.order, cnf, literal)
    }

    /// Bulk load a `|`-delimited table file and merge it in.
    pub fn load(&mut self, schema: &Schema, path: impl AsRef<Path>) -> Result<u64> {
        let mut loaded = 0u64;
        for rec in TblReader::from_path(schema.clone(), path.as_ref())? {
            self.add(rec?)?;
            loaded += 1;
        }
        self.merge_pending()?;
        tracing::info!(path = %path.as_ref().display(), loaded, "bulk load complete");
        Ok(loaded)
    }

    fn merge_pending(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        pending.input.shut_down();

        let data_path = self.heap.path().to_string();
        let temp_path = temp_path_beside(&data_path);
        let merged = self.write_merged(&pending.output, &temp_path);

        // After a failed merge the worker may still be blocked on a full
        // output pipe.
        pending.output.drain().for_each(drop);
        let sorted = pending.engine.finish();

        let (pages, records) = match (merged, sorted) {
            (Ok(written), Ok(_)) => written,
            (Err(e), _) | (Ok(_), Err(e)) => {
                self.discard_temp(&temp_path);
                self.heap.move_first()?;
                return Err(e);
            }
        };

        if pages == 0 {
            self.discard_temp(&temp_path);
        } else {
            if let Err(e) = self.storage.delete(&data_path) {
                tracing::warn!(path = %data_path, error = %e, "could not remove old sorted file");
            }
            if let Err(e) = self.storage.rename(&temp_path, &data_path) {
                tracing::error!(from = %temp_path, to = %data_path, error = %e, "could not replace sorted file");
                return Err(e.into());
            }
        }

        self.heap = HeapFile::open(Arc::clone(&self.storage), data_path.as_str())?;
        tracing::info!(
            path = %data_path,
            added = pending.added,
            records,
            pages,
            "merged pending records into sorted file"
        );
        Ok(())
    }

    /// Two-way merge of the sorted pending stream with the file's records.
    /// Returns the pages and records written.
    fn write_merged(&mut self, pending: &Pipe<Record>, temp_path: &str) -> Result<(u64, u64)> {
        let mut temp = HeapFile::create(Arc::clone(&self.storage), temp_path, self.heap.page_size())?;
        let cmp = Comparator::new(self.info.order.clone());
        self.heap.move_first()?;

        let mut records = 0u64;
        let mut next_new = pending.remove();
        let mut next_old = self.heap.get_next()?;
        loop {
            let rec = match (next_new.take(), next_old.take()) {
                (Some(new), Some(old)) => {
                    if cmp.compare(&new, &old) == Ordering::Less {
                        next_old = Some(old);
                        next_new = pending.remove();
                        new
                    } else {
                        next_new = Some(new);
                        next_old = self.heap.get_next()?;
                        old
                    }
                }
                (Some(new), None) => {
                    next_new = pending.remove();
                    new
                }
                (None, Some(old)) => {
                    next_old = self.heap.get_next()?;
                    old
                }
                (None, None) => break,
            };
            temp.add(rec)?;
            records += 1;
        }
        let pages = temp.close()?;
        Ok((pages, records))
    }

    fn discard_temp(&self, temp_path: &str) {
        if let Err(e) = self.storage.delete(temp_path) {
            tracing::warn!(path = %temp_path, error = %e, "could not remove temp file");
        }
    }
}

impl Drop for SortedFile {
    fn drop(&mut self) {
        if let Some(pending) = &self.pending {
            tracing::warn!(
                path = %self.heap.path(),
                discarded = pending.added,
                "sorted file dropped with unmerged records"
            );
        }
    }
}

static NEXT_TEMP: AtomicU64 = AtomicU64::new(0);

/// `<dir of data file>/tmp<seconds>.<micros>-<pid>-<seq>`
///
/// The pid and sequence number keep two merges in the same microsecond apart.
fn temp_path_beside(data_path: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = NEXT_TEMP.fetch_add(1, AtomicOrdering::Relaxed);
    let name = format!(
        "tmp{}.{}-{}-{seq}",
        now.as_secs(),
        now.subsec_micros(),
        std::process::id()
    );
    match Path::new(data_path).parent().and_then(Path::to_str) {
        Some(dir) if !dir.is_empty() => format!("{dir}/{name}"),
        _ => name,
    }
}
