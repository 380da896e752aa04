//! External sort engine (TPMMS) running on a dedicated worker thread.
//!
//! The caller feeds records into the input pipe and shuts it down; the worker
//! generates sorted runs into a private scratch file (phase 1), then merges
//! them into the output pipe (phase 2) and shuts that down. The scratch file
//! is deleted when the worker exits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use sortdb_core::compare::Comparator;
use sortdb_core::config::SortConfig;
use sortdb_core::id::SortId;
use sortdb_core::order::OrderMaker;
use sortdb_core::types::Record;
use sortdb_mem::{PagedFile, Pipe, Storage};

use crate::error::{OpError, Result};

use super::merge::MultiwayMerger;
use super::run::{RunGenerator, SortStats};

static NEXT_SORT: AtomicU64 = AtomicU64::new(0);

/// Process-unique id; the pid keeps concurrent processes sharing a scratch
/// directory apart.
fn next_sort_id() -> SortId {
    let seq = NEXT_SORT.fetch_add(1, Ordering::Relaxed);
    SortId::new((u64::from(std::process::id()) << 32) | (seq & 0xffff_ffff))
}

pub fn scratch_path(scratch_dir: &str, id: SortId) -> String {
    format!("{}/tpmms-{:016x}.bin", scratch_dir.trim_end_matches('/'), id.get())
}

pub struct ExternalSort {
    id: SortId,
    input: Arc<Pipe<Record>>,
    output: Arc<Pipe<Record>>,
    worker: Option<JoinHandle<Result<SortStats>>>,
}

impl ExternalSort {
    /// Validate the request, create the scratch file and start the worker.
    ///
    /// Configuration errors are reported before any file or thread exists.
    pub fn start(
        input: Arc<Pipe<Record>>,
        output: Arc<Pipe<Record>>,
        order: OrderMaker,
        run_len_pages: usize,
        storage: Arc<dyn Storage>,
        config: &SortConfig,
    ) -> Result<Self> {
        order.require_non_empty()?;
        if run_len_pages == 0 {
            return Err(OpError::Config("run length must be at least one page".into()));
        }
        config.validate()?;

        let id = next_sort_id();
        let path = scratch_path(&config.scratch_dir, id);
        let scratch = PagedFile::create(Arc::clone(&storage), path.clone(), config.page_size)?;

        let worker = {
            let input = Arc::clone(&input);
            let output = Arc::clone(&output);
            std::thread::Builder::new()
                .name(format!("tpmms-{:x}", id.get()))
                .spawn(move || sort_worker(id, scratch, &input, &output, order, run_len_pages))
        };
        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                let _ = storage.delete(&path);
                return Err(OpError::Exec(format!("spawn sort worker: {e}")));
            }
        };
        tracing::debug!(sort = %id, scratch = %path, run_len_pages, "external sort started");

        Ok(Self {
            id,
            input,
            output,
            worker: Some(worker),
        })
    }

    pub fn id(&self) -> SortId {
        self.id
    }

    /// Wait for the worker and return its outcome.
    ///
    /// The output pipe must be consumed (concurrently or beforehand); the
    /// worker cannot exit while it is blocked on a full output pipe.
    pub fn finish(mut self) -> Result<SortStats> {
        self.input.shut_down();
        self.join()
    }

    fn join(&mut self) -> Result<SortStats> {
        let Some(handle) = self.worker.take() else {
            return Err(OpError::Exec(format!("{} already joined", self.id)));
        };
        handle
            .join()
            .map_err(|_| OpError::Exec(format!("{} worker panicked", self.id)))?
    }
}

impl Drop for ExternalSort {
    fn drop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.input.shut_down();
        let discarded = self.output.drain().count();
        if discarded > 0 {
            tracing::warn!(sort = %self.id, discarded, "external sort dropped before its output was consumed");
        }
        if let Err(e) = self.join() {
            tracing::warn!(sort = %self.id, error = %e, "external sort failed during teardown");
        }
    }
}

fn sort_worker(
    id: SortId,
    mut scratch: PagedFile,
    input: &Pipe<Record>,
    output: &Pipe<Record>,
    order: OrderMaker,
    run_len_pages: usize,
) -> Result<SortStats> {
    let result = run_phases(id, &mut scratch, input, output, order, run_len_pages);

    // Unblock both peers whatever happened.
    output.shut_down();
    input.shut_down();

    let path = scratch.path().to_string();
    if let Err(e) = scratch.delete() {
        tracing::warn!(sort = %id, scratch = %path, error = %e, "could not delete scratch file");
    }
    match &result {
        Ok(stats) => tracing::info!(
            sort = %id,
            runs = stats.runs,
            pages = stats.scratch_pages,
            records = stats.records,
            "external sort complete"
        ),
        Err(e) => tracing::error!(sort = %id, error = %e, "external sort failed"),
    }
    result
}

fn run_phases(
    id: SortId,
    scratch: &mut PagedFile,
    input: &Pipe<Record>,
    output: &Pipe<Record>,
    order: OrderMaker,
    run_len_pages: usize,
) -> Result<SortStats> {
    let set = RunGenerator::new(Comparator::new(order.clone()), run_len_pages).generate(input, scratch)?;
    tracing::debug!(sort = %id, runs = set.runs.len(), pages = set.total_pages, "phase 1 done");

    let merged = MultiwayMerger::new(scratch, &set, order)?.merge_into(output)?;
    tracing::debug!(sort = %id, records = merged, "phase 2 done");

    Ok(SortStats {
        runs: set.runs.len(),
        scratch_pages: set.total_pages,
        records: merged,
    })
}
