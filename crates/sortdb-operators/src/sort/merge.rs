//! Phase 2 of the external sort: k-way merge of the runs in a scratch file.
//!
//! A min-heap holds the current head record of every alive run, ordered by
//! its sort key and then by run index so that equal keys come out in run
//! order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use sortdb_core::order::{OrderMaker, SortTuple};
use sortdb_core::types::Record;
use sortdb_mem::{PagedFile, Pipe};

use crate::error::{OpError, Result};

use super::run::{Run, RunSet};

struct HeadEntry {
    key: SortTuple,
    run: usize,
    record: Record,
}

impl PartialEq for HeadEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeadEntry {}

impl PartialOrd for HeadEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeadEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.run.cmp(&other.run))
    }
}

pub struct MultiwayMerger<'a> {
    scratch: &'a PagedFile,
    order: OrderMaker,
    runs: Vec<Run>,
    heap: BinaryHeap<Reverse<HeadEntry>>,
}

impl<'a> MultiwayMerger<'a> {
    /// Prime the heap with the first record of every run.
    pub fn new(scratch: &'a PagedFile, set: &RunSet, order: OrderMaker) -> Result<Self> {
        let runs = set
            .runs
            .iter()
            .map(|meta| Run::new(*meta, scratch.page_size()))
            .collect::<Vec<_>>();
        let mut merger = Self {
            scratch,
            order,
            heap: BinaryHeap::with_capacity(runs.len()),
            runs,
        };
        for idx in 0..merger.runs.len() {
            merger.refill(idx)?;
        }
        Ok(merger)
    }

    fn refill(&mut self, run: usize) -> Result<()> {
        if let Some(record) = self.runs[run].next_record(self.scratch)? {
            let key = self.order.extract(&record);
            self.heap.push(Reverse(HeadEntry { key, run, record }));
        }
        Ok(())
    }

    /// Runs that still have a record in the heap.
    pub fn alive_runs(&self) -> usize {
        self.heap.len()
    }

    /// Smallest remaining record across all runs.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(Reverse(head)) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(head.run)?;
        Ok(Some(head.record))
    }

    /// Stream every remaining record into `output`. Returns the number sent.
    ///
    /// Does not shut `output` down; the engine does that on every exit path.
    pub fn merge_into(mut self, output: &Pipe<Record>) -> Result<u64> {
        let mut sent = 0u64;
        while let Some(record) = self.next_record()? {
            output
                .insert(record)
                .map_err(|_| OpError::Exec("sort output pipe was shut down".into()))?;
            sent += 1;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sortdb_core::compare::Comparator;
    use sortdb_core::order::SortKey;
    use sortdb_core::schema::DataType;
    use sortdb_core::types::Scalar;
    use sortdb_io::MemoryStorage;
    use sortdb_mem::page::HEADER_LEN;
    use sortdb_mem::Page;

    use crate::sort::run::RunGenerator;

    fn rec(k: i32, tag: &str) -> Record {
        Record::new(vec![Scalar::Int(k), Scalar::Str(tag.into())])
    }

    fn order() -> OrderMaker {
        OrderMaker::new(vec![SortKey::new(0, DataType::Int)])
    }

    fn runs_of(input: &[Record], per_run: usize) -> (PagedFile, RunSet) {
        let size = HEADER_LEN + per_run * Page::footprint(&input[0]);
        let mut scratch =
            PagedFile::create(Arc::new(MemoryStorage::new()), "scratch", size).unwrap();
        let pipe = Pipe::with_capacity(input.len());
        for r in input {
            pipe.insert(r.clone()).unwrap();
        }
        pipe.shut_down();
        let set = RunGenerator::new(Comparator::new(order()), 1)
            .generate(&pipe, &mut scratch)
            .unwrap();
        (scratch, set)
    }

    #[test]
    fn merges_runs_in_key_order() {
        let input: Vec<Record> = [5, 3, 8, 1, 9, 2, 7, 4, 6]
            .iter()
            .map(|k| rec(*k, "x"))
            .collect();
        let (scratch, set) = runs_of(&input, 3);
        let out = Pipe::with_capacity(16);
        let sent = MultiwayMerger::new(&scratch, &set, order())
            .unwrap()
            .merge_into(&out)
            .unwrap();
        out.shut_down();

        assert_eq!(sent, 9);
        let keys: Vec<Scalar> = out.drain().map(|r| r.values[0].clone()).collect();
        assert_eq!(keys, (1..=9).map(Scalar::Int).collect::<Vec<_>>());
    }

    #[test]
    fn equal_keys_come_out_in_run_order() {
        // One record per run, all with the same key.
        let input = vec![rec(1, "a"), rec(1, "b"), rec(1, "c")];
        let (scratch, set) = runs_of(&input, 1);
        assert_eq!(set.runs.len(), 3);

        let mut merger = MultiwayMerger::new(&scratch, &set, order()).unwrap();
        assert_eq!(merger.alive_runs(), 3);
        let mut got = Vec::new();
        while let Some(r) = merger.next_record().unwrap() {
            got.push(r);
        }
        assert_eq!(got, input);
        assert_eq!(merger.alive_runs(), 0);
    }

    #[test]
    fn single_run_is_passed_through() {
        let input = vec![rec(2, "p"), rec(1, "q"), rec(2, "r")];
        let (scratch, set) = runs_of(&input, 3);
        assert_eq!(set.runs.len(), 1);

        let mut merger = MultiwayMerger::new(&scratch, &set, order()).unwrap();
        let mut got = Vec::new();
        while let Some(r) = merger.next_record().unwrap() {
            got.push(r);
        }
        assert_eq!(got, vec![rec(1, "q"), rec(2, "p"), rec(2, "r")]);
    }
}
