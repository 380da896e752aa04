//! Predicate lookup over a heap file whose records are sorted.
//!
//! When the predicate pins a prefix of the sort order with equality
//! constraints, the scan starts from a binary search over page boundaries;
//! otherwise it falls back to a forward scan. A lookup that finds nothing
//! leaves the cursor exactly where it was.

use std::cmp::Ordering;

use sortdb_core::cnf::Cnf;
use sortdb_core::compare::compare_across;
use sortdb_core::order::OrderMaker;
use sortdb_core::types::Record;
use sortdb_io::HeapFile;

use crate::error::Result;

pub(crate) fn next_matching(
    heap: &mut HeapFile,
    file_order: &OrderMaker,
    cnf: &Cnf,
    literal: &Record,
) -> Result<Option<Record>> {
    let saved = heap.position();
    let found = match cnf.query_orders(file_order) {
        Some(query) => seek_and_scan(heap, &query, cnf, literal),
        None => scan(heap, cnf, literal),
    };
    match found {
        Ok(Some(rec)) => Ok(Some(rec)),
        other => {
            heap.restore(saved);
            other
        }
    }
}

fn scan(heap: &mut HeapFile, cnf: &Cnf, literal: &Record) -> Result<Option<Record>> {
    while let Some(rec) = heap.get_next()? {
        if cnf.eval(&rec, literal) {
            return Ok(Some(rec));
        }
    }
    Ok(None)
}

fn seek_and_scan(
    heap: &mut HeapFile,
    (record_order, literal_order): &(OrderMaker, OrderMaker),
    cnf: &Cnf,
    literal: &Record,
) -> Result<Option<Record>> {
    let key_cmp = |rec: &Record| compare_across(rec, record_order, literal, literal_order);

    let Some(current) = heap.peek_current()? else {
        return Ok(None);
    };
    match key_cmp(current) {
        Ordering::Greater => return Ok(None),
        Ordering::Equal => {}
        Ordering::Less => {
            let start = heap.current_page();
            let target = last_page_below(heap, start, &key_cmp)?;
            if target != start {
                heap.seek_page(target);
            }
            tracing::debug!(from = start, to = target, "binary search positioned scan");
        }
    }

    while let Some(rec) = heap.get_next()? {
        match key_cmp(&rec) {
            Ordering::Less => continue,
            Ordering::Equal => {
                if cnf.eval(&rec, literal) {
                    return Ok(Some(rec));
                }
            }
            Ordering::Greater => break,
        }
    }
    Ok(None)
}

/// Last page in `start..page_count` whose first key sorts strictly below the
/// literal. The caller has checked that the cursor's next record does, so
/// `start` always qualifies.
///
/// Equal keys may straddle a page boundary, so landing on the page that
/// merely starts with an equal key would skip matches on its predecessor.
fn last_page_below(
    heap: &HeapFile,
    start: u64,
    key_cmp: &impl Fn(&Record) -> Ordering,
) -> Result<u64> {
    let (mut lo, mut hi) = (start, heap.page_count().saturating_sub(1));
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        let page = heap.read_page(mid)?;
        match page.first().map(key_cmp) {
            Some(Ordering::Less) => lo = mid,
            _ => hi = mid - 1,
        }
    }
    Ok(lo)
}
