#![forbid(unsafe_code)]
//! sortdb: two-phase multiway merge sort and incrementally merged sorted files.
//!
//! This crate re-exports the workspace members:
//! - `sortdb_core`: records, schemas, sort orders, predicates, configuration
//! - `sortdb_mem`: pages, paged files, storage trait, pipes
//! - `sortdb_io`: storage backends, heap files, table loading
//! - `sortdb_operators`: the external sort engine and `SortedFile`

pub use sortdb_core;
pub use sortdb_io;
pub use sortdb_mem;
pub use sortdb_operators;

pub use sortdb_core::prelude::{
    Cnf, Comparator, DataType, Field, OrderMaker, Record, Scalar, Schema, SortConfig, SortKey,
};
pub use sortdb_mem::{Pipe, Storage};
pub use sortdb_operators::{ExternalSort, OpError, SortInfo, SortStats, SortedFile};

use std::sync::Arc;

/// Load a `SortConfig` from a JSON document, falling back to environment
/// variables (and then defaults) when `json` is `None`, and build the storage
/// backend it names.
pub fn configure(json: Option<&str>) -> sortdb_operators::Result<(SortConfig, Arc<dyn Storage>)> {
    let cfg = match json {
        Some(text) => SortConfig::from_json_str(text)?,
        None => SortConfig::from_env(),
    };
    cfg.validate()?;
    let storage = sortdb_io::build_storage_from_config(&cfg.storage_config())?;
    Ok((cfg, storage))
}
