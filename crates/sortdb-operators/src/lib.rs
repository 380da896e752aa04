#![forbid(unsafe_code)]
//! sortdb-operators: the external sort engine and sorted files built on it.
//!
//! Design intent:
//! - One worker thread per sort; it talks to the caller only through pipes.
//! - Everything that touches disk goes through `sortdb_mem::Storage`.
//! - Sorted files merge new data incrementally instead of rewriting from scratch.

pub mod error;
pub mod sort;
pub mod sorted;

pub use error::{OpError, Result};
pub use sort::{ExternalSort, MultiwayMerger, RunGenerator, RunState, SortStats};
pub use sorted::{Mode, SortInfo, SortedFile};
