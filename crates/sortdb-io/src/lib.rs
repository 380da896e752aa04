#![forbid(unsafe_code)]
//! sortdb-io: storage backends, heap-file scans, and table loaders.
//!
//! - `storage`: `FsStorage` and the URI-driven backend builder.
//! - `memory_storage`: HashMap-backed storage for tests.
//! - `heap`: append-and-scan record file with a saveable cursor.
//! - `loader`: `|`-delimited text tables into records.

pub mod error;
pub mod heap;
pub mod loader;
pub mod memory_storage;
pub mod storage;

pub use error::{Error, Result};
pub use heap::{Cursor, HeapFile};
pub use loader::TblReader;
pub use memory_storage::MemoryStorage;
pub use storage::{build_storage_from_config, FsStorage};
