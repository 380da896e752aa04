#![forbid(unsafe_code)]
//! sortdb-mem: pages, the page codec, paged files, and bounded pipes.
//!
//! Everything that moves records between memory and storage lives here. No
//! concrete storage backend is implemented in this crate; the `Storage` trait
//! is implemented by `sortdb-io`.

pub mod error;
pub mod page;
pub mod paged;
pub mod pipe;
pub mod storage;

pub use error::{Error, Result};
pub use page::Page;
pub use paged::PagedFile;
pub use pipe::Pipe;
pub use storage::Storage;
