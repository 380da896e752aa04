#![forbid(unsafe_code)]
//! sortdb-core: values, schemas, sort orders, comparators, predicates, config.
//!
//! Pure data and pure functions only. Paging and storage live in `sortdb-mem`,
//! concrete storage backends in `sortdb-io`, and the sort engine in
//! `sortdb-operators`.

pub mod cnf;
pub mod compare;
pub mod config;
pub mod error;
pub mod id;
pub mod order;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
