//! Operator-level error type.
//!
//! Lower-crate errors are folded in so that callers see one enum: missing
//! files surface as `NotFound` and configuration problems as `Config`,
//! whichever layer detected them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpError>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("metadata error: {0}")]
    Meta(String),

    #[error("execution error: {0}")]
    Exec(String),

    #[error(transparent)]
    Storage(sortdb_mem::Error),

    #[error(transparent)]
    Io(sortdb_io::Error),

    #[error(transparent)]
    Core(sortdb_core::Error),
}

impl From<sortdb_core::Error> for OpError {
    fn from(e: sortdb_core::Error) -> Self {
        match e {
            sortdb_core::Error::Config(msg) => OpError::Config(msg),
            other => OpError::Core(other),
        }
    }
}

impl From<sortdb_mem::Error> for OpError {
    fn from(e: sortdb_mem::Error) -> Self {
        match e {
            sortdb_mem::Error::NotFound(path) => OpError::NotFound(path),
            sortdb_mem::Error::Core(core) => core.into(),
            other => OpError::Storage(other),
        }
    }
}

impl From<sortdb_io::Error> for OpError {
    fn from(e: sortdb_io::Error) -> Self {
        match e {
            sortdb_io::Error::Config(msg) => OpError::Config(msg),
            sortdb_io::Error::Mem(mem) => mem.into(),
            sortdb_io::Error::Core(core) => core.into(),
            other => OpError::Io(other),
        }
    }
}
