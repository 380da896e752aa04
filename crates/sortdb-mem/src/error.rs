use thiserror::Error;

/// Result type local to sortdb-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("checksum mismatch on page {0}")]
    ChecksumMismatch(u64),

    #[error("record of {bytes} bytes does not fit in an empty page of {capacity} bytes")]
    RecordTooLarge { bytes: usize, capacity: usize },

    #[error("page {index} out of range (file has {len} pages)")]
    PageOutOfRange { index: u64, len: u64 },

    #[error(transparent)]
    Core(#[from] sortdb_core::Error),
}
