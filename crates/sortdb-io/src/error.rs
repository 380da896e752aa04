use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),

    #[error("load: {0}")]
    Load(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Mem(#[from] sortdb_mem::Error),

    #[error(transparent)]
    Core(#[from] sortdb_core::Error),
}
