//! Companion metadata file of a sorted file, stored at `<path>.meta.data`.
//!
//! Plain text, whitespace separated:
//! ```text
//! sorted
//! <run length in pages>
//! <number of sort attributes>
//! <attribute index> <Int|Double|String>    (once per attribute)
//! ```

use sortdb_core::config::SortConfig;
use sortdb_core::order::{OrderMaker, SortKey};
use sortdb_core::schema::DataType;
use sortdb_mem::Storage;

use crate::error::{OpError, Result};

const KIND_SORTED: &str = "sorted";

/// Sort order and run length of a sorted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortInfo {
    pub order: OrderMaker,
    pub run_length: usize,
}

impl SortInfo {
    pub fn new(order: OrderMaker, run_length: usize) -> Self {
        Self { order, run_length }
    }

    /// Sort info with the configured default run length.
    pub fn from_config(order: OrderMaker, config: &SortConfig) -> Self {
        Self::new(order, config.run_length_pages)
    }

    pub fn validate(&self) -> Result<()> {
        self.order.require_non_empty()?;
        if self.run_length == 0 {
            return Err(OpError::Config("run length must be at least one page".into()));
        }
        Ok(())
    }
}

pub fn meta_path(data_path: &str) -> String {
    format!("{data_path}.meta.data")
}

pub fn render(info: &SortInfo) -> String {
    format!("{KIND_SORTED}\n{}\n{}", info.run_length, info.order)
}

pub fn parse(text: &str) -> Result<SortInfo> {
    let mut tokens = text.split_whitespace();
    let mut next = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| OpError::Meta(format!("missing {what}")))
    };

    let kind = next("file kind")?;
    if kind != KIND_SORTED {
        return Err(OpError::Meta(format!("unsupported file kind '{kind}'")));
    }
    let run_length = number(next("run length")?)?;
    let count = number(next("attribute count")?)?;

    let mut order = OrderMaker::default();
    for _ in 0..count {
        let attr = number(next("attribute index")?)?;
        let data_type: DataType = next("attribute type")?
            .parse()
            .map_err(|e| OpError::Meta(format!("{e}")))?;
        order.push(SortKey::new(attr, data_type));
    }
    if let Some(extra) = tokens.next() {
        return Err(OpError::Meta(format!("unexpected trailing token '{extra}'")));
    }

    let info = SortInfo { order, run_length };
    info.validate()
        .map_err(|e| OpError::Meta(format!("invalid sort info: {e}")))?;
    Ok(info)
}

fn number(tok: &str) -> Result<usize> {
    tok.parse()
        .map_err(|_| OpError::Meta(format!("expected a number, found '{tok}'")))
}

pub fn write(storage: &dyn Storage, data_path: &str, info: &SortInfo) -> Result<()> {
    storage.write(&meta_path(data_path), render(info).as_bytes())?;
    Ok(())
}

pub fn read(storage: &dyn Storage, data_path: &str) -> Result<SortInfo> {
    let path = meta_path(data_path);
    let len = storage.size(&path)?;
    let bytes = storage.read_range(&path, 0, len as usize)?;
    let text = String::from_utf8(bytes).map_err(|e| OpError::Meta(format!("{path}: {e}")))?;
    parse(&text)
}
