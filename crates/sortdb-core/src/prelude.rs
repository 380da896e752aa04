//! Convenient re-exports for downstream crates.

pub use crate::cnf::{CompOp, Comparison, Cnf, Operand};
pub use crate::compare::{compare_across, Comparator};
pub use crate::config::{SortConfig, StorageConfig};
pub use crate::error::{Error, Result};
pub use crate::id::{RunId, SortId};
pub use crate::order::{OrderMaker, SortKey, SortTuple};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Record, Scalar};
