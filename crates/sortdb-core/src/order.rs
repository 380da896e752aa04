//! Composite sort keys.
//!
//! An `OrderMaker` is an ordered list of `(attribute index, attribute type)`
//! pairs. It is plain data: comparing records under it is the job of
//! `compare::Comparator`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Schema};
use crate::types::{compare_scalars, Record, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub attr: usize,
    pub data_type: DataType,
}

impl SortKey {
    pub fn new(attr: usize, data_type: DataType) -> Self {
        Self { attr, data_type }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMaker {
    keys: Vec<SortKey>,
}

impl OrderMaker {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Build an order over the named schema attributes, in the given order.
    pub fn from_names(schema: &Schema, names: &[&str]) -> Result<Self> {
        let keys = names
            .iter()
            .map(|name| schema.resolve(name).map(|(attr, ty)| SortKey::new(attr, ty)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub fn push(&mut self, key: SortKey) {
        self.keys.push(key);
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True when every key of `self` matches the leading keys of `other`.
    pub fn is_prefix_of(&self, other: &OrderMaker) -> bool {
        self.keys.len() <= other.keys.len()
            && self.keys.iter().zip(&other.keys).all(|(a, b)| a == b)
    }

    /// Two orders are compatible if one is a prefix of the other.
    pub fn is_compatible(&self, other: &OrderMaker) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Fails with a config error when the order has no keys.
    pub fn require_non_empty(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(Error::Config("sort order has no attributes".into()));
        }
        Ok(())
    }

    /// Extract this order's key values from `record`.
    pub fn extract(&self, record: &Record) -> SortTuple {
        SortTuple(
            self.keys
                .iter()
                .map(|k| record.get(k.attr).cloned())
                .collect(),
        )
    }
}

impl fmt::Display for OrderMaker {
    /// Metadata form: attribute count, then one `<index> <type>` line per key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.keys.len())?;
        for k in &self.keys {
            writeln!(f, "{} {}", k.attr, k.data_type)?;
        }
        Ok(())
    }
}

/// Key values extracted from a record by an `OrderMaker`.
///
/// Ordered ascending, lexicographically, consistent with `Comparator`.
/// Missing attributes sort before present ones.
#[derive(Debug, Clone)]
pub struct SortTuple(pub Vec<Option<Scalar>>);

pub(crate) fn compare_optional(a: Option<&Scalar>, b: Option<&Scalar>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_scalars(x, y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Ord for SortTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        for (x, y) in self.0.iter().zip(other.0.iter()) {
            match compare_optional(x.as_ref(), y.as_ref()) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for SortTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortTuple {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortTuple {}
