//! Lightweight record/value types shared by every layer.
//!
//! Records are positional tuples of scalars. They deliberately have no
//! intrinsic ordering: order is always relative to an `OrderMaker`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i32),
    Double(f64),
    Str(String),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Int(_) => DataType::Int,
            Scalar::Double(_) => DataType::Double,
            Scalar::Str(_) => DataType::String,
        }
    }

    /// Parse a text token as a value of the given type.
    pub fn parse(text: &str, data_type: DataType) -> Result<Self> {
        match data_type {
            DataType::Int => text
                .trim()
                .parse::<i32>()
                .map(Scalar::Int)
                .map_err(|_| Error::Parse(format!("cannot parse '{text}' as Int"))),
            DataType::Double => text
                .trim()
                .parse::<f64>()
                .map(Scalar::Double)
                .map_err(|_| Error::Parse(format!("cannot parse '{text}' as Double"))),
            DataType::String => Ok(Scalar::Str(text.to_string())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Int(_) => 0,
            Scalar::Double(_) => 1,
            Scalar::Str(_) => 2,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Double(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}

/// Total order over two scalars.
///
/// Doubles use IEEE total ordering. Values of different types never compare
/// equal; they fall back to a fixed type rank so the order stays total.
pub fn compare_scalars(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;
    match (a, b) {
        (Int(x), Int(y)) => x.cmp(y),
        (Double(x), Double(y)) => x.total_cmp(y),
        (Str(x), Str(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// A single tuple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub values: Vec<Scalar>,
}

impl Record {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    pub fn push(&mut self, value: Scalar) {
        self.values.push(value);
    }
}

impl From<Vec<Scalar>> for Record {
    fn from(values: Vec<Scalar>) -> Self {
        Self { values }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.values {
            write!(f, "{v}|")?;
        }
        Ok(())
    }
}
