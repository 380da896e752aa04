//! Reader for `|`-delimited text tables (TPC-H `.tbl` style).
//!
//! Each line holds one record with fields in schema order. A trailing `|`
//! after the last field is accepted; any extra fields are an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sortdb_core::schema::Schema;
use sortdb_core::types::{Record, Scalar};

use crate::error::{Error, Result};

pub struct TblReader<R: Read> {
    schema: Schema,
    inner: csv::Reader<R>,
    row: csv::StringRecord,
    line: u64,
}

impl TblReader<File> {
    pub fn from_path(schema: Schema, path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Ok(Self::from_reader(schema, f))
    }
}

impl<R: Read> TblReader<R> {
    pub fn from_reader(schema: Schema, rdr: R) -> Self {
        let inner = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(rdr);
        Self {
            schema,
            inner,
            row: csv::StringRecord::new(),
            line: 0,
        }
    }

    /// Read the next record, `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if !self.inner.read_record(&mut self.row)? {
                return Ok(None);
            }
            self.line += 1;
            if self.row.len() == 1 && self.row[0].trim().is_empty() {
                continue;
            }
            return self.parse_row().map(Some);
        }
    }

    fn parse_row(&self) -> Result<Record> {
        let want = self.schema.len();
        let mut fields: Vec<&str> = self.row.iter().collect();
        if fields.len() == want + 1 && fields[want].is_empty() {
            fields.pop();
        }
        if fields.len() != want {
            return Err(Error::Load(format!(
                "line {}: expected {want} fields, found {}",
                self.line,
                fields.len()
            )));
        }

        let mut values = Vec::with_capacity(want);
        for (field, text) in self.schema.fields.iter().zip(fields) {
            let value = Scalar::parse(text, field.data_type).map_err(|e| {
                Error::Load(format!("line {}: field '{}': {e}", self.line, field.name))
            })?;
            values.push(value);
        }
        Ok(Record::new(values))
    }
}

impl<R: Read> Iterator for TblReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
