//! Binary record codec used inside page payloads.
//!
//! Record layout: [ value_count: u16 ] then per value [ tag: u8 ] followed by
//! `i32` LE (Int), `f64` LE (Double), or [ len: u32 ][ utf8 bytes ] (String).

use sortdb_core::types::{Record, Scalar};

use crate::error::{Error, Result};

const TAG_INT: u8 = 0;
const TAG_DOUBLE: u8 = 1;
const TAG_STR: u8 = 2;

/// Number of bytes `encode_record` will produce for `record`.
pub fn encoded_len(record: &Record) -> usize {
    2 + record
        .values
        .iter()
        .map(|v| match v {
            Scalar::Int(_) => 1 + 4,
            Scalar::Double(_) => 1 + 8,
            Scalar::Str(s) => 1 + 4 + s.len(),
        })
        .sum::<usize>()
}

pub fn encode_record(record: &Record, out: &mut Vec<u8>) -> Result<()> {
    let count = u16::try_from(record.values.len())
        .map_err(|_| Error::Codec(format!("too many attributes: {}", record.values.len())))?;
    out.extend_from_slice(&count.to_le_bytes());
    for v in &record.values {
        match v {
            Scalar::Int(i) => {
                out.push(TAG_INT);
                out.extend_from_slice(&i.to_le_bytes());
            }
            Scalar::Double(d) => {
                out.push(TAG_DOUBLE);
                out.extend_from_slice(&d.to_le_bytes());
            }
            Scalar::Str(s) => {
                out.push(TAG_STR);
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| Error::Codec("truncated record".into()))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }
}

pub fn decode_record(bytes: &[u8]) -> Result<Record> {
    let mut r = Reader { bytes, pos: 0 };
    let count = u16::from_le_bytes(r.array()?) as usize;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let tag = r.array::<1>()?[0];
        let value = match tag {
            TAG_INT => Scalar::Int(i32::from_le_bytes(r.array()?)),
            TAG_DOUBLE => Scalar::Double(f64::from_le_bytes(r.array()?)),
            TAG_STR => {
                let len = u32::from_le_bytes(r.array()?) as usize;
                let raw = r.take(len)?;
                let s = std::str::from_utf8(raw)
                    .map_err(|e| Error::Codec(format!("utf8: {e}")))?;
                Scalar::Str(s.to_string())
            }
            other => return Err(Error::Codec(format!("unknown value tag {other}"))),
        };
        values.push(value);
    }
    if r.pos != bytes.len() {
        return Err(Error::Codec("trailing bytes after record".into()));
    }
    Ok(Record::new(values))
}
