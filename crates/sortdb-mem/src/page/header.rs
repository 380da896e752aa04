//! Page header.
//!
//! Layout on disk (every page is exactly `page_size` bytes, zero padded):
//! [ magic: u32 ][ record_count: u32 ][ payload_len: u32 ][ checksum: [u8; 32] ]
//! [ payload bytes … ]
//!
//! The checksum is blake3 over the payload.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const PAGE_MAGIC: u32 = 0x5344_4250; // "SDBP"
pub const HEADER_LEN: usize = 4 + 4 + 4 + 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    pub magic: u32,
    pub record_count: u32,
    pub payload_len: u32,
    pub checksum: [u8; 32],
}

impl PageHeader {
    pub fn for_payload(record_count: u32, payload: &[u8]) -> Self {
        Self {
            magic: PAGE_MAGIC,
            record_count,
            payload_len: payload.len() as u32,
            checksum: blake3::hash(payload).into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.record_count.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.checksum);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Codec("short page header".into()));
        }
        let magic = read_u32(&bytes[0..4]);
        let record_count = read_u32(&bytes[4..8]);
        let payload_len = read_u32(&bytes[8..12]);
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[12..HEADER_LEN]);

        if magic != PAGE_MAGIC {
            return Err(Error::Codec(format!("bad page magic {magic:#x}")));
        }

        Ok(Self {
            magic,
            record_count,
            payload_len,
            checksum,
        })
    }

    pub fn verify(&self, payload: &[u8]) -> bool {
        blake3::hash(payload).as_bytes() == &self.checksum
    }
}

pub(crate) fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}
