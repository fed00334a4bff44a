//! Index file header codec
//!
//! The header occupies the first [`HEADER_SIZE`] bytes of every index file:
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | magic | 4 | `BKLE` |
//! | version | 4 | big-endian |
//! | master key length | 4 | big-endian |
//! | master key | n | |
//! | state bits | 4 | version 1 only, bit 0 = fenced |
//!
//! The remainder is zero padding.

use crate::error::{LedgerError, LedgerResult};
use std::path::Path;

/// Magic bytes identifying an index file
pub const HEADER_MAGIC: &[u8; 4] = b"BKLE";

/// Total bytes reserved for the header
pub const HEADER_SIZE: u64 = 1024;

/// Header without persisted state bits
pub const HEADER_VERSION_0: u32 = 0;

/// Header with persisted state bits
pub const HEADER_VERSION_1: u32 = 1;

/// Version written into newly created index files
pub const CURRENT_HEADER_VERSION: u32 = HEADER_VERSION_1;

/// State bit marking the ledger as fenced
pub const STATE_FENCED_BIT: u32 = 0x1;

const FIXED_FIELDS: usize = 4 + 4 + 4;
const STATE_FIELD: usize = 4;

/// Largest master key that still fits in the header
pub const MAX_MASTER_KEY_LEN: usize = HEADER_SIZE as usize - FIXED_FIELDS - STATE_FIELD;

/// Decoded index file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    version: u32,
    master_key: Vec<u8>,
    state_bits: u32,
}

impl IndexHeader {
    /// Create a header for a new index file
    pub fn new(version: u32, master_key: &[u8]) -> LedgerResult<Self> {
        check_version(version)?;
        if master_key.len() > MAX_MASTER_KEY_LEN {
            return Err(LedgerError::MasterKeyTooLong(master_key.len()));
        }

        Ok(Self {
            version,
            master_key: master_key.to_vec(),
            state_bits: 0,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn master_key(&self) -> &[u8] {
        &self.master_key
    }

    pub fn is_fenced(&self) -> bool {
        self.state_bits & STATE_FENCED_BIT != 0
    }

    /// Set the fenced bit, returning true if it changed
    pub fn set_fenced(&mut self) -> bool {
        let changed = !self.is_fenced();
        self.state_bits |= STATE_FENCED_BIT;
        changed
    }

    /// Encode into a zero-padded block of `HEADER_SIZE` bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE as usize);
        buf.extend_from_slice(HEADER_MAGIC);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&(self.master_key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.master_key);
        if self.version >= HEADER_VERSION_1 {
            buf.extend_from_slice(&self.state_bits.to_be_bytes());
        }
        buf.resize(HEADER_SIZE as usize, 0);
        buf
    }

    /// Decode a header block read from `path`
    pub fn decode(path: &Path, buf: &[u8]) -> LedgerResult<Self> {
        if buf.len() < FIXED_FIELDS {
            return Err(LedgerError::header(path, "header truncated"));
        }
        if &buf[..4] != HEADER_MAGIC {
            return Err(LedgerError::header(path, "bad magic"));
        }

        let version = read_u32(buf, 4);
        check_version(version)?;

        let key_len = read_u32(buf, 8) as usize;
        if key_len > MAX_MASTER_KEY_LEN || FIXED_FIELDS + key_len > buf.len() {
            return Err(LedgerError::header(
                path,
                format!("master key length {} out of range", key_len),
            ));
        }
        let master_key = buf[FIXED_FIELDS..FIXED_FIELDS + key_len].to_vec();

        let state_bits = if version >= HEADER_VERSION_1 {
            let offset = FIXED_FIELDS + key_len;
            if offset + STATE_FIELD > buf.len() {
                return Err(LedgerError::header(path, "state bits truncated"));
            }
            read_u32(buf, offset)
        } else {
            0
        };

        Ok(Self {
            version,
            master_key,
            state_bits,
        })
    }
}

fn check_version(version: u32) -> LedgerResult<()> {
    match version {
        HEADER_VERSION_0 | HEADER_VERSION_1 => Ok(()),
        other => Err(LedgerError::UnsupportedHeaderVersion(other)),
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_be_bytes(bytes)
}
