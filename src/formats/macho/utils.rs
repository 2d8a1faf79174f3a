//! Utility functions for Mach-O parsing

use crate::formats::macho::types::{Endianness, MachOError, Result, NAME_FIELD_SIZE};

/// Trait for reading values with endianness support
pub trait EndianRead {
    fn read_u32(&self, offset: usize, endian: Endianness) -> Result<u32>;
    fn read_u64(&self, offset: usize, endian: Endianness) -> Result<u64>;
    fn read_i32(&self, offset: usize, endian: Endianness) -> Result<i32>;
    fn read_name(&self, offset: usize) -> Result<[u8; NAME_FIELD_SIZE]>;
}

impl EndianRead for [u8] {
    fn read_u32(&self, offset: usize, endian: Endianness) -> Result<u32> {
        let bytes: [u8; 4] = fixed(self, offset)?;
        Ok(match endian {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        })
    }

    fn read_u64(&self, offset: usize, endian: Endianness) -> Result<u64> {
        let bytes: [u8; 8] = fixed(self, offset)?;
        Ok(match endian {
            Endianness::Little => u64::from_le_bytes(bytes),
            Endianness::Big => u64::from_be_bytes(bytes),
        })
    }

    fn read_i32(&self, offset: usize, endian: Endianness) -> Result<i32> {
        self.read_u32(offset, endian).map(|v| v as i32)
    }

    fn read_name(&self, offset: usize) -> Result<[u8; NAME_FIELD_SIZE]> {
        fixed(self, offset)
    }
}

fn fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or(MachOError::Truncated { offset, needed: N })
}

/// Decode a fixed-width, NUL-padded name field.
///
/// The field is not required to contain a terminator: a 16 character name
/// fills it completely.
pub fn decode_name(raw: &[u8; NAME_FIELD_SIZE], offset: usize) -> Result<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    std::str::from_utf8(&raw[..end])
        .map(str::to_string)
        .map_err(|_| MachOError::InvalidName { offset })
}

/// Check that `offset + size` stays within `limit`
pub fn check_range(offset: u64, size: u64, limit: u64) -> bool {
    offset.checked_add(size).is_some_and(|end| end <= limit)
}
