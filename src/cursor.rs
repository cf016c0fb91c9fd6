/// Byte Cursor - bounds-checked reader over a raw transaction buffer
///
/// Every read checks the remaining length before slicing, so a truncated
/// buffer surfaces as a `Truncated` error instead of a panic or a silently
/// zero-filled field.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use thiserror::Error;

/// Byte order for fixed-width integer reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A read ran past the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("needed {needed} bytes at offset {offset}, only {remaining} remaining")]
pub struct Truncated {
    pub offset: usize,
    pub needed: usize,
    pub remaining: usize,
}

/// Failure of a variable-width integer read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UintError {
    #[error("integer width {0} is outside 1..=8")]
    InvalidWidth(usize),
    #[error(transparent)]
    Truncated(#[from] Truncated),
}

/// Forward-only reader. Borrows the buffer, never copies.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn ensure(&self, n: usize) -> Result<(), Truncated> {
        if n > self.remaining() {
            return Err(Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Look at the next `n` bytes without advancing. `None` if fewer remain.
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        if n > self.remaining() {
            return None;
        }
        Some(&self.buf[self.pos..self.pos + n])
    }

    /// Zero-copy slice of the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Truncated> {
        self.ensure(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Unsigned integer of `n` bytes (1..=8). Other widths are rejected
    /// without advancing.
    pub fn read_uint(&mut self, n: usize, endian: Endian) -> Result<u64, UintError> {
        if !(1..=8).contains(&n) {
            return Err(UintError::InvalidWidth(n));
        }
        let bytes = self.read_bytes(n)?;
        Ok(match endian {
            Endian::Little => LittleEndian::read_uint(bytes, n),
            Endian::Big => BigEndian::read_uint(bytes, n),
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Truncated> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Truncated> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, Truncated> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, Truncated> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Bitcoin compact-size integer
    pub fn read_varint(&mut self) -> Result<u64, Truncated> {
        let first = self.read_u8()?;
        let value = match first {
            0x00..=0xfc => u64::from(first),
            0xfd => u64::from(self.read_u16_le()?),
            0xfe => u64::from(self.read_u32_le()?),
            0xff => self.read_u64_le()?,
        };
        Ok(value)
    }

    /// Varint length prefix followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], Truncated> {
        let start = self.pos;
        let len = self.read_varint()?;
        // A length that does not fit in usize can never be satisfied.
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.read_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }
}
