//! CDR decoding stream
//!
//! Mirror image of `CdrWriter`: tracks the byte offset from stream start
//! for alignment, and bounds-checks every read. Truncated input yields
//! `CdrError::BufferUnderflow` rather than panicking.

use crate::context::CdrContext;
use crate::error::{CdrError, Result};

/// CDR decoding stream over a byte slice
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    buf: &'a [u8],
    offset: usize,
    ctx: CdrContext,
}

impl<'a> CdrReader<'a> {
    /// Create a reader at position 0 (start of a stream)
    pub fn new(buf: &'a [u8], ctx: CdrContext) -> Self {
        Self {
            buf,
            offset: 0,
            ctx,
        }
    }

    /// Current byte offset from the stream start
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left in the stream
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Byte-order context in effect for this stream
    pub fn context(&self) -> CdrContext {
        self.ctx
    }

    fn require(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            Err(CdrError::BufferUnderflow {
                needed,
                have: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Skip alignment padding up to the given boundary
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = CdrContext::align_padding(self.offset, alignment);
        self.require(padding)?;
        self.offset += padding;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let slice = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.align(2)?;
        let b: [u8; 2] = self.take(2)?.try_into().unwrap();
        Ok(if self.ctx.little_endian {
            u16::from_le_bytes(b)
        } else {
            u16::from_be_bytes(b)
        })
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.align(4)?;
        let b: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(if self.ctx.little_endian {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.align(8)?;
        let b: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(if self.ctx.little_endian {
            u64::from_le_bytes(b)
        } else {
            u64::from_be_bytes(b)
        })
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Raw bytes, no length prefix, no alignment
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// CDR string body: u32 length including NUL, bytes, NUL. Returns
    /// the bytes without the terminator; character-set conversion is the
    /// caller's concern.
    pub fn read_string_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        if len == 0 {
            return Err(CdrError::InvalidString(
                "zero-length string (missing NUL)".to_string(),
            ));
        }
        let bytes = self.take(len)?;
        match bytes.split_last() {
            Some((0, body)) => Ok(body),
            _ => Err(CdrError::InvalidString(
                "missing NUL terminator".to_string(),
            )),
        }
    }

    /// CDR sequence<octet>: u32 count then the bytes
    pub fn read_octet_sequence(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Read a nested encapsulation, yielding a sub-reader positioned
    /// after the endian octet with alignment rebased to the
    /// encapsulation start and byte order taken from that octet.
    pub fn read_encapsulation(&mut self) -> Result<CdrReader<'a>> {
        let body = self.read_octet_sequence()?;
        if body.is_empty() {
            return Err(CdrError::InvalidEncapsulation(
                "empty encapsulation (missing endian octet)".to_string(),
            ));
        }
        let ctx = CdrContext::from_endian_octet(body[0]);
        let mut inner = CdrReader::new(body, ctx);
        // Consume the endian octet so the sub-reader's position matches
        // the writer's (octet at offset 0, body from offset 1).
        inner.offset = 1;
        Ok(inner)
    }
}
