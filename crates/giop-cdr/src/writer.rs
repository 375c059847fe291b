//! CDR encoding stream
//!
//! `CdrWriter` owns the byte-offset bookkeeping that CDR alignment
//! requires: every primitive aligns to its natural size measured from the
//! start of the stream, so the writer tracks its position and emits
//! padding before each multi-byte value.

use crate::context::CdrContext;
use crate::error::{CdrError, Result};
use bytes::{BufMut, BytesMut};

/// CDR encoding stream over a `BytesMut`
#[derive(Debug)]
pub struct CdrWriter<'a> {
    buf: &'a mut BytesMut,
    ctx: CdrContext,
    position: usize,
}

impl<'a> CdrWriter<'a> {
    /// Create a writer at position 0 (start of a new stream)
    pub fn new(buf: &'a mut BytesMut, ctx: CdrContext) -> Self {
        Self {
            buf,
            ctx,
            position: 0,
        }
    }

    /// Create a writer whose alignment base sits `position` bytes into
    /// an already partially written stream (e.g. after a message header)
    pub fn with_position(buf: &'a mut BytesMut, ctx: CdrContext, position: usize) -> Self {
        Self { buf, ctx, position }
    }

    /// Current byte offset from the stream start
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte-order context in effect for this stream
    pub fn context(&self) -> CdrContext {
        self.ctx
    }

    /// Emit zero padding up to the given alignment boundary
    pub fn align(&mut self, alignment: usize) {
        let padding = CdrContext::align_padding(self.position, alignment);
        for _ in 0..padding {
            self.buf.put_u8(0);
        }
        self.position += padding;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
        self.position += 1;
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
        self.position += 1;
    }

    /// CDR boolean: single octet, 0 = false, 1 = true
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.align(2);
        if self.ctx.little_endian {
            self.buf.put_u16_le(value);
        } else {
            self.buf.put_u16(value);
        }
        self.position += 2;
    }

    pub fn write_i16(&mut self, value: i16) {
        self.align(2);
        if self.ctx.little_endian {
            self.buf.put_i16_le(value);
        } else {
            self.buf.put_i16(value);
        }
        self.position += 2;
    }

    pub fn write_u32(&mut self, value: u32) {
        self.align(4);
        if self.ctx.little_endian {
            self.buf.put_u32_le(value);
        } else {
            self.buf.put_u32(value);
        }
        self.position += 4;
    }

    pub fn write_i32(&mut self, value: i32) {
        self.align(4);
        if self.ctx.little_endian {
            self.buf.put_i32_le(value);
        } else {
            self.buf.put_i32(value);
        }
        self.position += 4;
    }

    pub fn write_u64(&mut self, value: u64) {
        self.align(8);
        if self.ctx.little_endian {
            self.buf.put_u64_le(value);
        } else {
            self.buf.put_u64(value);
        }
        self.position += 8;
    }

    pub fn write_i64(&mut self, value: i64) {
        self.align(8);
        if self.ctx.little_endian {
            self.buf.put_i64_le(value);
        } else {
            self.buf.put_i64(value);
        }
        self.position += 8;
    }

    pub fn write_f32(&mut self, value: f32) {
        self.align(4);
        if self.ctx.little_endian {
            self.buf.put_f32_le(value);
        } else {
            self.buf.put_f32(value);
        }
        self.position += 4;
    }

    pub fn write_f64(&mut self, value: f64) {
        self.align(8);
        if self.ctx.little_endian {
            self.buf.put_f64_le(value);
        } else {
            self.buf.put_f64(value);
        }
        self.position += 8;
    }

    /// Raw bytes, no length prefix, no alignment
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
        self.position += bytes.len();
    }

    /// CDR string body: u32 length including the NUL terminator, the
    /// bytes, then the NUL. Character-set conversion is the caller's
    /// concern; this takes the already encoded bytes.
    pub fn write_string_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = bytes
            .len()
            .checked_add(1)
            .ok_or(CdrError::LengthOverflow(bytes.len()))?;
        self.write_u32(into_u32(len)?);
        self.write_slice(bytes);
        self.write_u8(0);
        Ok(())
    }

    /// CDR sequence<octet>: u32 count then the bytes
    pub fn write_octet_sequence(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_u32(into_u32(bytes.len())?);
        self.write_slice(bytes);
        Ok(())
    }

    /// Write a nested encapsulation: a length-delimited sub-stream whose
    /// first octet is its own endian flag and whose alignment restarts
    /// at zero. The closure fills the sub-stream through a fresh writer
    /// inheriting this stream's byte order.
    pub fn write_encapsulation<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CdrWriter<'_>) -> Result<()>,
    {
        let mut inner_buf = BytesMut::new();
        let mut inner = CdrWriter::new(&mut inner_buf, self.ctx);
        inner.write_u8(self.ctx.endian_octet());
        f(&mut inner)?;
        self.write_octet_sequence(&inner_buf)
    }
}

fn into_u32(v: usize) -> Result<u32> {
    u32::try_from(v).map_err(|_| CdrError::LengthOverflow(v))
}
