//! CDR (Common Data Representation) codec runtime
//!
//! This crate implements the byte-level encoding rules used by GIOP,
//! as specified in CORBA chapter 15 (CDR transfer syntax).
//!
//! # CDR Wire Format
//!
//! Key characteristics:
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes),
//!   measured from the start of the enclosing stream
//! - Either byte order is legal; the message header fixes it for the
//!   whole message
//! - Strings are length-prefixed and NUL-terminated; the length counts
//!   the terminator
//! - Encapsulations are length-delimited nested streams carrying their
//!   own endian flag, with alignment restarting at zero

mod context;
mod error;
mod reader;
mod writer;

pub use context::CdrContext;
pub use error::{CdrError, Result};
pub use reader::CdrReader;
pub use writer::CdrWriter;

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
