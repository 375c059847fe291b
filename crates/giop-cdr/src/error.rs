//! CDR error types

use thiserror::Error;

/// CDR encoding/decoding errors
///
/// Any of these is fatal to the single message being processed: CDR has
/// no resynchronization marker, so a receive-side failure usually forces
/// the connection to be treated as desynchronized.
#[derive(Debug, Error)]
pub enum CdrError {
    /// Buffer underflow - not enough data
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Invalid string - missing NUL terminator or bad length
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Encapsulation malformed - bad endian octet or truncated body
    #[error("invalid encapsulation: {0}")]
    InvalidEncapsulation(String),

    /// A length field exceeds what a u32 can carry on the wire
    #[error("length overflow: {0} does not fit in u32")]
    LengthOverflow(usize),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),
}

/// Result type for CDR operations
pub type Result<T> = std::result::Result<T, CdrError>;
