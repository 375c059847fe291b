//! Per-connection state and codeset negotiation
//!
//! A connection carries exactly one codeset agreement for its lifetime:
//! narrow (char/string) and wide (wchar/wstring) text encodings. The
//! agreement is struck at most once, by whichever in-flight request gets
//! there first; every later proposal is ignored so racing requests all
//! converge on the same outcome. Before negotiation the registry
//! defaults apply, so the very first request is already validly encoded.

use std::sync::OnceLock;

use giop_cdr::CdrError;
use tracing::{debug, trace};

use crate::correlation::RequestIdAllocator;

/// OSF codeset registry: ISO 8859-1 (Latin-1)
pub const CODESET_ISO_8859_1: u32 = 0x0001_0001;
/// OSF codeset registry: UTF-8
pub const CODESET_UTF_8: u32 = 0x0501_0001;
/// OSF codeset registry: UTF-16
pub const CODESET_UTF_16: u32 = 0x0001_0109;

/// The narrow/wide codeset pair in effect for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSetAssignment {
    pub char_codeset: u32,
    pub wchar_codeset: u32,
}

impl CodeSetAssignment {
    /// Pre-negotiation defaults: Latin-1 narrow, UTF-16 wide
    pub const DEFAULT: Self = Self {
        char_codeset: CODESET_ISO_8859_1,
        wchar_codeset: CODESET_UTF_16,
    };

    /// Encode a narrow string to wire bytes under the char codeset.
    /// Characters outside the codeset are a codec error, not silently
    /// replaced - the peer would decode garbage.
    pub fn encode_narrow(&self, s: &str) -> Result<Vec<u8>, CdrError> {
        match self.char_codeset {
            CODESET_UTF_8 => Ok(s.as_bytes().to_vec()),
            _ => s
                .chars()
                .map(|c| {
                    let code = c as u32;
                    if code <= 0xFF {
                        Ok(code as u8)
                    } else {
                        Err(CdrError::InvalidString(format!(
                            "char U+{code:04X} not representable in codeset {:#010x}",
                            self.char_codeset
                        )))
                    }
                })
                .collect(),
        }
    }

    /// Decode wire bytes of a narrow string under the char codeset
    pub fn decode_narrow(&self, bytes: &[u8]) -> Result<String, CdrError> {
        match self.char_codeset {
            CODESET_UTF_8 => Ok(String::from_utf8(bytes.to_vec())?),
            _ => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encode a single narrow char (one octet on the wire) under the
    /// char codeset. Under UTF-8 only ASCII fits a single octet; under
    /// Latin-1 the full 0x00-0xFF range does.
    pub fn encode_narrow_char(&self, c: char) -> Result<u8, CdrError> {
        let code = c as u32;
        let limit = match self.char_codeset {
            CODESET_UTF_8 => 0x7F,
            _ => 0xFF,
        };
        if code <= limit {
            Ok(code as u8)
        } else {
            Err(CdrError::InvalidString(format!(
                "char U+{code:04X} not representable as one octet in codeset {:#010x}",
                self.char_codeset
            )))
        }
    }
}

impl Default for CodeSetAssignment {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-connection negotiated state
///
/// Created at connection establishment, destroyed with the connection.
/// The codeset slot is written at most once; reads after negotiation are
/// lock-free on the immutable snapshot.
#[derive(Debug)]
pub struct ConnectionState {
    negotiated: OnceLock<CodeSetAssignment>,
    ids: RequestIdAllocator,
}

impl ConnectionState {
    /// Fresh state for a newly established connection
    pub fn new() -> Self {
        Self {
            negotiated: OnceLock::new(),
            ids: RequestIdAllocator::new(),
        }
    }

    /// The codesets in effect right now: the negotiated pair, or the
    /// defaults before any negotiation happened
    pub fn codesets(&self) -> CodeSetAssignment {
        self.negotiated
            .get()
            .copied()
            .unwrap_or(CodeSetAssignment::DEFAULT)
    }

    pub fn is_negotiated(&self) -> bool {
        self.negotiated.get().is_some()
    }

    /// One-shot negotiation. The first proposal wins; later proposals
    /// (including different ones from racing requests) are ignored, not
    /// errors. Returns the pair actually in effect.
    pub fn negotiate(&self, proposal: CodeSetAssignment) -> CodeSetAssignment {
        match self.negotiated.set(proposal) {
            Ok(()) => {
                debug!(
                    char_codeset = proposal.char_codeset,
                    wchar_codeset = proposal.wchar_codeset,
                    "codesets negotiated"
                );
                proposal
            }
            Err(_) => {
                let chosen = self.codesets();
                if chosen != proposal {
                    trace!("late codeset proposal ignored, keeping earlier agreement");
                }
                chosen
            }
        }
    }

    /// The connection's request-id allocator
    pub fn request_ids(&self) -> &RequestIdAllocator {
        &self.ids
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
