//! CDR byte-order context
//!
//! CDR permits either byte order; the sender declares it once per message
//! (and once per encapsulation) and every multi-byte primitive in that
//! stream follows it.

/// CDR byte-order selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdrContext {
    /// Whether multi-byte primitives use little-endian byte order
    pub little_endian: bool,
}

impl CdrContext {
    /// Big-endian context (CORBA network order)
    pub const BIG_ENDIAN: Self = Self {
        little_endian: false,
    };

    /// Little-endian context
    pub const LITTLE_ENDIAN: Self = Self {
        little_endian: true,
    };

    /// Create a context with the specified byte order
    pub fn with_byte_order(little_endian: bool) -> Self {
        Self { little_endian }
    }

    /// The endian octet carried at the head of an encapsulation
    /// (0 = big-endian, 1 = little-endian)
    pub fn endian_octet(&self) -> u8 {
        self.little_endian as u8
    }

    /// Build a context from an encapsulation endian octet
    pub fn from_endian_octet(octet: u8) -> Self {
        Self {
            little_endian: octet != 0,
        }
    }

    /// Padding needed to align `position` to `alignment`
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment <= 1 {
            return 0;
        }
        let remainder = position % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }
}

impl Default for CdrContext {
    fn default() -> Self {
        Self::BIG_ENDIAN
    }
}
