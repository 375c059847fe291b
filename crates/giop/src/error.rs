//! Error types for the GIOP data-exchange layer
//!
//! Three kinds reach the call boundary and stay distinguishable there:
//! mapping errors (the type/attribute combination has no wire
//! representation), codec errors (malformed or truncated CDR data), and
//! protocol sequence errors (correlation or context misuse). None of
//! them is transparently recovered at this layer; retry and fail-over
//! belong to the caller.

use thiserror::Error;

pub use giop_cdr::CdrError;

/// Type-mapping failures
///
/// Fatal to the single call and never worth retrying: resolving the same
/// type with the same attributes reproduces the same failure.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    /// No rule in the resolution chain accepts the type
    #[error("type `{type_name}` has no wire representation")]
    Unmappable { type_name: String },

    /// More than one exclusive marker of the same kind on one type
    #[error("type `{type_name}` carries conflicting {marker} markers")]
    ConflictingMarkers {
        type_name: String,
        marker: &'static str,
    },
}

/// Protocol sequence errors: correlation and service-context misuse
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Reply carries an id with no matching pending request. Usually a
    /// stale or duplicated reply; can indicate connection-reuse bugs.
    #[error("reply for unknown or already-resolved request id {request_id}")]
    UnknownRequestId { request_id: u32 },

    /// The 32-bit request-id space for this connection is used up
    #[error("request id space exhausted")]
    RequestIdSpaceExhausted,

    /// Strict mode: a required service context was absent
    #[error("missing required service context {service_id}")]
    MissingRequiredContext { service_id: u32 },

    /// More than one context with the same service id in one message
    #[error("duplicate service context {service_id}")]
    DuplicateContext { service_id: u32 },

    /// A reply carried a status code outside the defined set
    #[error("invalid reply status {status}")]
    InvalidReplyStatus { status: u32 },

    /// The connection failed while the request was outstanding
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },
}

/// Top-level error for the data-exchange layer
#[derive(Debug, Error)]
pub enum GiopError {
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("codec error: {0}")]
    Cdr(#[from] CdrError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A supplied value does not match the declared parameter type
    #[error("value for `{name}` does not match its declared type")]
    ValueTypeMismatch { name: String },

    /// A slot the message kind requires was left unset by the caller
    #[error("missing value for {direction} parameter `{name}`")]
    MissingValue {
        name: String,
        direction: &'static str,
    },

    /// The caller's slot collection does not match the parameter list
    #[error("expected {expected} value slots, got {got}")]
    SlotCountMismatch { expected: usize, got: usize },

    /// A decoded enum ordinal falls outside the declared variants
    #[error("enum `{type_name}` has no variant with ordinal {ordinal}")]
    InvalidEnumOrdinal { type_name: String, ordinal: u32 },

    /// An `any` payload carries a type this layer cannot express as a
    /// typecode
    #[error("type `{type_name}` has no typecode representation")]
    UnsupportedTypeCode { type_name: String },
}

/// Result type for GIOP operations
pub type Result<T> = std::result::Result<T, GiopError>;
