//! GIOP data-exchange layer
//!
//! The on-wire data-exchange core of a CORBA-style object request
//! broker: marshalling and unmarshalling of remote-operation requests
//! and replies between in-process values and CDR, plus the
//! per-connection machinery both ends must agree on - request
//! correlation, codeset negotiation and service contexts.
//!
//! # Components
//!
//! - [`attributes`] - ordered per-parameter marshalling hints
//! - [`typemap`] - pure resolution of (host type, attributes) to a wire
//!   category, possibly rewriting the type
//! - [`value`] - runtime values and their per-category CDR form
//! - [`marshal`] - which parameters go on the wire, in what order, for
//!   requests vs. replies
//! - [`correlation`] - per-connection request ids and pending calls
//! - [`connection`] - negotiated per-connection state (codesets)
//! - [`service_context`] - pluggable context providers keyed by service id
//! - [`message`] - request/reply body assembly and the transport-facing
//!   lifecycle hooks
//!
//! The resolver and marshaller are stateless and freely shareable; all
//! required synchronization lives in the correlation, connection and
//! registry components. No operation here blocks on I/O - the physical
//! transport drives the core through [`message::Endpoint`]'s hooks.
//!
//! # Example
//!
//! ```
//! use giop::marshal::{self, Direction, OperationSignature, ParameterDescriptor};
//! use giop::connection::CodeSetAssignment;
//! use giop::types::HostType;
//! use giop::value::Value;
//! use giop_cdr::{BytesMut, CdrContext, CdrReader, CdrWriter};
//!
//! // (in long a, out long b) returning void
//! let sig = OperationSignature::with_return(
//!     HostType::Void,
//!     vec![
//!         ParameterDescriptor::new("a", HostType::Long, Direction::In),
//!         ParameterDescriptor::new("b", HostType::Long, Direction::Out),
//!     ],
//! );
//! let values = vec![None, Some(Value::Long(5)), None];
//!
//! let cs = CodeSetAssignment::DEFAULT;
//! let mut buf = BytesMut::new();
//! let mut w = CdrWriter::new(&mut buf, CdrContext::BIG_ENDIAN);
//! marshal::marshal_request(&sig, &values, &mut w, &cs).unwrap();
//!
//! let mut r = CdrReader::new(&buf, CdrContext::BIG_ENDIAN);
//! let slots = marshal::unmarshal_request(&sig, &mut r, &cs).unwrap();
//! assert_eq!(slots[1], Some(Value::Long(5)));
//! assert_eq!(slots[2], None); // out parameter: present but unset
//! ```

pub mod attributes;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod marshal;
pub mod message;
pub mod service_context;
pub mod typemap;
pub mod types;
pub mod value;

pub use attributes::{Attribute, AttributeSet, InterfaceAttr, ObjectAttr};
pub use connection::{CodeSetAssignment, ConnectionState};
pub use correlation::{PendingRequests, RequestIdAllocator};
pub use error::{GiopError, MappingError, ProtocolError, Result};
pub use marshal::{Direction, OperationSignature, ParameterDescriptor};
pub use message::{Endpoint, Message, ReplyBody, ReplyStatus, RequestBody};
pub use service_context::{ServiceContext, ServiceContextProvider, ServiceContextRegistry};
pub use typemap::{resolve, Mapping};
pub use types::{DeclKind, HostType, PrimitiveKind, TypeDescriptor, WireCategory};
pub use value::{ObjectRef, TaggedProfile, Value};
