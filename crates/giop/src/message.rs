//! Request/reply body assembly and connection lifecycle
//!
//! Ties the components together: an outgoing request takes an id from
//! the correlation layer, contexts from the registry and a marshalled
//! body from the caller; an incoming reply is dispatched to the
//! registry's hooks and resolves its pending entry. The `Endpoint` is
//! driven entirely from the transport's hooks and never initiates
//! transport operations itself. Serializing concurrent sends onto one
//! physical connection remains the transport's discipline.

use std::sync::Arc;

use bytes::Bytes;
use giop_cdr::{BytesMut, CdrContext, CdrReader, CdrWriter};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::connection::ConnectionState;
use crate::correlation::{PendingRequests, ReplyOutcome};
use crate::error::{ProtocolError, Result};
use crate::service_context::{
    decode_context_list, encode_context_list, MessageKind, ServiceContext,
    ServiceContextRegistry,
};

/// Reply outcome discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReplyStatus {
    NoException = 0,
    UserException = 1,
    SystemException = 2,
}

impl ReplyStatus {
    pub fn from_u32(raw: u32) -> Result<Self> {
        Ok(match raw {
            0 => Self::NoException,
            1 => Self::UserException,
            2 => Self::SystemException,
            status => return Err(ProtocolError::InvalidReplyStatus { status }.into()),
        })
    }
}

/// An outgoing or incoming request body
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub request_id: u32,
    pub response_expected: bool,
    /// Opaque key naming the target object; produced by the addressing
    /// layer
    pub object_key: Bytes,
    pub operation: String,
    pub service_contexts: Vec<ServiceContext>,
    /// Marshalled parameters (the `marshal` module's output)
    pub body: Bytes,
}

impl RequestBody {
    pub fn encode(&self, ctx: CdrContext) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        let mut w = CdrWriter::new(&mut buf, ctx);
        w.write_u32(self.request_id);
        w.write_bool(self.response_expected);
        w.write_octet_sequence(&self.object_key)?;
        w.write_string_bytes(self.operation.as_bytes())?;
        encode_context_list(&mut w, &self.service_contexts)?;
        // Body bytes were aligned relative to their own start; keep that
        // base intact by padding the header out to an 8-byte boundary.
        w.align(8);
        w.write_slice(&self.body);
        Ok(buf.freeze())
    }

    pub fn decode(bytes: &[u8], ctx: CdrContext) -> Result<Self> {
        let mut r = CdrReader::new(bytes, ctx);
        let request_id = r.read_u32()?;
        let response_expected = r.read_bool()?;
        let object_key = Bytes::copy_from_slice(r.read_octet_sequence()?);
        let operation = String::from_utf8(r.read_string_bytes()?.to_vec())
            .map_err(giop_cdr::CdrError::from)?;
        let service_contexts = decode_context_list(&mut r)?;
        if r.remaining() > 0 {
            r.align(8)?;
        }
        let body = Bytes::copy_from_slice(r.read_slice(r.remaining())?);
        Ok(Self {
            request_id,
            response_expected,
            object_key,
            operation,
            service_contexts,
            body,
        })
    }
}

/// An outgoing or incoming reply body
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyBody {
    pub request_id: u32,
    pub status: ReplyStatus,
    pub service_contexts: Vec<ServiceContext>,
    /// Marshalled return/out values, or the marshalled exception when
    /// the status says so
    pub body: Bytes,
}

impl ReplyBody {
    pub fn encode(&self, ctx: CdrContext) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        let mut w = CdrWriter::new(&mut buf, ctx);
        w.write_u32(self.request_id);
        w.write_u32(self.status as u32);
        encode_context_list(&mut w, &self.service_contexts)?;
        w.align(8);
        w.write_slice(&self.body);
        Ok(buf.freeze())
    }

    pub fn decode(bytes: &[u8], ctx: CdrContext) -> Result<Self> {
        let mut r = CdrReader::new(bytes, ctx);
        let request_id = r.read_u32()?;
        let status = ReplyStatus::from_u32(r.read_u32()?)?;
        let service_contexts = decode_context_list(&mut r)?;
        if r.remaining() > 0 {
            r.align(8)?;
        }
        let body = Bytes::copy_from_slice(r.read_slice(r.remaining())?);
        Ok(Self {
            request_id,
            status,
            service_contexts,
            body,
        })
    }
}

/// A decoded message handed in by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(RequestBody),
    Reply(ReplyBody),
}

/// Completion handle for one outstanding call
pub type ReplyReceiver = oneshot::Receiver<ReplyOutcome<ReplyBody>>;

/// The per-connection core the transport drives
///
/// Owns the connection's negotiated state and pending-request table and
/// shares the provider registry (typically ORB-wide).
#[derive(Debug)]
pub struct Endpoint {
    state: Arc<ConnectionState>,
    registry: Arc<ServiceContextRegistry>,
    pending: PendingRequests<ReplyBody>,
}

impl Endpoint {
    /// Transport hook: a connection has been established
    pub fn on_connection_established(registry: Arc<ServiceContextRegistry>) -> Self {
        debug!("connection established");
        Self {
            state: Arc::new(ConnectionState::new()),
            registry,
            pending: PendingRequests::new(),
        }
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    pub fn registry(&self) -> &Arc<ServiceContextRegistry> {
        &self.registry
    }

    pub fn outstanding_requests(&self) -> usize {
        self.pending.outstanding()
    }

    /// Begin an invocation: allocate the request id, collect service
    /// contexts and register the pending entry. The returned body is
    /// ready to encode and hand to the transport; the receiver (present
    /// when a response is expected) resolves with the reply or a
    /// connection-failure signal.
    pub fn start_request(
        &self,
        operation: impl Into<String>,
        object_key: Bytes,
        body: Bytes,
        response_expected: bool,
    ) -> Result<(RequestBody, Option<ReplyReceiver>)> {
        let request_id = self.state.request_ids().next_id()?;
        let service_contexts = self.registry.produce(MessageKind::Request, &self.state);
        let receiver = response_expected.then(|| self.pending.register(request_id));
        let operation = operation.into();
        trace!(request_id, operation = %operation, "request started");
        Ok((
            RequestBody {
                request_id,
                response_expected,
                object_key,
                operation,
                service_contexts,
                body,
            },
            receiver,
        ))
    }

    /// Drop the pending entry for a request that never reached the wire
    /// (encode or send failed after `start_request`). Returns whether an
    /// entry existed; the waiter's handle resolves with a closed-channel
    /// error once dropped.
    pub fn abandon_request(&self, request_id: u32) -> bool {
        let existed = self.pending.forget(request_id);
        if existed {
            trace!(request_id, "request abandoned before send");
        }
        existed
    }

    /// Build a reply to a received request, collecting reply-side
    /// service contexts
    pub fn make_reply(&self, request_id: u32, status: ReplyStatus, body: Bytes) -> ReplyBody {
        ReplyBody {
            request_id,
            status,
            service_contexts: self.registry.produce(MessageKind::Reply, &self.state),
            body,
        }
    }

    /// Transport hook: a complete message was decoded off this
    /// connection. Replies resolve their pending entry; requests are
    /// returned to the caller for dispatch to the servant layer.
    pub fn on_message_decoded(&self, message: Message) -> Result<Option<RequestBody>> {
        match message {
            Message::Request(request) => {
                self.registry.dispatch(
                    MessageKind::Request,
                    &self.state,
                    &request.service_contexts,
                )?;
                Ok(Some(request))
            }
            Message::Reply(reply) => {
                self.registry
                    .dispatch(MessageKind::Reply, &self.state, &reply.service_contexts)?;
                let request_id = reply.request_id;
                self.pending.complete(request_id, reply)?;
                Ok(None)
            }
        }
    }

    /// Transport hook: the connection is gone. Every pending entry is
    /// removed and its waiter released with a connection-failure signal.
    pub fn on_connection_closed(&self, reason: &str) {
        debug!(reason, "connection closed");
        self.pending.fail_all(reason);
    }
}
