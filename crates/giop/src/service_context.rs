//! Service contexts
//!
//! Small opaque side-channel blocks attached to every request and reply,
//! keyed by a numeric service id. Providers plug into a registry:
//! before send each registered provider may produce a context, on
//! receive each is handed its matching context (or told none arrived).
//! Contexts for service ids nobody registered pass through untouched so
//! an intermediary can re-forward them.
//!
//! Registration is rare and exclusive; hook dispatch is frequent and
//! runs on a snapshot taken under the read lock, so no hook ever
//! executes while holding a registry or connection-wide lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use giop_cdr::{BytesMut, CdrContext, CdrReader, CdrWriter};
use tracing::{debug, trace, warn};

use crate::connection::{CodeSetAssignment, ConnectionState};
use crate::error::{GiopError, ProtocolError, Result};

/// Service id of the codeset-negotiation context
pub const CODE_SETS_SERVICE_ID: u32 = 1;

/// One context block: a service id and an opaque payload. Constructed
/// per outgoing message, consumed per incoming message; never retained
/// across request/reply cycles except for what a provider writes into
/// `ConnectionState`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContext {
    pub service_id: u32,
    pub payload: Bytes,
}

/// A pluggable producer/consumer of one service id's contexts
pub trait ServiceContextProvider: Send + Sync {
    /// Context to attach to an outgoing request, or `None` to decline
    fn produce_for_request(&self, state: &ConnectionState) -> Option<Bytes>;

    /// Context to attach to an outgoing reply, or `None` to decline
    fn produce_for_reply(&self, state: &ConnectionState) -> Option<Bytes>;

    /// Invoked for every incoming request with this provider's context
    /// if the message carried one
    fn on_request_received(&self, state: &ConnectionState, context: Option<&ServiceContext>);

    /// Invoked for every incoming reply with this provider's context if
    /// the message carried one
    fn on_reply_received(&self, state: &ConnectionState, context: Option<&ServiceContext>);
}

/// Wire shape: u32 count, then per context a u32 service id and the
/// length-prefixed payload
pub fn encode_context_list(w: &mut CdrWriter<'_>, contexts: &[ServiceContext]) -> Result<()> {
    w.write_u32(contexts.len() as u32);
    for ctx in contexts {
        w.write_u32(ctx.service_id);
        w.write_octet_sequence(&ctx.payload)?;
    }
    Ok(())
}

/// Decode a context list, rejecting duplicate service ids: at most one
/// instance per distinct id per message
pub fn decode_context_list(r: &mut CdrReader<'_>) -> Result<Vec<ServiceContext>> {
    let count = r.read_u32()? as usize;
    let mut contexts = Vec::with_capacity(count.min(64));
    let mut seen = HashSet::new();
    for _ in 0..count {
        let service_id = r.read_u32()?;
        if !seen.insert(service_id) {
            return Err(ProtocolError::DuplicateContext { service_id }.into());
        }
        let payload = Bytes::copy_from_slice(r.read_octet_sequence()?);
        contexts.push(ServiceContext {
            service_id,
            payload,
        });
    }
    Ok(contexts)
}

/// Message kind being dispatched, picking which hook pair runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Reply,
}

/// The provider registry for one ORB (or one connection group)
#[derive(Default)]
pub struct ServiceContextRegistry {
    providers: RwLock<HashMap<u32, Arc<dyn ServiceContextProvider>>>,
    /// Strict mode: ids whose context must be present on every incoming
    /// message
    required: RwLock<HashSet<u32>>,
}

impl ServiceContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for a service id. Replacing an existing
    /// provider is allowed but unusual, so it is logged.
    pub fn register(&self, service_id: u32, provider: Arc<dyn ServiceContextProvider>) {
        let previous = self
            .providers
            .write()
            .expect("service-context registry poisoned")
            .insert(service_id, provider);
        if previous.is_some() {
            warn!(service_id, "service context provider replaced");
        } else {
            debug!(service_id, "service context provider registered");
        }
    }

    /// Mark a service id as required on incoming messages (strict mode)
    pub fn require(&self, service_id: u32) {
        self.required
            .write()
            .expect("service-context registry poisoned")
            .insert(service_id);
    }

    /// Snapshot of providers, sorted by service id so outgoing context
    /// order is deterministic. Taken under the read lock; hooks run on
    /// the snapshot after the lock is released.
    fn snapshot(&self) -> Vec<(u32, Arc<dyn ServiceContextProvider>)> {
        let mut providers: Vec<_> = self
            .providers
            .read()
            .expect("service-context registry poisoned")
            .iter()
            .map(|(&id, p)| (id, Arc::clone(p)))
            .collect();
        providers.sort_by_key(|(id, _)| *id);
        providers
    }

    /// Ask every provider for a context to attach to an outgoing
    /// message; decliners contribute nothing
    pub fn produce(&self, kind: MessageKind, state: &ConnectionState) -> Vec<ServiceContext> {
        let mut contexts = Vec::new();
        for (service_id, provider) in self.snapshot() {
            let payload = match kind {
                MessageKind::Request => provider.produce_for_request(state),
                MessageKind::Reply => provider.produce_for_reply(state),
            };
            if let Some(payload) = payload {
                trace!(service_id, "service context produced");
                contexts.push(ServiceContext {
                    service_id,
                    payload,
                });
            }
        }
        contexts
    }

    /// Deliver an incoming message's contexts: every registered
    /// provider sees its matching context or `None`; contexts for
    /// unregistered ids are passed through untouched (and logged at
    /// trace level for diagnosis). With strict mode on, a missing
    /// required context is a protocol error.
    pub fn dispatch(
        &self,
        kind: MessageKind,
        state: &ConnectionState,
        contexts: &[ServiceContext],
    ) -> Result<()> {
        {
            let required = self
                .required
                .read()
                .expect("service-context registry poisoned");
            for &service_id in required.iter() {
                if !contexts.iter().any(|c| c.service_id == service_id) {
                    return Err(GiopError::Protocol(
                        ProtocolError::MissingRequiredContext { service_id },
                    ));
                }
            }
        }

        let providers = self.snapshot();
        for (service_id, provider) in &providers {
            let matching = contexts.iter().find(|c| c.service_id == *service_id);
            match kind {
                MessageKind::Request => provider.on_request_received(state, matching),
                MessageKind::Reply => provider.on_reply_received(state, matching),
            }
        }

        for ctx in contexts {
            if !providers.iter().any(|(id, _)| *id == ctx.service_id) {
                trace!(
                    service_id = ctx.service_id,
                    len = ctx.payload.len(),
                    "unhandled service context passed through"
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServiceContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<u32> = self
            .providers
            .read()
            .expect("service-context registry poisoned")
            .keys()
            .copied()
            .collect();
        f.debug_struct("ServiceContextRegistry")
            .field("service_ids", &ids)
            .finish()
    }
}

/// Built-in provider for codeset negotiation (service id 1)
///
/// Proposes the local preference while the connection is unnegotiated
/// and consumes the peer's context to strike the one-shot agreement.
#[derive(Debug)]
pub struct CodeSetsProvider {
    preference: CodeSetAssignment,
}

impl CodeSetsProvider {
    pub fn new(preference: CodeSetAssignment) -> Self {
        Self { preference }
    }

    // The payload is itself an encapsulation: endian octet, then the
    // proposed narrow and wide codesets.
    fn encode_payload(&self) -> Bytes {
        let ctx = CdrContext::BIG_ENDIAN;
        let mut buf = BytesMut::new();
        let mut w = CdrWriter::new(&mut buf, ctx);
        w.write_u8(ctx.endian_octet());
        w.write_u32(self.preference.char_codeset);
        w.write_u32(self.preference.wchar_codeset);
        buf.freeze()
    }

    fn consume(&self, state: &ConnectionState, context: Option<&ServiceContext>) {
        let Some(ctx) = context else { return };
        let parsed = (|| {
            let mut r = CdrReader::new(&ctx.payload, CdrContext::BIG_ENDIAN);
            let endian = r.read_u8()?;
            let mut r = CdrReader::new(&ctx.payload, CdrContext::from_endian_octet(endian));
            r.read_u8()?;
            let char_codeset = r.read_u32()?;
            let wchar_codeset = r.read_u32()?;
            Ok::<_, giop_cdr::CdrError>(CodeSetAssignment {
                char_codeset,
                wchar_codeset,
            })
        })();
        match parsed {
            Ok(proposal) => {
                state.negotiate(proposal);
            }
            Err(err) => warn!(%err, "malformed codeset context ignored"),
        }
    }
}

impl ServiceContextProvider for CodeSetsProvider {
    fn produce_for_request(&self, state: &ConnectionState) -> Option<Bytes> {
        if state.is_negotiated() {
            return None;
        }
        Some(self.encode_payload())
    }

    fn produce_for_reply(&self, state: &ConnectionState) -> Option<Bytes> {
        if state.is_negotiated() {
            return None;
        }
        Some(self.encode_payload())
    }

    fn on_request_received(&self, state: &ConnectionState, context: Option<&ServiceContext>) {
        self.consume(state, context);
    }

    fn on_reply_received(&self, state: &ConnectionState, context: Option<&ServiceContext>) {
        self.consume(state, context);
    }
}
