//! Shared helpers for the integration test suite
//!
//! Wires two `Endpoint`s together over in-process channels so the
//! request/reply machinery runs end to end without a real transport.
//! The "server" side echoes request bodies back; tests that need a
//! different servant build their own loop from the same pieces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use giop::connection::{CodeSetAssignment, CODESET_UTF_8};
use giop::error::{GiopError, ProtocolError};
use giop::message::{Endpoint, Message, ReplyBody, ReplyStatus, RequestBody};
use giop::service_context::{CodeSetsProvider, ServiceContextRegistry, CODE_SETS_SERVICE_ID};
use giop_cdr::CdrContext;
use tokio::sync::mpsc;

/// Initialize tracing once; safe to call from every test
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A registry carrying the codesets provider, the way an ORB would set
/// one up before accepting connections
pub fn registry_with_codesets(preference: CodeSetAssignment) -> Arc<ServiceContextRegistry> {
    let registry = ServiceContextRegistry::new();
    registry.register(
        CODE_SETS_SERVICE_ID,
        Arc::new(CodeSetsProvider::new(preference)),
    );
    Arc::new(registry)
}

pub fn utf8_preference() -> CodeSetAssignment {
    CodeSetAssignment {
        char_codeset: CODESET_UTF_8,
        wchar_codeset: CodeSetAssignment::DEFAULT.wchar_codeset,
    }
}

/// Client half of an in-process connection
pub struct TestClient {
    endpoint: Arc<Endpoint>,
    server_state: Arc<giop::connection::ConnectionState>,
    to_server: mpsc::Sender<Bytes>,
}

impl TestClient {
    /// Invoke `operation` and wait for the reply
    pub async fn call(&self, operation: &str, body: Bytes) -> Result<ReplyBody, GiopError> {
        let (request, rx) = self
            .endpoint
            .start_request(operation, Bytes::new(), body, true)?;
        let rx = rx.ok_or_else(|| ProtocolError::ConnectionFailed {
            reason: "no receiver for two-way call".to_string(),
        })?;
        // A call that never reaches the wire must not linger in the
        // pending table until connection close
        let wire = match request.encode(CdrContext::BIG_ENDIAN) {
            Ok(wire) => wire,
            Err(e) => {
                self.endpoint.abandon_request(request.request_id);
                return Err(e);
            }
        };
        if self.to_server.send(wire).await.is_err() {
            self.endpoint.abandon_request(request.request_id);
            return Err(ProtocolError::ConnectionFailed {
                reason: "server channel closed".to_string(),
            }
            .into());
        }
        match rx.await {
            Ok(outcome) => Ok(outcome?),
            Err(_) => Err(ProtocolError::ConnectionFailed {
                reason: "completion handle dropped".to_string(),
            }
            .into()),
        }
    }

    /// Fire-and-forget invocation
    pub async fn notify(&self, operation: &str, body: Bytes) -> Result<(), GiopError> {
        let (request, rx) = self
            .endpoint
            .start_request(operation, Bytes::new(), body, false)?;
        debug_assert!(rx.is_none());
        let wire = request.encode(CdrContext::BIG_ENDIAN)?;
        self.to_server
            .send(wire)
            .await
            .map_err(|_| ProtocolError::ConnectionFailed {
                reason: "server channel closed".to_string(),
            })?;
        Ok(())
    }

    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Negotiated state of the peer endpoint, for assertions
    pub fn server_state(&self) -> &Arc<giop::connection::ConnectionState> {
        &self.server_state
    }
}

/// Connect a client endpoint to an echo server over in-process channels.
///
/// The server task answers every two-way request with a `NoException`
/// reply carrying the request body unchanged. Both tasks end when the
/// client is dropped; the client endpoint then sees a connection-closed
/// hook, so outstanding calls resolve with a failure signal.
pub fn connect_echo(
    client_registry: Arc<ServiceContextRegistry>,
    server_registry: Arc<ServiceContextRegistry>,
) -> TestClient {
    let (to_server, mut server_rx) = mpsc::channel::<Bytes>(64);
    let (to_client, mut client_rx) = mpsc::channel::<Bytes>(64);

    let server = Endpoint::on_connection_established(server_registry);
    let server_state = server.state().clone();
    tokio::spawn(async move {
        while let Some(wire) = server_rx.recv().await {
            let request = match RequestBody::decode(&wire, CdrContext::BIG_ENDIAN) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "server failed to decode request");
                    continue;
                }
            };
            let served = match server.on_message_decoded(Message::Request(request)) {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "server rejected request");
                    continue;
                }
            };
            if !served.response_expected {
                continue;
            }
            let reply = server.make_reply(served.request_id, ReplyStatus::NoException, served.body);
            let wire = match reply.encode(CdrContext::BIG_ENDIAN) {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!(error = %e, "server failed to encode reply");
                    continue;
                }
            };
            if to_client.send(wire).await.is_err() {
                break;
            }
        }
        server.on_connection_closed("client hung up");
    });

    let endpoint = Arc::new(Endpoint::on_connection_established(client_registry));
    let pump = endpoint.clone();
    tokio::spawn(async move {
        while let Some(wire) = client_rx.recv().await {
            match ReplyBody::decode(&wire, CdrContext::BIG_ENDIAN) {
                Ok(reply) => {
                    if let Err(e) = pump.on_message_decoded(Message::Reply(reply)) {
                        tracing::warn!(error = %e, "client failed to dispatch reply");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "client failed to decode reply"),
            }
        }
        pump.on_connection_closed("server hung up");
    });

    TestClient {
        endpoint,
        server_state,
        to_server,
    }
}

/// Success/failure counters shared across concurrent test tasks
pub struct ConcurrentStats {
    successes: AtomicUsize,
    failures: AtomicUsize,
    total_latency_nanos: AtomicU64,
}

impl ConcurrentStats {
    pub fn new() -> Self {
        Self {
            successes: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            total_latency_nanos: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.total_latency_nanos
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn mean_latency(&self) -> Duration {
        let n = self.successes() as u64;
        if n == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.total_latency_nanos.load(Ordering::Relaxed) / n)
    }
}
