//! Request correlation
//!
//! Every outgoing call on a connection gets a unique, monotonically
//! increasing request id; the matching reply resolves the pending entry.
//! The id increment is the only exclusive section on the hot path and
//! does nothing but increment-and-return.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::ProtocolError;

/// First request id issued on a fresh connection
const REQUEST_ID_SEED: u64 = 1;

/// Monotonic per-connection request-id source
///
/// Ids are 32-bit on the wire but allocated from a 64-bit counter, so
/// exhaustion of the id space is detected instead of silently wrapping
/// onto an id that may still be outstanding. Once the space is used up
/// every further allocation fails; recovering (e.g. by reconnecting) is
/// the caller's concern.
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(REQUEST_ID_SEED),
        }
    }

    /// Allocate the next id: single atomic fetch-add, O(1)
    pub fn next_id(&self) -> Result<u32, ProtocolError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        if id > u32::MAX as u64 {
            warn!("request id space exhausted on this connection");
            return Err(ProtocolError::RequestIdSpaceExhausted);
        }
        Ok(id as u32)
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome delivered to a pending request's waiter
pub type ReplyOutcome<T> = Result<T, ProtocolError>;

/// The set of requests awaiting replies on one connection
///
/// `T` is whatever the reply layer delivers (the decoded reply body).
/// Entries are created when an invocation starts and removed on reply or
/// connection failure; an entry is never left behind with a blocked
/// waiter.
#[derive(Debug)]
pub struct PendingRequests<T> {
    inner: Mutex<HashMap<u32, oneshot::Sender<ReplyOutcome<T>>>>,
}

impl<T> PendingRequests<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a pending request and hand back the completion handle
    /// the caller awaits on
    pub fn register(&self, request_id: u32) -> oneshot::Receiver<ReplyOutcome<T>> {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .inner
            .lock()
            .expect("pending-request map poisoned")
            .insert(request_id, tx);
        debug_assert!(previous.is_none(), "request id reused while outstanding");
        trace!(request_id, "request registered");
        rx
    }

    /// Resolve a pending request with a decoded reply. A reply carrying
    /// an id with no matching entry is a protocol error (stale or
    /// duplicated reply, possibly a connection-reuse bug) and is
    /// reported, never dropped.
    pub fn complete(&self, request_id: u32, reply: T) -> Result<(), ProtocolError> {
        let sender = self
            .inner
            .lock()
            .expect("pending-request map poisoned")
            .remove(&request_id);
        match sender {
            Some(tx) => {
                trace!(request_id, "request completed");
                if tx.send(Ok(reply)).is_err() {
                    // Waiter gave up (dropped the receiver); the entry is
                    // gone either way.
                    debug!(request_id, "reply arrived after caller abandoned the call");
                }
                Ok(())
            }
            None => {
                warn!(request_id, "reply for unknown or already-resolved request");
                Err(ProtocolError::UnknownRequestId { request_id })
            }
        }
    }

    /// Drop one pending entry without resolving it (caller abandoned
    /// the call). Returns whether an entry existed.
    pub fn forget(&self, request_id: u32) -> bool {
        self.inner
            .lock()
            .expect("pending-request map poisoned")
            .remove(&request_id)
            .is_some()
    }

    pub fn outstanding(&self) -> usize {
        self.inner
            .lock()
            .expect("pending-request map poisoned")
            .len()
    }

    /// Connection failure: release every waiter with a failure signal.
    /// No party awaiting a reply may be left blocked indefinitely.
    pub fn fail_all(&self, reason: &str) {
        let drained: Vec<_> = self
            .inner
            .lock()
            .expect("pending-request map poisoned")
            .drain()
            .collect();
        if !drained.is_empty() {
            debug!(
                count = drained.len(),
                reason, "failing all pending requests"
            );
        }
        for (request_id, tx) in drained {
            let _ = tx.send(Err(ProtocolError::ConnectionFailed {
                reason: reason.to_string(),
            }));
            trace!(request_id, "pending request failed");
        }
    }
}

impl<T> Default for PendingRequests<T> {
    fn default() -> Self {
        Self::new()
    }
}
