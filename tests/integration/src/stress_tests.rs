//! Stress Tests - Concurrency at Scale
//!
//! These tests exercise race conditions in the correlation and
//! connection layers by:
//! - Running many concurrent callers over shared connections
//! - Hammering the request id allocator from parallel tasks
//! - Racing codeset negotiation and connection teardown
//! - Checking data integrity under load

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use common::*;
use futures::future::join_all;
use giop::connection::{CodeSetAssignment, ConnectionState};
use giop::correlation::{PendingRequests, RequestIdAllocator};
use giop::message::ReplyStatus;
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_high_concurrency_many_clients() {
    init_logging();

    const NUM_CLIENTS: usize = 16;
    const REQUESTS_PER_CLIENT: usize = 100;

    let stats = Arc::new(ConcurrentStats::new());
    let barrier = Arc::new(Barrier::new(NUM_CLIENTS));

    let mut handles = Vec::new();
    for client_id in 0..NUM_CLIENTS {
        let stats = stats.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            let client = connect_echo(
                registry_with_codesets(CodeSetAssignment::DEFAULT),
                registry_with_codesets(CodeSetAssignment::DEFAULT),
            );
            barrier.wait().await;

            for req_id in 0..REQUESTS_PER_CLIENT {
                let data = format!("client_{client_id}_request_{req_id}");
                let payload = Bytes::from(data);

                let start = Instant::now();
                match client.call("echo", payload.clone()).await {
                    Ok(reply) if reply.body == payload => {
                        stats.record_success(start.elapsed());
                    }
                    Ok(_) => stats.record_failure(),
                    Err(_) => stats.record_failure(),
                }
            }
        }));
    }
    join_all(handles).await;

    assert_eq!(stats.failures(), 0);
    assert_eq!(stats.successes(), NUM_CLIENTS * REQUESTS_PER_CLIENT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_shared_connection_interleaved_calls() {
    init_logging();

    const NUM_TASKS: usize = 32;
    const CALLS_PER_TASK: usize = 50;

    let client = Arc::new(connect_echo(
        registry_with_codesets(utf8_preference()),
        registry_with_codesets(CodeSetAssignment::DEFAULT),
    ));
    let barrier = Arc::new(Barrier::new(NUM_TASKS));

    let mut handles = Vec::new();
    for task_id in 0..NUM_TASKS {
        let client = client.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for call in 0..CALLS_PER_TASK {
                let payload = Bytes::from(format!("{task_id}:{call}"));
                let reply = client.call("echo", payload.clone()).await.unwrap();
                assert_eq!(reply.status, ReplyStatus::NoException);
                assert_eq!(reply.body, payload, "reply matched to wrong caller");
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(client.endpoint().outstanding_requests(), 0);
    // Negotiation happened exactly once despite the contention
    assert!(client.server_state().is_negotiated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_request_ids_distinct_under_contention() {
    init_logging();

    const NUM_TASKS: usize = 8;
    const IDS_PER_TASK: usize = 2_000;

    let allocator = Arc::new(RequestIdAllocator::new());
    let barrier = Arc::new(Barrier::new(NUM_TASKS));

    let mut handles = Vec::new();
    for _ in 0..NUM_TASKS {
        let allocator = allocator.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut ids = Vec::with_capacity(IDS_PER_TASK);
            for _ in 0..IDS_PER_TASK {
                ids.push(allocator.next_id().unwrap());
            }
            ids
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(all.insert(id), "request id {id} allocated twice");
        }
    }
    assert_eq!(all.len(), NUM_TASKS * IDS_PER_TASK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_negotiation_race_converges() {
    init_logging();

    const NUM_RACERS: usize = 16;

    let state = Arc::new(ConnectionState::new());
    let barrier = Arc::new(Barrier::new(NUM_RACERS));

    let mut handles = Vec::new();
    for racer in 0..NUM_RACERS {
        let state = state.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let proposal = CodeSetAssignment {
                char_codeset: 0x1000 + racer as u32,
                wchar_codeset: CodeSetAssignment::DEFAULT.wchar_codeset,
            };
            state.negotiate(proposal)
        }));
    }

    // Every racer observed the same winning assignment
    let mut outcomes = HashSet::new();
    for handle in handles {
        outcomes.insert(handle.await.unwrap().char_codeset);
    }
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes.contains(&state.codesets().char_codeset));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_teardown_races_completion() {
    init_logging();

    // Registrations racing fail_all: every receiver resolves exactly
    // once, either with its reply or with the failure signal
    const ROUNDS: usize = 50;
    const WAITERS: usize = 20;

    for _ in 0..ROUNDS {
        let pending: Arc<PendingRequests<u32>> = Arc::new(PendingRequests::new());
        let mut receivers = Vec::new();
        for id in 0..WAITERS as u32 {
            receivers.push(pending.register(id));
        }

        let completer = {
            let pending = pending.clone();
            tokio::spawn(async move {
                for id in 0..WAITERS as u32 / 2 {
                    // Already-failed entries surface as unknown ids
                    let _ = pending.complete(id, id * 10);
                }
            })
        };
        let closer = {
            let pending = pending.clone();
            tokio::spawn(async move {
                pending.fail_all("racing close");
            })
        };
        completer.await.unwrap();
        closer.await.unwrap();

        for (id, rx) in receivers.into_iter().enumerate() {
            match rx.await {
                Ok(Ok(value)) => assert_eq!(value, id as u32 * 10),
                Ok(Err(_)) => {} // failure signal from the close
                Err(_) => panic!("waiter {id} dropped without resolution"),
            }
        }
        assert_eq!(pending.outstanding(), 0);
    }
}
