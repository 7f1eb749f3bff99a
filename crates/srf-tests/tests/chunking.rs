//! Chunk-boundary tests: the decoded result must not depend on how the
//! stream is cut, and nothing partial may be exposed before completion.

use std::sync::Arc;

use srf_decoder::{DecodeSession, Feed, SessionState};
use srf_tests::{CUBE_DEPTH, CUBE_SUM, CUBE_TRACES, amp_slice, cube_curtain, decode_in_chunks};
use srf_types::FunctionId;

fn rank(state: SessionState) -> u8 {
    match state {
        SessionState::Idle => 0,
        SessionState::AwaitingHeader => 1,
        SessionState::AwaitingPayload => 2,
        SessionState::Done | SessionState::Failed => 3,
    }
}

// ── The cube scenario ─────────────────────────────────────────────────────────

#[test]
fn cube_whole_buffer() {
    let result = decode_in_chunks(&cube_curtain(), usize::MAX).unwrap();

    assert_eq!(result.header().function_id(), FunctionId::Curtain);
    assert_eq!(result.header().dimensionality(), 3);
    assert_eq!(result.len(), 1);
    let cube = result.get("cube").unwrap();
    assert_eq!(cube.shape(), &[CUBE_TRACES as u64, CUBE_DEPTH as u64]);
    assert_eq!(cube.len(), CUBE_TRACES * CUBE_DEPTH);

    let sum: f64 = cube.data().iter().map(|&v| f64::from(v)).sum();
    assert!((sum - CUBE_SUM).abs() < 1e-2, "sum was {sum}");
}

#[test]
fn cube_five_byte_chunks() {
    let result = decode_in_chunks(&cube_curtain(), 5).unwrap();

    assert_eq!(result.header().function_id(), FunctionId::Curtain);
    assert_eq!(result.header().dimensionality(), 3);
    let cube = result.get("cube").unwrap();
    assert_eq!(cube.shape(), &[CUBE_TRACES as u64, CUBE_DEPTH as u64]);
    let sum: f64 = cube.data().iter().map(|&v| f64::from(v)).sum();
    assert!((sum - CUBE_SUM).abs() < 1e-2, "sum was {sum}");
}

// ── Boundary independence ─────────────────────────────────────────────────────

#[test]
fn result_independent_of_chunking() {
    for payload in [cube_curtain(), amp_slice()] {
        let whole = decode_in_chunks(&payload, payload.len()).unwrap();
        for chunk in [1, 2, 5, 7, 64, 1000] {
            let cut = decode_in_chunks(&payload, chunk).unwrap();
            assert_eq!(*whole, *cut, "chunk size {chunk} changed the result");
        }
    }
}

#[test]
fn empty_chunks_change_nothing() {
    let payload = amp_slice();
    let mut session = DecodeSession::new();
    let mut result = None;
    for piece in payload.chunks(3) {
        assert!(!session.feed(Some(&[])).unwrap().is_ready());
        if let Feed::Ready(r) = session.feed(Some(piece)).unwrap() {
            result = Some(r);
        }
    }
    assert_eq!(*result.unwrap(), *decode_in_chunks(&payload, payload.len()).unwrap());
}

// ── No partial exposure and monotonic state ───────────────────────────────────

#[test]
fn pending_until_last_byte() {
    let payload = cube_curtain();
    let mut session = DecodeSession::new();
    let mut states = vec![session.state()];

    let (head, last) = payload.split_at(payload.len() - 1);
    for piece in head.chunks(5) {
        assert!(!session.feed(Some(piece)).unwrap().is_ready());
        assert!(session.result().is_none());
        states.push(session.state());
    }

    assert!(session.feed(Some(last)).unwrap().is_ready());
    states.push(session.state());

    assert!(states.windows(2).all(|w| rank(w[0]) <= rank(w[1])));
    assert_eq!(states.first(), Some(&SessionState::Idle));
    assert!(states.contains(&SessionState::AwaitingHeader));
    assert!(states.contains(&SessionState::AwaitingPayload));
    assert_eq!(states.last(), Some(&SessionState::Done));
}

// ── Idempotence ───────────────────────────────────────────────────────────────

#[test]
fn completion_is_idempotent() {
    let payload = cube_curtain();
    let mut session = DecodeSession::new();
    let Feed::Ready(first) = session.feed(Some(&payload)).unwrap() else {
        panic!("whole payload should complete");
    };

    for extra in [Some(&b"ignored"[..]), Some(&[][..]), None] {
        let Feed::Ready(again) = session.feed(extra).unwrap() else {
            panic!("completed session went back to pending");
        };
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn trailing_bytes_in_same_chunk_are_ignored() {
    let mut payload = amp_slice();
    let clean = decode_in_chunks(&payload, payload.len()).unwrap();
    payload.extend_from_slice(&[0xC0; 16]);
    let noisy = decode_in_chunks(&payload, payload.len()).unwrap();
    assert_eq!(*clean, *noisy);
}

// ── Async adapter ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn streaming_reader_matches_session() {
    use srf_decoder::{DecoderConfig, StreamingDecoder};

    let payload = cube_curtain();
    let config = DecoderConfig {
        read_chunk_size: 13,
        ..DecoderConfig::default()
    };
    let streamed = StreamingDecoder::new(payload.as_slice())
        .with_config(config)
        .decode()
        .await
        .unwrap();
    assert_eq!(*streamed, *decode_in_chunks(&payload, payload.len()).unwrap());
}
