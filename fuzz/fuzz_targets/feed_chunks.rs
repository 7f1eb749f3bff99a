#![no_main]

use libfuzzer_sys::fuzz_target;
use srf_decoder::{DecodeSession, DecoderConfig};

// Fuzz target: the incremental decode session on arbitrary bytes.
//
// Input format:
//   byte 0: chunk size (0 is treated as 1)
//   bytes 1..: the stream
//
// The session must never panic, and whatever it concludes must not
// depend on the chunk size.
fuzz_target!(|data: &[u8]| {
    let Some((&size, stream)) = data.split_first() else {
        return;
    };
    let config = DecoderConfig {
        max_elements: 1 << 16,
        max_header_bytes: 4096,
        ..DecoderConfig::default()
    };

    let run = |chunk: usize| {
        let mut session = DecodeSession::with_config(config);
        for piece in stream.chunks(chunk) {
            match session.feed(Some(piece)) {
                Ok(feed) if feed.is_ready() => return Ok(feed.into_result()),
                Ok(_) => {}
                Err(err) => return Err(err),
            }
        }
        session.feed(None).map(|feed| feed.into_result())
    };

    let chunked = run(usize::from(size).max(1));
    let whole = run(stream.len().max(1));
    match (chunked, whole) {
        (Ok(a), Ok(b)) => assert_eq!(a.as_deref(), b.as_deref()),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("chunking changed the outcome: {a:?} vs {b:?}"),
    }
});
