#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use srf_decoder::{DecodeSession, Feed};
use srf_encoder::{CurtainRun, ResponseEncoder};
use srf_types::FunctionId;

#[derive(Debug, Arbitrary)]
struct FuzzRun {
    trace: u8,
    depth_start: u8,
    depth_len: u8,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    traces: u8,
    depth: u8,
    bundles: Vec<Vec<FuzzRun>>,
    chunk: u8,
}

// Fuzz target: ResponseEncoder -> DecodeSession roundtrip.
//
// Builds a curtain whose runs always land inside the cube, encodes it,
// and decodes it in chunks. The decoder must accept anything the encoder
// produces and place every sample where the run said it goes.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let traces = usize::from(input.traces % 16) + 1;
    let depth = usize::from(input.depth % 64) + 1;
    let mut expected = vec![0.0f32; traces * depth];

    let mut encoder = ResponseEncoder::new(FunctionId::Curtain);
    encoder
        .ndims(3)
        .index(vec![traces as i64, 1, depth as i64])
        .add_attribute("cube", vec![traces as u64, depth as u64], Vec::new());

    let mut next = 1.0f32;
    for bundle in input.bundles.iter().take(8) {
        let mut runs = Vec::new();
        for run in bundle.iter().take(8) {
            let trace = usize::from(run.trace) % traces;
            let start = usize::from(run.depth_start) % depth;
            let end = (start + usize::from(run.depth_len)).min(depth);
            let values: Vec<f32> = (start..end)
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            expected[trace * depth + start..trace * depth + end].copy_from_slice(&values);
            runs.push(CurtainRun {
                traces: trace..trace + 1,
                depths: start..end,
                values,
            });
        }
        encoder.add_curtain_bundle("cube", runs);
    }

    let payload = encoder.encode().expect("encoder rejected a valid curtain");

    let mut session = DecodeSession::new();
    let mut result = None;
    for piece in payload.chunks(usize::from(input.chunk).max(1)) {
        if let Feed::Ready(done) = session.feed(Some(piece)).expect("decoder rejected encoder output") {
            result = Some(done);
        }
    }
    let result = result.expect("complete payload left the session pending");
    assert_eq!(result.get("cube").unwrap().data(), expected.as_slice());
});
