//! Shared fixtures for the SRF integration tests, benchmarks and the
//! golden file generator.
//!
//! Two reference streams are defined here:
//!
//! | Name      | Function | Attribute | Shape      | Bundles                        |
//! |-----------|----------|-----------|------------|--------------------------------|
//! | `curtain` | curtain  | `cube`    | `[5, 850]` | traces 0..3, then 3..5 in two depth runs |
//! | `slice`   | slice    | `amp`     | `[4, 6]`   | rows 0..2, then rows 2..4 in two column tiles |
//!
//! The committed files under `tests/golden/` were written from exactly
//! these definitions.

#![allow(clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use srf_decoder::{DecodeError, DecodeResult, DecodeSession, Feed};
use srf_encoder::{CurtainRun, ResponseEncoder, Tile};
use srf_types::FunctionId;

pub const CUBE_TRACES: usize = 5;
pub const CUBE_DEPTH: usize = 850;

/// Expected sum of every `cube` sample.
pub const CUBE_SUM: f64 = -1.589;

/// Samples of the `cube` attribute, trace-major. A repeating ramp of
/// eleven values around zero, with a spike at the very first sample.
pub fn cube_values() -> Vec<f32> {
    let mut values: Vec<f64> = (0..CUBE_TRACES * CUBE_DEPTH)
        .map(|k| ((k % 11) as f64 - 5.0) * 0.01)
        .collect();
    values[0] += -1.449;
    values.into_iter().map(|v| v as f32).collect()
}

fn cube_run(values: &[f32], traces: std::ops::Range<usize>, depths: std::ops::Range<usize>) -> CurtainRun {
    let samples = traces
        .clone()
        .flat_map(|t| values[t * CUBE_DEPTH + depths.start..t * CUBE_DEPTH + depths.end].iter().copied())
        .collect();
    CurtainRun {
        traces,
        depths,
        values: samples,
    }
}

/// Encoder for the `curtain` reference stream.
pub fn cube_curtain_encoder() -> ResponseEncoder {
    let values = cube_values();
    let mut enc = ResponseEncoder::new(FunctionId::Curtain);
    enc.pid("golden-curtain")
        .ndims(3)
        .index(vec![CUBE_TRACES as i64, 1, CUBE_DEPTH as i64])
        .add_attribute(
            "cube",
            vec![CUBE_TRACES as u64, CUBE_DEPTH as u64],
            vec!["trace".into(), "depth".into()],
        )
        .add_curtain_bundle("cube", vec![cube_run(&values, 0..3, 0..CUBE_DEPTH)])
        .add_curtain_bundle(
            "cube",
            vec![
                cube_run(&values, 3..5, 0..400),
                cube_run(&values, 3..5, 400..CUBE_DEPTH),
            ],
        );
    enc
}

pub fn cube_curtain() -> Vec<u8> {
    cube_curtain_encoder().encode().expect("reference curtain encodes")
}

/// Samples of the `amp` attribute, row-major: `0.0, 0.5, 1.0, ...`.
pub fn amp_values() -> Vec<f32> {
    (0..24).map(|k| k as f32 * 0.5).collect()
}

pub fn amp_slice() -> Vec<u8> {
    let values = amp_values();
    let rows = |r0: usize, r1: usize, c0: usize, c1: usize| -> Vec<f32> {
        (r0..r1).flat_map(|r| values[r * 6 + c0..r * 6 + c1].iter().copied()).collect()
    };

    let mut enc = ResponseEncoder::new(FunctionId::Slice);
    enc.pid("golden-slice")
        .ndims(3)
        .index(vec![4, 9, 6])
        .add_attribute("amp", vec![4, 6], vec!["inline".into(), "time".into()])
        .add_slice_bundle(
            "amp",
            vec![Tile {
                iterations: 2,
                chunk_size: 6,
                initial_skip: 0,
                superstride: 6,
                substride: 6,
                values: rows(0, 2, 0, 6),
            }],
        )
        .add_slice_bundle(
            "amp",
            vec![
                Tile {
                    iterations: 2,
                    chunk_size: 3,
                    initial_skip: 12,
                    superstride: 6,
                    substride: 3,
                    values: rows(2, 4, 0, 3),
                },
                Tile {
                    iterations: 2,
                    chunk_size: 3,
                    initial_skip: 15,
                    superstride: 6,
                    substride: 3,
                    values: rows(2, 4, 3, 6),
                },
            ],
        );
    enc.encode().expect("reference slice encodes")
}

/// Path of `tests/golden/<fixture>/payload.srf`.
pub fn golden_path(fixture: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/golden")
        .join(fixture)
        .join("payload.srf")
}

/// Feed `bytes` to a fresh session `chunk` bytes at a time, then signal
/// end of input.
pub fn decode_in_chunks(bytes: &[u8], chunk: usize) -> Result<Arc<DecodeResult>, DecodeError> {
    let mut session = DecodeSession::new();
    for piece in bytes.chunks(chunk.max(1)) {
        if let Feed::Ready(result) = session.feed(Some(piece))? {
            return Ok(result);
        }
    }
    match session.feed(None)? {
        Feed::Ready(result) => Ok(result),
        Feed::Pending => unreachable!("end of input never leaves a session pending"),
    }
}
