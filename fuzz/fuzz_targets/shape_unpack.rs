#![no_main]

use libfuzzer_sys::fuzz_target;
use srf_types::{element_count, pack_shapes, unpack_shapes};

// Fuzz target: packed shape layout.
//
// Interprets the input as little-endian u64 words. Whatever unpacks must
// pack back to the same words, and element counts must never panic.
fuzz_target!(|data: &[u8]| {
    let flat: Vec<u64> = data
        .chunks_exact(8)
        .map(|word| u64::from_le_bytes(word.try_into().unwrap()) % 64)
        .collect();

    let Ok(shapes) = unpack_shapes(&flat) else {
        return;
    };
    assert_eq!(pack_shapes(&shapes), flat);
    for shape in &shapes {
        let _ = element_count(shape);
    }
});
