#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: msgpack object boundary scanning.
//
// Catches bugs in:
// - Length prefixes that overflow usize
// - Deeply nested arrays and maps
// - Truncated objects reported as complete
//
// A complete object must fit the buffer, and every prefix of it must be
// reported as incomplete.
fuzz_target!(|data: &[u8]| {
    let Ok(Some(len)) = srf_wire::msgpack::object_len(data) else {
        return;
    };
    assert!(len > 0 && len <= data.len());
    assert!(matches!(srf_wire::msgpack::object_len(&data[..len - 1]), Ok(None) | Err(_)));
    let _ = srf_wire::msgpack::peek_array_len(data);
});
