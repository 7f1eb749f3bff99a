use crate::error::WireError;
use crate::msgpack::peek_array_len;

/// Number of items in the outer envelope: the header map and the bundle
/// list.
pub const ENVELOPE_ITEMS: u64 = 2;

/// Response envelope, the outermost structure of every result stream.
///
/// ```text
/// ┌──────────────────────┬──────────────────────────────────────────┐
/// │ Item                 │ Description                              │
/// ├──────────────────────┼──────────────────────────────────────────┤
/// │ array(2)             │ Envelope tag, always 0x92                │
/// │ [0] map              │ Header: attributes, shapes, labels, ...  │
/// │ [1] array(nbundles)  │ Payload bundles, one msgpack value each  │
/// └──────────────────────┴──────────────────────────────────────────┘
/// ```
///
/// The whole stream is a single, valid msgpack value. The decoder never
/// parses it as one, though: it reads the envelope header, then the
/// header map, then the bundle-list header, then each bundle, so that
/// payload can be routed into output buffers as it arrives.
///
/// Returns `Ok(Some(consumed))` once the envelope tag is fully buffered,
/// `Ok(None)` while it is not.
///
/// # Errors
///
/// - [`WireError::UnexpectedTag`] if the stream does not start with an
///   array.
/// - [`WireError::EnvelopeLength`] if the array does not hold exactly
///   [`ENVELOPE_ITEMS`] items.
pub fn read_envelope(buf: &[u8]) -> Result<Option<usize>, WireError> {
    match peek_array_len(buf)? {
        None => Ok(None),
        Some((ENVELOPE_ITEMS, consumed)) => Ok(Some(consumed)),
        Some((found, _)) => Err(WireError::EnvelopeLength { found }),
    }
}
