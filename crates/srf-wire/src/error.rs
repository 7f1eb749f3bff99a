/// Errors raised while framing msgpack values.
///
/// "Not enough bytes yet" is *not* an error at this layer:
/// [`object_len`](crate::msgpack::object_len) and
/// [`peek_array_len`](crate::msgpack::peek_array_len) return `Ok(None)`
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A tag byte of a different family than the caller asked for.
    #[error("expected {expected} at offset {offset}, found tag {found:#04X}")]
    UnexpectedTag {
        expected: &'static str,
        found: u8,
        offset: usize,
    },

    /// The one tag msgpack never assigns (0xC1).
    #[error("reserved tag {found:#04X} at offset {offset}")]
    ReservedTag { found: u8, offset: usize },

    /// A declared length does not fit a buffer offset.
    #[error("length at offset {offset} is out of range")]
    IntegerOutOfRange { offset: usize },

    /// The outer envelope was not an array of exactly two items.
    #[error("bad envelope: expected array(2), was array({found})")]
    EnvelopeLength { found: u64 },
}

// Offsets are relative to the slice handed to the call that failed, not to
// the start of the stream.
