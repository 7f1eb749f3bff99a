use crate::session::SessionState;

/// Errors that end a decode session.
///
/// A session that fails keeps its error: every later call to
/// [`DecodeSession::feed`](crate::DecodeSession::feed) returns a clone of
/// it. For that reason the variants carry rendered reasons instead of the
/// lower-level error values.
///
/// ```text
///   DecodeError
///   ├── MalformedHeader     ← envelope or header map unusable
///   ├── Allocation          ← a declared shape is empty, overflows, or
///   │                         exceeds DecoderConfig::max_elements
///   ├── TruncatedStream     ← end of input before completion
///   └── MalformedPayload    ← a bundle cannot be decoded or would write
///                             outside its output buffer
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The envelope or header could not be decoded or failed validation.
    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// An output buffer could not be sized from its declared shape.
    #[error("cannot allocate attribute {attribute:?} with shape {shape:?} (limit {limit} elements)")]
    Allocation {
        attribute: String,
        shape: Vec<u64>,
        limit: u64,
    },

    /// End of input was signalled before the stream completed.
    ///
    /// `state` is where the session stood, `buffered` the number of bytes
    /// it had received.
    #[error("stream truncated while {state} ({buffered} bytes received)")]
    TruncatedStream { state: SessionState, buffered: usize },

    /// A payload bundle was structurally invalid or out of bounds.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

impl DecodeError {
    pub(crate) fn header(err: impl std::fmt::Display) -> Self {
        Self::MalformedHeader {
            reason: err.to_string(),
        }
    }

    pub(crate) fn payload(err: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            reason: err.to_string(),
        }
    }
}

/// Errors from [`StreamingDecoder`](crate::StreamingDecoder), which adds
/// I/O to the session's failure modes.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
