use srf_types::{FunctionId, TypeError};

/// Errors that can occur while building a response stream.
///
/// Builder methods never fail; everything is checked when
/// [`encode`](crate::ResponseEncoder::encode) runs.
///
/// ```text
///   EncodeError
///   ├── NoAttributes       ← encode() with no attribute declared
///   ├── UnknownAttribute   ← bundle for an undeclared attribute
///   ├── FunctionMismatch   ← slice bundle in a curtain stream, or back
///   ├── InvalidHeader      ← header fails validation (e.g. duplicates)
///   └── Encode             ← rmp-serde could not write the stream
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("no attributes have been added to the encoder")]
    NoAttributes,

    #[error("bundle targets undeclared attribute {name:?}")]
    UnknownAttribute { name: String },

    #[error("{found} bundle for {attribute:?} in a {expected} stream")]
    FunctionMismatch {
        attribute: String,
        expected: FunctionId,
        found: FunctionId,
    },

    #[error("invalid header: {0}")]
    InvalidHeader(#[from] TypeError),

    #[error("msgpack encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
