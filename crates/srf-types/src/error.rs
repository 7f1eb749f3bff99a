/// Errors raised while interpreting decoded wire values as typed headers
/// and bundles.
///
/// These sit one level above the framing in `srf-wire`: a complete msgpack
/// value was buffered, but it does not describe a consistent result.
///
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │ TypeError (this crate)                                   │
/// │   header side                                            │
/// │   ├── PackedOverrun / LabelToken  ← length-prefix lists  │
/// │   ├── ShapeCount / LabelCount     ← per-attribute arity  │
/// │   ├── DuplicateAttribute / UnknownFunction               │
/// │   └── Header(rmp_serde)           ← header map decode    │
/// │   bundle side                                            │
/// │   ├── Bundle(rmp_serde)           ← bundle tuple decode  │
/// │   ├── BundleArity / InvertedRange / MisalignedValues     │
/// │   └── MissingDepthAxis / BundleBounds                    │
/// └──────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
  /// A group count in a length-prefixed list runs past the end of it.
  #[error("count {count} at offset {offset} overruns the list ({remaining} values left)")]
  PackedOverrun {
    offset: usize,
    count: u64,
    remaining: usize,
  },

  /// A label list had a string where a count belongs, or a count where a
  /// label belongs.
  #[error("misplaced token at offset {offset} in packed labels")]
  LabelToken { offset: usize },

  #[error("header declares {attributes} attributes but {shapes} shapes")]
  ShapeCount { attributes: usize, shapes: usize },

  #[error("header declares {attributes} attributes but {labels} label groups")]
  LabelCount { attributes: usize, labels: usize },

  #[error("attribute {name:?} is declared more than once")]
  DuplicateAttribute { name: String },

  #[error("invalid function; was {value}")]
  UnknownFunction { value: i64 },

  /// A bundle did not match the tuple layout of the header's function.
  #[error("bundle: {0}")]
  Bundle(rmp_serde::decode::Error),

  /// A curtain's range list does not hold two entries per run.
  #[error("expected {expected} slots in {what}, was {found}")]
  BundleArity {
    what: &'static str,
    expected: usize,
    found: usize,
  },

  /// A `[first, last)` pair with `last < first`.
  #[error("inverted range {start}..{end}")]
  InvertedRange { start: usize, end: usize },

  /// A values payload whose length is not a whole number of `f32`s.
  #[error("values payload of {len} bytes is not a multiple of 4")]
  MisalignedValues { len: usize },

  /// Curtain bundles need `index[2]` (the depth axis length).
  #[error("curtain bundle needs a depth axis; index has {index_len} entries")]
  MissingDepthAxis { index_len: usize },

  /// A copy would read or write outside its buffer.
  #[error("{side} range ends at {end}, beyond its {capacity} samples")]
  BundleBounds {
    side: &'static str,
    end: usize,
    capacity: usize,
  },

  /// The header map could not be decoded.
  #[error("header: {0}")]
  Header(#[from] rmp_serde::decode::Error),
}
