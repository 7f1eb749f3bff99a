/// Limits applied by a decode session.
///
/// Controls how much memory a stream may make the decoder commit, and how
/// large the reads of the async adapter are.
///
/// ```text
/// ┌──────────────────┬───────────────┬───────────────────────────────────┐
/// │ Field            │ Default       │ Purpose                           │
/// ├──────────────────┼───────────────┼───────────────────────────────────┤
/// │ max_elements     │ 1 << 28       │ Largest buffer, in f32 samples    │
/// │ max_header_bytes │ 1 MiB         │ Largest header map before failing │
/// │ read_chunk_size  │ 64 KiB        │ Read size of StreamingDecoder     │
/// └──────────────────┴───────────────┴───────────────────────────────────┘
/// ```
///
/// Override individual limits with struct update syntax:
///
/// ```rust
/// use srf_decoder::DecoderConfig;
///
/// let config = DecoderConfig {
///     max_elements: 1 << 20,
///     ..DecoderConfig::default()
/// };
/// assert_eq!(config.max_header_bytes, 1 << 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Upper bound on `product(shape)` for any single attribute. A header
    /// declaring more fails with
    /// [`DecodeError::Allocation`](crate::DecodeError::Allocation) before
    /// anything is allocated.
    pub max_elements: u64,

    /// Upper bound on the encoded header map. Without it a stream that
    /// never completes its header would make the parser buffer forever.
    pub max_header_bytes: usize,

    /// Bytes requested per read by [`StreamingDecoder`](crate::StreamingDecoder).
    pub read_chunk_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_elements: 1 << 28,
            max_header_bytes: 1 << 20,
            read_chunk_size: 64 * 1024,
        }
    }
}
