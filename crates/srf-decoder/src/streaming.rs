use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::DecoderConfig;
use crate::error::ReadError;
use crate::result::DecodeResult;
use crate::session::{DecodeSession, Feed};

/// Asynchronous adapter that drives a [`DecodeSession`] from any
/// `AsyncRead` source (files, sockets, HTTP response bodies).
///
/// Reads happen in chunks of
/// [`DecoderConfig::read_chunk_size`] bytes; each read is fed to the
/// session as it arrives and end of file is fed as `None`. Chunk
/// boundaries are whatever the reader returns, which the session does
/// not care about.
///
/// # Example
///
/// ```rust,no_run
/// use srf_decoder::StreamingDecoder;
/// use tokio::io::AsyncRead;
///
/// async fn total_samples(reader: impl AsyncRead + Unpin) -> usize {
///     let result = StreamingDecoder::new(reader).decode().await.unwrap();
///     result.iter().map(|attribute| attribute.len()).sum()
/// }
/// ```
pub struct StreamingDecoder<R> {
  reader: R,
  config: DecoderConfig,
}

impl<R: AsyncRead + Unpin> StreamingDecoder<R> {
  #[must_use]
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      config: DecoderConfig::default(),
    }
  }

  #[must_use]
  pub fn with_config(mut self, config: DecoderConfig) -> Self {
    self.config = config;
    self
  }

  /// Read until the stream is complete.
  ///
  /// # Errors
  ///
  /// [`ReadError::Io`] if a read fails, [`ReadError::Decode`] if the
  /// session rejects the stream (including end of file before
  /// completion).
  pub async fn decode(mut self) -> Result<Arc<DecodeResult>, ReadError> {
    let mut session = DecodeSession::with_config(self.config);
    let mut buf = vec![0u8; self.config.read_chunk_size.max(1)];

    loop {
      let n = self.reader.read(&mut buf).await?;
      let chunk = (n > 0).then(|| &buf[..n]);
      if let Feed::Ready(result) = session.feed(chunk)? {
        return Ok(result);
      }
    }
  }
}
