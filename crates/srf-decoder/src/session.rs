use std::fmt;
use std::sync::Arc;

use srf_types::Header;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::guard::ParserGuard;
use crate::parser::{ByteParser, Progress, ResponseParser};
use crate::registry::OutputRegistry;
use crate::result::DecodeResult;

/// Where a [`DecodeSession`] stands.
///
/// ```text
///   Idle ──► AwaitingHeader ──► AwaitingPayload ──► Done
///              │                  │
///              └──────────────────┴──────────────► Failed
/// ```
///
/// Transitions only move forward; `Done` and `Failed` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
  /// No bytes received yet.
  Idle,
  /// Bytes are arriving but the header is not complete.
  AwaitingHeader,
  /// Header parsed and outputs allocated; payload is being routed.
  AwaitingPayload,
  Done,
  Failed,
}

impl SessionState {
  #[must_use]
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Done | Self::Failed)
  }
}

impl fmt::Display for SessionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Idle => "idle",
      Self::AwaitingHeader => "awaiting header",
      Self::AwaitingPayload => "awaiting payload",
      Self::Done => "done",
      Self::Failed => "failed",
    })
  }
}

/// Outcome of a successful [`DecodeSession::feed`].
#[derive(Clone, Debug)]
pub enum Feed {
  /// More input is needed. Nothing partial is exposed.
  Pending,
  /// The stream is complete. Every later `feed` returns the same `Arc`.
  Ready(Arc<DecodeResult>),
}

impl Feed {
  #[must_use]
  pub fn is_ready(&self) -> bool {
    matches!(self, Self::Ready(_))
  }

  #[must_use]
  pub fn into_result(self) -> Option<Arc<DecodeResult>> {
    match self {
      Self::Ready(result) => Some(result),
      Self::Pending => None,
    }
  }
}

enum Stage {
  Idle,
  AwaitingHeader,
  AwaitingPayload { header: Header, outputs: OutputRegistry },
}

impl Stage {
  fn state(&self) -> SessionState {
    match self {
      Self::Idle => SessionState::Idle,
      Self::AwaitingHeader => SessionState::AwaitingHeader,
      Self::AwaitingPayload { .. } => SessionState::AwaitingPayload,
    }
  }
}

/// A session that still owns its parser.
struct Live<P: ByteParser> {
  parser: ParserGuard<P>,
  stage: Stage,
}

enum Phase<P: ByteParser> {
  Live(Live<P>),
  Done(Arc<DecodeResult>),
  Failed(DecodeError),
}

/// Incremental decoder for one result stream.
///
/// Feed it chunks in stream order, of any size and with any boundaries,
/// then `None` at end of input. It reports [`Feed::Pending`] until the
/// last payload byte has been routed, then [`Feed::Ready`] with the
/// header and every attribute buffer.
///
/// ```rust
/// use srf_decoder::{DecodeSession, Feed};
///
/// fn decode(chunks: &[&[u8]]) -> Option<usize> {
///     let mut session = DecodeSession::new();
///     for chunk in chunks {
///         if let Ok(Feed::Ready(result)) = session.feed(Some(chunk)) {
///             return Some(result.len());
///         }
///     }
///     None
/// }
/// ```
///
/// The parser is released exactly once: when the session completes, when
/// it fails, or when it is dropped or [disposed](Self::dispose) before
/// either.
pub struct DecodeSession<P: ByteParser = ResponseParser> {
  config: DecoderConfig,
  phase: Phase<P>,
  received: usize,
}

impl DecodeSession<ResponseParser> {
  #[must_use]
  pub fn new() -> Self {
    Self::with_config(DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(config: DecoderConfig) -> Self {
    Self::with_parser(ResponseParser::with_config(&config), config)
  }
}

impl Default for DecodeSession<ResponseParser> {
  fn default() -> Self {
    Self::new()
  }
}

impl<P: ByteParser> DecodeSession<P> {
  /// Build a session around any parser. The parser is reset first.
  pub fn with_parser(mut parser: P, config: DecoderConfig) -> Self {
    parser.reset();
    Self {
      config,
      phase: Phase::Live(Live {
        parser: ParserGuard::new(parser),
        stage: Stage::Idle,
      }),
      received: 0,
    }
  }

  /// Supply the next chunk, or `None` to signal end of input.
  ///
  /// Once the session is complete this keeps returning the same result;
  /// once it has failed it keeps returning the same error. Empty chunks
  /// are accepted and change nothing.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::MalformedHeader`] or [`DecodeError::MalformedPayload`]
  ///   from the parser or header validation.
  /// - [`DecodeError::Allocation`] when a declared shape cannot be
  ///   allocated.
  /// - [`DecodeError::TruncatedStream`] for `None` before completion.
  pub fn feed(&mut self, chunk: Option<&[u8]>) -> Result<Feed, DecodeError> {
    let live = match &mut self.phase {
      Phase::Done(result) => return Ok(Feed::Ready(Arc::clone(result))),
      Phase::Failed(err) => return Err(err.clone()),
      Phase::Live(live) => live,
    };

    match live.step(chunk, &self.config, &mut self.received) {
      Ok(None) => Ok(Feed::Pending),
      Ok(Some(result)) => {
        let result = Arc::new(result);
        tracing::debug!(attributes = result.len(), bytes = self.received, "stream complete");
        self.phase = Phase::Done(Arc::clone(&result));
        Ok(Feed::Ready(result))
      }
      Err(err) => {
        tracing::warn!(error = %err, bytes = self.received, "decode failed");
        live.parser.release();
        self.phase = Phase::Failed(err.clone());
        Err(err)
      }
    }
  }

  #[must_use]
  pub fn state(&self) -> SessionState {
    match &self.phase {
      Phase::Live(live) => live.stage.state(),
      Phase::Done(_) => SessionState::Done,
      Phase::Failed(_) => SessionState::Failed,
    }
  }

  #[must_use]
  pub fn config(&self) -> &DecoderConfig {
    &self.config
  }

  /// Total bytes fed so far.
  #[must_use]
  pub fn received(&self) -> usize {
    self.received
  }

  /// The completed result, if any.
  #[must_use]
  pub fn result(&self) -> Option<Arc<DecodeResult>> {
    match &self.phase {
      Phase::Done(result) => Some(Arc::clone(result)),
      _ => None,
    }
  }

  /// End the session now, releasing the parser if it is still held.
  /// Dropping the session has the same effect.
  pub fn dispose(self) {
    if let Phase::Live(mut live) = self.phase {
      tracing::debug!(state = %live.stage.state(), "disposing unfinished session");
      live.parser.release();
    }
  }
}

impl<P: ByteParser> Live<P> {
  /// Run one `feed`: supply the chunk, then advance until the parser
  /// needs more input or the stream completes.
  fn step(
    &mut self,
    chunk: Option<&[u8]>,
    config: &DecoderConfig,
    received: &mut usize,
  ) -> Result<Option<DecodeResult>, DecodeError> {
    if let Some(bytes) = chunk.filter(|bytes| !bytes.is_empty()) {
      self.parser.supply(bytes);
      *received += bytes.len();
      if matches!(self.stage, Stage::Idle) {
        tracing::debug!("first bytes received; awaiting header");
        self.stage = Stage::AwaitingHeader;
      }
    }

    loop {
      let progress = match &mut self.stage {
        Stage::Idle => break,
        Stage::AwaitingHeader => self.parser.advance(&mut OutputRegistry::default())?,
        Stage::AwaitingPayload { outputs, .. } => self.parser.advance(outputs)?,
      };

      match progress {
        Progress::NeedsMoreInput => break,
        Progress::HeaderReady if matches!(self.stage, Stage::AwaitingHeader) => self.bind_outputs(config)?,
        Progress::HeaderReady => break,
        Progress::Finished => return self.finish().map(Some),
      }
    }

    match chunk {
      Some(_) => Ok(None),
      None => Err(DecodeError::TruncatedStream {
        state: self.stage.state(),
        buffered: *received,
      }),
    }
  }

  /// Build the header, allocate every output and bind it in the parser.
  fn bind_outputs(&mut self, config: &DecoderConfig) -> Result<(), DecodeError> {
    let raw = self.parser.read_header().ok_or_else(|| DecodeError::MalformedHeader {
      reason: "parser reported a header it cannot produce".to_string(),
    })?;
    let header = Header::from_raw(raw).map_err(DecodeError::header)?;
    let outputs = OutputRegistry::allocate(&header, config)?;
    for (name, handle) in outputs.handles() {
      self.parser.register_output(name, handle);
    }

    tracing::debug!(%header, "header ready; awaiting payload");
    self.stage = Stage::AwaitingPayload { header, outputs };
    Ok(())
  }

  fn finish(&mut self) -> Result<DecodeResult, DecodeError> {
    match std::mem::replace(&mut self.stage, Stage::Idle) {
      Stage::AwaitingPayload { header, outputs } => {
        self.parser.release();
        Ok(DecodeResult::new(header, outputs.into_buffers()))
      }
      other => Err(DecodeError::MalformedHeader {
        reason: format!("stream finished while {}", other.state()),
      }),
    }
  }
}
