use std::collections::HashMap;

use bytes::{Buf, BytesMut};
use srf_types::{Bundle, FunctionId, RawHeader};
use srf_wire::envelope::read_envelope;
use srf_wire::msgpack::{object_len, peek_array_len};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::registry::{OutputHandle, OutputRegistry};

/// What a call to [`ByteParser::advance`] achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
  /// Everything buffered has been consumed as far as possible; feed more.
  NeedsMoreInput,
  /// The header is available through [`ByteParser::read_header`]. The
  /// parser stops here so outputs can be registered before any payload
  /// is routed.
  HeaderReady,
  /// The whole stream has been consumed and every payload routed.
  Finished,
}

/// The byte-level parser a [`DecodeSession`](crate::DecodeSession) drives.
///
/// The session owns exactly one parser per stream and calls:
///
/// ```text
///   reset                          once, at construction
///   supply → advance               per chunk, repeatedly
///   read_header                    after advance reports HeaderReady
///   register_output                once per attribute, before payload
///   release                        exactly once, on the terminal
///                                  transition or when dropped
/// ```
///
/// Implementations must never consume a structure they have only seen
/// part of: `advance` returns [`Progress::NeedsMoreInput`] and waits for
/// more bytes instead.
pub trait ByteParser {
  /// Drop all buffered bytes and parse state.
  fn reset(&mut self);

  /// Append the next chunk of the stream.
  fn supply(&mut self, bytes: &[u8]);

  /// Parse as far as the buffered bytes allow, writing payload into the
  /// registered slots of `outputs`.
  ///
  /// # Errors
  ///
  /// [`DecodeError::MalformedHeader`] or [`DecodeError::MalformedPayload`]
  /// when the stream cannot be decoded.
  fn advance(&mut self, outputs: &mut OutputRegistry) -> Result<Progress, DecodeError>;

  /// The raw header, once it has been parsed.
  fn read_header(&self) -> Option<RawHeader>;

  /// Route payload for `attribute` into the slot behind `handle`.
  fn register_output(&mut self, attribute: &str, handle: OutputHandle);

  /// Free buffers and bindings. Releasing twice is a no-op.
  fn release(&mut self);
}

/// Position of the [`ResponseParser`] within the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
  Envelope,
  Header,
  BundleList,
  Bundles { remaining: u64 },
  Done,
}

/// Parser for the msgpack response envelope.
///
/// ```text
///   Envelope ──► Header ──► BundleList ──► Bundles{n} ──► Done
///    0x92        map        array(n)       n values
/// ```
///
/// Each step waits until [`object_len`] (or the array-header peek) says the
/// next structure is fully buffered, then splits it off the front of the
/// buffer. Bundles for attributes without a registered output are
/// decoded and dropped.
#[derive(Debug)]
pub struct ResponseParser {
  buf: BytesMut,
  step: Step,
  header: Option<RawHeader>,
  function: Option<FunctionId>,
  bindings: HashMap<String, OutputHandle>,
  max_header_bytes: usize,
}

impl ResponseParser {
  #[must_use]
  pub fn new() -> Self {
    Self::with_config(&DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(config: &DecoderConfig) -> Self {
    Self {
      buf: BytesMut::new(),
      step: Step::Envelope,
      header: None,
      function: None,
      bindings: HashMap::new(),
      max_header_bytes: config.max_header_bytes,
    }
  }

  /// Bytes supplied but not yet consumed.
  #[must_use]
  pub fn buffered(&self) -> usize {
    self.buf.len()
  }

  fn oversized_header(&self, len: usize) -> DecodeError {
    DecodeError::MalformedHeader {
      reason: format!("header exceeds {} bytes (at least {len})", self.max_header_bytes),
    }
  }

  fn read_header_map(&mut self) -> Result<Option<Progress>, DecodeError> {
    let Some(len) = object_len(&self.buf).map_err(DecodeError::header)? else {
      if self.buf.len() > self.max_header_bytes {
        return Err(self.oversized_header(self.buf.len()));
      }
      return Ok(None);
    };
    if len > self.max_header_bytes {
      return Err(self.oversized_header(len));
    }

    let bytes = self.buf.split_to(len);
    let raw = RawHeader::from_msgpack(&bytes).map_err(DecodeError::header)?;
    self.function = Some(FunctionId::from_wire(raw.function).map_err(DecodeError::header)?);
    tracing::debug!(header_bytes = len, attributes = raw.attributes.len(), "parsed header");
    self.header = Some(raw);
    self.step = Step::BundleList;
    Ok(Some(Progress::HeaderReady))
  }

  fn read_bundle_list(&mut self) -> Result<bool, DecodeError> {
    let Some((count, consumed)) = peek_array_len(&self.buf).map_err(DecodeError::payload)? else {
      return Ok(false);
    };
    let declared = self.header.as_ref().map_or(0, |header| u64::from(header.nbundles));
    if count != declared {
      return Err(DecodeError::MalformedPayload {
        reason: format!("header declares {declared} bundles, stream carries {count}"),
      });
    }
    self.buf.advance(consumed);
    self.step = Step::Bundles { remaining: count };
    Ok(true)
  }

  fn route_bundle(&self, bytes: &[u8], outputs: &mut OutputRegistry) -> Result<(), DecodeError> {
    let function = self.function.ok_or_else(|| DecodeError::MalformedPayload {
      reason: "bundle before header".to_string(),
    })?;
    let bundle = Bundle::decode(function, bytes).map_err(DecodeError::payload)?;

    let Some(&handle) = self.bindings.get(bundle.attribute()) else {
      tracing::trace!(attribute = bundle.attribute(), "no output registered; skipping bundle");
      return Ok(());
    };
    let dst = outputs.slot_mut(handle).ok_or_else(|| DecodeError::MalformedPayload {
      reason: format!("no output slot {} for {:?}", handle.index(), bundle.attribute()),
    })?;
    let index = self.header.as_ref().map_or(&[][..], |header| header.index.as_slice());
    let written = bundle.scatter(dst, index).map_err(|err| DecodeError::MalformedPayload {
      reason: format!("attribute {:?}: {err}", bundle.attribute()),
    })?;
    tracing::trace!(attribute = bundle.attribute(), samples = written, "routed bundle");
    Ok(())
  }
}

impl Default for ResponseParser {
  fn default() -> Self {
    Self::new()
  }
}

impl ByteParser for ResponseParser {
  fn reset(&mut self) {
    self.buf.clear();
    self.step = Step::Envelope;
    self.header = None;
    self.function = None;
    self.bindings.clear();
  }

  fn supply(&mut self, bytes: &[u8]) {
    self.buf.extend_from_slice(bytes);
  }

  fn advance(&mut self, outputs: &mut OutputRegistry) -> Result<Progress, DecodeError> {
    loop {
      match self.step {
        Step::Envelope => match read_envelope(&self.buf).map_err(DecodeError::header)? {
          Some(consumed) => {
            self.buf.advance(consumed);
            self.step = Step::Header;
          }
          None => return Ok(Progress::NeedsMoreInput),
        },
        Step::Header => {
          return Ok(self.read_header_map()?.unwrap_or(Progress::NeedsMoreInput));
        }
        Step::BundleList => {
          if !self.read_bundle_list()? {
            return Ok(Progress::NeedsMoreInput);
          }
        }
        Step::Bundles { remaining: 0 } => {
          if !self.buf.is_empty() {
            tracing::debug!(trailing = self.buf.len(), "ignoring bytes after the last bundle");
          }
          self.step = Step::Done;
        }
        Step::Bundles { remaining } => {
          let Some(len) = object_len(&self.buf).map_err(DecodeError::payload)? else {
            return Ok(Progress::NeedsMoreInput);
          };
          let bytes = self.buf.split_to(len);
          self.route_bundle(&bytes, outputs)?;
          self.step = Step::Bundles {
            remaining: remaining - 1,
          };
        }
        Step::Done => return Ok(Progress::Finished),
      }
    }
  }

  fn read_header(&self) -> Option<RawHeader> {
    self.header.clone()
  }

  fn register_output(&mut self, attribute: &str, handle: OutputHandle) {
    self.bindings.insert(attribute.to_string(), handle);
  }

  fn release(&mut self) {
    self.buf = BytesMut::new();
    self.header = None;
    self.function = None;
    self.bindings = HashMap::new();
    self.step = Step::Done;
  }
}

#[cfg(test)]
mod tests {
  use srf_encoder::{CurtainRun, ResponseEncoder};
  use srf_types::{FunctionId, Header};

  use super::*;

  fn small_curtain() -> Vec<u8> {
    let mut enc = ResponseEncoder::new(FunctionId::Curtain);
    enc
      .ndims(3)
      .index(vec![2, 1, 3])
      .add_attribute("amp", vec![2, 3], vec!["trace".into(), "depth".into()]);
    enc.add_curtain_bundle(
      "amp",
      vec![CurtainRun {
        traces: 0..2,
        depths: 0..3,
        values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
      }],
    );
    enc.encode().unwrap()
  }

  fn bind_all(parser: &mut ResponseParser, config: &DecoderConfig) -> OutputRegistry {
    let header = Header::from_raw(parser.read_header().unwrap()).unwrap();
    let outputs = OutputRegistry::allocate(&header, config).unwrap();
    for (name, handle) in outputs.handles() {
      parser.register_output(name, handle);
    }
    outputs
  }

  #[test]
  fn pauses_at_header_then_finishes() {
    let bytes = small_curtain();
    let config = DecoderConfig::default();
    let mut parser = ResponseParser::new();
    parser.supply(&bytes);

    let mut none = OutputRegistry::default();
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::HeaderReady);

    let mut outputs = bind_all(&mut parser, &config);
    assert_eq!(parser.advance(&mut outputs).unwrap(), Progress::Finished);
    assert_eq!(parser.buffered(), 0);
    assert_eq!(outputs.get("amp").unwrap().data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
  }

  #[test]
  fn partial_header_is_not_consumed() {
    let bytes = small_curtain();
    let mut parser = ResponseParser::new();
    parser.supply(&bytes[..10]);

    let mut none = OutputRegistry::default();
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::NeedsMoreInput);
    assert!(parser.read_header().is_none());
    // only the envelope tag is gone
    assert_eq!(parser.buffered(), 9);
  }

  #[test]
  fn unbound_attribute_is_skipped() {
    let bytes = small_curtain();
    let mut parser = ResponseParser::new();
    parser.supply(&bytes);

    let mut none = OutputRegistry::default();
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::HeaderReady);
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::Finished);
  }

  #[test]
  fn oversized_header_fails_early() {
    let bytes = small_curtain();
    let config = DecoderConfig {
      max_header_bytes: 8,
      ..DecoderConfig::default()
    };
    let mut parser = ResponseParser::with_config(&config);
    parser.supply(&bytes[..20]);

    let mut none = OutputRegistry::default();
    assert!(matches!(
      parser.advance(&mut none),
      Err(DecodeError::MalformedHeader { .. })
    ));
  }

  #[test]
  fn non_envelope_is_malformed_header() {
    let mut parser = ResponseParser::new();
    parser.supply(&[0x93, 0x01]);
    let mut none = OutputRegistry::default();
    assert!(matches!(
      parser.advance(&mut none),
      Err(DecodeError::MalformedHeader { .. })
    ));
  }

  #[test]
  fn bundle_count_mismatch() {
    let mut bytes = small_curtain();
    // the bundle list header directly follows the header map; the encoder
    // wrote fixarray(1), claim two instead
    let header_len = object_len(&bytes[1..]).unwrap().unwrap();
    assert_eq!(bytes[1 + header_len], 0x91);
    bytes[1 + header_len] = 0x92;

    let mut parser = ResponseParser::new();
    parser.supply(&bytes);
    let mut none = OutputRegistry::default();
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::HeaderReady);
    assert!(matches!(
      parser.advance(&mut none),
      Err(DecodeError::MalformedPayload { .. })
    ));
  }

  #[test]
  fn trailing_bytes_are_ignored() {
    let mut bytes = small_curtain();
    bytes.extend_from_slice(&[0xC0, 0xC0]);
    let config = DecoderConfig::default();
    let mut parser = ResponseParser::new();
    parser.supply(&bytes);

    let mut none = OutputRegistry::default();
    parser.advance(&mut none).unwrap();
    let mut outputs = bind_all(&mut parser, &config);
    assert_eq!(parser.advance(&mut outputs).unwrap(), Progress::Finished);
  }

  #[test]
  fn release_is_idempotent() {
    let mut parser = ResponseParser::new();
    parser.supply(&small_curtain());
    parser.release();
    parser.release();
    assert_eq!(parser.buffered(), 0);
    assert!(parser.read_header().is_none());
  }

  #[test]
  fn reset_starts_over() {
    let bytes = small_curtain();
    let mut parser = ResponseParser::new();
    parser.supply(&bytes[..5]);
    parser.reset();
    parser.supply(&bytes);
    let mut none = OutputRegistry::default();
    assert_eq!(parser.advance(&mut none).unwrap(), Progress::HeaderReady);
  }
}
