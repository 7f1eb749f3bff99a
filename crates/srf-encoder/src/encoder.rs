use std::ops::Range;

use serde::Serialize;
use serde_bytes::Bytes;
use srf_types::{CurtainWire, FunctionId, Header, RawHeader, SliceWire, pack_labels, pack_shapes};

use crate::error::EncodeError;

/// One strided tile of a slice bundle. See
/// [`SliceTile`](srf_types::SliceTile) for the copy it describes.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub iterations: usize,
    pub chunk_size: usize,
    pub initial_skip: usize,
    pub superstride: usize,
    pub substride: usize,
    pub values: Vec<f32>,
}

/// One run of a curtain bundle. `values` holds
/// `traces.len() * depths.len()` samples, trace by trace.
#[derive(Clone, Debug, PartialEq)]
pub struct CurtainRun {
    pub traces: Range<usize>,
    pub depths: Range<usize>,
    pub values: Vec<f32>,
}

/// A bundle awaiting serialization.
enum PendingBundle {
    Slice { attribute: String, tiles: Vec<Tile> },
    Curtain { attribute: String, runs: Vec<CurtainRun> },
}

impl PendingBundle {
    fn attribute(&self) -> &str {
        match self {
            Self::Slice { attribute, .. } | Self::Curtain { attribute, .. } => attribute,
        }
    }

    fn function_id(&self) -> FunctionId {
        match self {
            Self::Slice { .. } => FunctionId::Slice,
            Self::Curtain { .. } => FunctionId::Curtain,
        }
    }

    /// Little-endian sample bytes: one payload per tile for a slice, a
    /// single payload for a curtain.
    fn sample_bytes(&self) -> Vec<Vec<u8>> {
        match self {
            Self::Slice { tiles, .. } => tiles.iter().map(|tile| le_bytes(&tile.values)).collect(),
            Self::Curtain { runs, .. } => vec![le_bytes(runs.iter().flat_map(|run| &run.values))],
        }
    }

    fn to_wire<'a>(&'a self, payloads: &'a [Vec<u8>]) -> WireBundle<'a> {
        match self {
            Self::Slice { attribute, tiles } => WireBundle::Slice((
                attribute.as_str(),
                tiles
                    .iter()
                    .zip(payloads)
                    .map(|(tile, bytes)| {
                        (
                            tile.iterations,
                            tile.chunk_size,
                            tile.initial_skip,
                            tile.superstride,
                            tile.substride,
                            Bytes::new(bytes),
                        )
                    })
                    .collect(),
            )),
            Self::Curtain { attribute, runs } => WireBundle::Curtain((
                attribute.as_str(),
                runs.len(),
                runs.iter().flat_map(|run| [run.traces.start, run.traces.end]).collect(),
                runs.iter().flat_map(|run| [run.depths.start, run.depths.end]).collect(),
                Bytes::new(payloads.first().map_or(&[][..], Vec::as_slice)),
            )),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireBundle<'a> {
    Slice(SliceWire<'a>),
    Curtain(CurtainWire<'a>),
}

fn le_bytes<'v>(values: impl IntoIterator<Item = &'v f32>) -> Vec<u8> {
    values.into_iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Response encoder: builds a complete result stream from declared
/// attributes and their payload bundles.
///
/// This is the producer side of the format, used to build fixtures,
/// benchmark inputs and test streams. Methods append to internal lists
/// and return `&mut Self` for chaining; all checks happen in
/// [`encode`](Self::encode).
///
/// # Usage
///
/// ```rust
/// use srf_encoder::{CurtainRun, ResponseEncoder};
/// use srf_types::FunctionId;
///
/// let stream = ResponseEncoder::new(FunctionId::Curtain)
///     .pid("example")
///     .ndims(3)
///     .index(vec![2, 1, 3])
///     .add_attribute("amp", vec![2, 3], vec!["trace".into(), "depth".into()])
///     .add_curtain_bundle(
///         "amp",
///         vec![CurtainRun { traces: 0..2, depths: 0..3, values: vec![0.5; 6] }],
///     )
///     .encode()
///     .unwrap();
/// assert_eq!(stream[0], 0x92);
/// ```
///
/// # Output layout
///
/// ```text
/// ┌──────────────────────┬─────────────────────────────────────────┐
/// │ 0x92                 │ Envelope: array of two                  │
/// │ map                  │ Header (RawHeader, string keys)         │
/// │ array(nbundles)      │ Bundle list header                      │
/// │ bundle ...           │ One msgpack array per bundle, in order  │
/// └──────────────────────┴─────────────────────────────────────────┘
/// ```
pub struct ResponseEncoder {
    function: FunctionId,
    pid: String,
    ndims: u32,
    index: Vec<i64>,
    attributes: Vec<String>,
    shapes: Vec<Vec<u64>>,
    labels: Vec<Vec<String>>,
    bundles: Vec<PendingBundle>,
}

impl ResponseEncoder {
    #[must_use]
    pub fn new(function: FunctionId) -> Self {
        Self {
            function,
            pid: String::new(),
            ndims: 0,
            index: Vec::new(),
            attributes: Vec::new(),
            shapes: Vec::new(),
            labels: Vec::new(),
            bundles: Vec::new(),
        }
    }

    pub fn pid(&mut self, pid: &str) -> &mut Self {
        self.pid = pid.to_string();
        self
    }

    pub fn ndims(&mut self, ndims: u32) -> &mut Self {
        self.ndims = ndims;
        self
    }

    /// Per-axis lengths of the source volume. Curtain streams need at
    /// least three entries; the third is the depth axis length.
    pub fn index(&mut self, index: Vec<i64>) -> &mut Self {
        self.index = index;
        self
    }

    pub fn add_attribute(&mut self, name: &str, shape: Vec<u64>, labels: Vec<String>) -> &mut Self {
        self.attributes.push(name.to_string());
        self.shapes.push(shape);
        self.labels.push(labels);
        self
    }

    pub fn add_slice_bundle(&mut self, attribute: &str, tiles: Vec<Tile>) -> &mut Self {
        self.bundles.push(PendingBundle::Slice {
            attribute: attribute.to_string(),
            tiles,
        });
        self
    }

    pub fn add_curtain_bundle(&mut self, attribute: &str, runs: Vec<CurtainRun>) -> &mut Self {
        self.bundles.push(PendingBundle::Curtain {
            attribute: attribute.to_string(),
            runs,
        });
        self
    }

    /// The header this encoder will write.
    #[must_use]
    pub fn raw_header(&self) -> RawHeader {
        RawHeader {
            pid: self.pid.clone(),
            function: self.function.to_wire(),
            nbundles: u32::try_from(self.bundles.len()).unwrap_or(u32::MAX),
            ndims: self.ndims,
            index: self.index.clone(),
            labels: pack_labels(&self.labels),
            shapes: pack_shapes(&self.shapes),
            attributes: self.attributes.clone(),
        }
    }

    /// Serialize everything added so far.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::NoAttributes`] if no attribute was added.
    /// - [`EncodeError::FunctionMismatch`] if a bundle's kind differs from
    ///   the encoder's function.
    /// - [`EncodeError::UnknownAttribute`] if a bundle targets an
    ///   attribute that was never added.
    /// - [`EncodeError::InvalidHeader`] if the header would not validate
    ///   on the decoding side.
    /// - [`EncodeError::Encode`] if rmp-serde fails to write the stream.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if self.attributes.is_empty() {
            return Err(EncodeError::NoAttributes);
        }

        for bundle in &self.bundles {
            if bundle.function_id() != self.function {
                return Err(EncodeError::FunctionMismatch {
                    attribute: bundle.attribute().to_string(),
                    expected: self.function,
                    found: bundle.function_id(),
                });
            }
            if !self.attributes.iter().any(|name| name == bundle.attribute()) {
                return Err(EncodeError::UnknownAttribute {
                    name: bundle.attribute().to_string(),
                });
            }
        }

        let raw = self.raw_header();
        Header::from_raw(raw.clone())?;

        let payloads: Vec<Vec<Vec<u8>>> = self.bundles.iter().map(PendingBundle::sample_bytes).collect();
        let bundles: Vec<WireBundle<'_>> = self
            .bundles
            .iter()
            .zip(&payloads)
            .map(|(bundle, bytes)| bundle.to_wire(bytes))
            .collect();
        Ok(rmp_serde::to_vec_named(&(&raw, bundles))?)
    }
}

#[cfg(test)]
mod tests {
    use srf_decoder::{DecodeSession, Feed};

    use super::*;

    fn curtain_encoder() -> ResponseEncoder {
        let mut enc = ResponseEncoder::new(FunctionId::Curtain);
        enc.pid("enc-test")
            .ndims(3)
            .index(vec![2, 1, 3])
            .add_attribute("amp", vec![2, 3], vec!["trace".into(), "depth".into()]);
        enc
    }

    #[test]
    fn encoded_stream_decodes() {
        let mut enc = curtain_encoder();
        enc.add_curtain_bundle(
            "amp",
            vec![
                CurtainRun {
                    traces: 0..1,
                    depths: 0..3,
                    values: vec![1.0, 2.0, 3.0],
                },
                CurtainRun {
                    traces: 1..2,
                    depths: 1..3,
                    values: vec![5.0, 6.0],
                },
            ],
        );
        let bytes = enc.encode().unwrap();

        let mut session = DecodeSession::new();
        let Feed::Ready(result) = session.feed(Some(&bytes)).unwrap() else {
            panic!("stream should be complete");
        };
        assert_eq!(result.header().pid(), "enc-test");
        assert_eq!(result.header().bundle_count(), 1);
        assert_eq!(result.get("amp").unwrap().data(), &[1.0, 2.0, 3.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn header_matches_builder() {
        let enc = curtain_encoder();
        let header = Header::from_raw(enc.raw_header()).unwrap();
        assert_eq!(header.function_id(), FunctionId::Curtain);
        assert_eq!(header.shapes(), &[vec![2, 3]]);
        assert_eq!(header.labels(), &[vec!["trace".to_string(), "depth".to_string()]]);
        assert_eq!(header.bundle_count(), 0);
    }

    #[test]
    fn no_attributes() {
        let enc = ResponseEncoder::new(FunctionId::Slice);
        assert!(matches!(enc.encode(), Err(EncodeError::NoAttributes)));
    }

    #[test]
    fn unknown_attribute() {
        let mut enc = curtain_encoder();
        enc.add_curtain_bundle("other", Vec::new());
        assert!(matches!(
            enc.encode(),
            Err(EncodeError::UnknownAttribute { name }) if name == "other"
        ));
    }

    #[test]
    fn function_mismatch() {
        let mut enc = curtain_encoder();
        enc.add_slice_bundle("amp", Vec::new());
        assert!(matches!(
            enc.encode(),
            Err(EncodeError::FunctionMismatch {
                expected: FunctionId::Curtain,
                found: FunctionId::Slice,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_attribute_is_invalid() {
        let mut enc = curtain_encoder();
        enc.add_attribute("amp", vec![1], Vec::new());
        assert!(matches!(enc.encode(), Err(EncodeError::InvalidHeader(_))));
    }

    #[test]
    fn starts_with_envelope() {
        let bytes = curtain_encoder().encode().unwrap();
        assert_eq!(bytes[0], 0x92);
        // empty bundle list closes the stream
        assert_eq!(*bytes.last().unwrap(), 0x90);
    }
}
