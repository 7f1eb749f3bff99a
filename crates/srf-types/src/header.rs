use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::function::FunctionId;
use crate::shape::{pack_labels, pack_shapes, unpack_labels, unpack_shapes};

/// One entry in the header's flat label list: either a group length or a
/// label. See [`unpack_labels`](crate::unpack_labels).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelToken {
  Count(u64),
  Label(String),
}

/// Header map exactly as it travels on the wire.
///
/// Keys are msgpack strings; unknown keys are rejected so a producer typo
/// surfaces as an error instead of a silently missing field.
///
/// ```text
/// ┌────────────┬──────────────┬───────────────────────────────────────┐
/// │ Key        │ Type         │ Meaning                               │
/// ├────────────┼──────────────┼───────────────────────────────────────┤
/// │ pid        │ str          │ Request id, echoed for correlation    │
/// │ function   │ int          │ FunctionId wire value (1, 2)          │
/// │ nbundles   │ uint         │ Number of payload bundles             │
/// │ ndims      │ uint         │ Dimensionality of the source volume   │
/// │ index      │ [int]        │ Per-axis lengths of the source volume │
/// │ labels     │ [uint | str] │ Packed per-attribute axis labels      │
/// │ shapes     │ [uint]       │ Packed per-attribute output shapes    │
/// │ attributes │ [str]        │ Output names, in declaration order    │
/// └────────────┴──────────────┴───────────────────────────────────────┘
/// ```
///
/// `pid`, `index` and `labels` may be omitted and default to empty; the
/// rest are required.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawHeader {
  #[serde(default)]
  pub pid: String,
  pub function: i64,
  pub nbundles: u32,
  pub ndims: u32,
  #[serde(default)]
  pub index: Vec<i64>,
  #[serde(default)]
  pub labels: Vec<LabelToken>,
  pub shapes: Vec<u64>,
  pub attributes: Vec<String>,
}

impl RawHeader {
  /// Decode a header map from one complete msgpack value.
  ///
  /// # Errors
  ///
  /// [`TypeError::Header`] if the bytes are not a header map.
  pub fn from_msgpack(bytes: &[u8]) -> Result<Self, TypeError> {
    Ok(rmp_serde::from_slice(bytes)?)
  }

  /// Encode as a msgpack map with string keys.
  ///
  /// # Errors
  ///
  /// Only if serialization itself fails, which the field types rule out.
  pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(self)
  }
}

/// Validated header: the packed lists are unpacked and checked against
/// the attribute list.
///
/// Invariants held by every `Header`:
/// - one shape and one label group per attribute (labels may be absent
///   altogether, in which case every attribute gets an empty group),
/// - attribute names are unique,
/// - the function id is one this crate knows how to lay out.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Header {
  pid: String,
  function: FunctionId,
  bundle_count: usize,
  ndims: u32,
  index: Vec<i64>,
  attributes: Vec<String>,
  shapes: Vec<Vec<u64>>,
  labels: Vec<Vec<String>>,
}

impl Header {
  /// Validate a wire header.
  ///
  /// # Errors
  ///
  /// Any of the header-side [`TypeError`] variants.
  pub fn from_raw(raw: RawHeader) -> Result<Self, TypeError> {
    let function = FunctionId::from_wire(raw.function)?;

    let shapes = unpack_shapes(&raw.shapes)?;
    if shapes.len() != raw.attributes.len() {
      return Err(TypeError::ShapeCount {
        attributes: raw.attributes.len(),
        shapes: shapes.len(),
      });
    }

    let mut labels = unpack_labels(&raw.labels)?;
    if labels.is_empty() {
      labels = vec![Vec::new(); raw.attributes.len()];
    } else if labels.len() != raw.attributes.len() {
      return Err(TypeError::LabelCount {
        attributes: raw.attributes.len(),
        labels: labels.len(),
      });
    }

    let mut seen = HashSet::with_capacity(raw.attributes.len());
    for name in &raw.attributes {
      if !seen.insert(name.as_str()) {
        return Err(TypeError::DuplicateAttribute { name: name.clone() });
      }
    }

    Ok(Self {
      pid: raw.pid,
      function,
      bundle_count: raw.nbundles as usize,
      ndims: raw.ndims,
      index: raw.index,
      attributes: raw.attributes,
      shapes,
      labels,
    })
  }

  /// Decode and validate in one step.
  ///
  /// # Errors
  ///
  /// See [`RawHeader::from_msgpack`] and [`Header::from_raw`].
  pub fn from_msgpack(bytes: &[u8]) -> Result<Self, TypeError> {
    Self::from_raw(RawHeader::from_msgpack(bytes)?)
  }

  /// Back to the wire form. Packing is lossless, so
  /// `Header::from_raw(h.to_raw())` yields `h` again, except that
  /// all-empty label groups are written out explicitly.
  #[must_use]
  pub fn to_raw(&self) -> RawHeader {
    RawHeader {
      pid: self.pid.clone(),
      function: self.function.to_wire(),
      nbundles: u32::try_from(self.bundle_count).unwrap_or(u32::MAX),
      ndims: self.ndims,
      index: self.index.clone(),
      labels: pack_labels(&self.labels),
      shapes: pack_shapes(&self.shapes),
      attributes: self.attributes.clone(),
    }
  }

  #[must_use]
  pub fn pid(&self) -> &str {
    &self.pid
  }

  #[must_use]
  pub fn function_id(&self) -> FunctionId {
    self.function
  }

  /// Number of payload bundles the stream announces.
  #[must_use]
  pub fn bundle_count(&self) -> usize {
    self.bundle_count
  }

  #[must_use]
  pub fn dimensionality(&self) -> u32 {
    self.ndims
  }

  #[must_use]
  pub fn index(&self) -> &[i64] {
    &self.index
  }

  #[must_use]
  pub fn attributes(&self) -> &[String] {
    &self.attributes
  }

  #[must_use]
  pub fn shapes(&self) -> &[Vec<u64>] {
    &self.shapes
  }

  #[must_use]
  pub fn labels(&self) -> &[Vec<String>] {
    &self.labels
  }

  /// Shape of the named attribute, if declared.
  #[must_use]
  pub fn shape_of(&self, attribute: &str) -> Option<&[u64]> {
    self
      .attributes
      .iter()
      .position(|name| name == attribute)
      .map(|i| self.shapes[i].as_slice())
  }
}

impl TryFrom<RawHeader> for Header {
  type Error = TypeError;

  fn try_from(raw: RawHeader) -> Result<Self, Self::Error> {
    Self::from_raw(raw)
  }
}

impl fmt::Display for Header {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} pid={:?} ndims={} bundles={}",
      self.function, self.pid, self.ndims, self.bundle_count
    )?;
    for ((name, shape), labels) in self.attributes.iter().zip(&self.shapes).zip(&self.labels) {
      write!(f, " | {name} {shape:?} [{}]", labels.join(", "))?;
    }
    Ok(())
  }
}
