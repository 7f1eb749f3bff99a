use srf_types::{Header, element_count};

use crate::config::DecoderConfig;
use crate::error::DecodeError;

/// One decoded attribute: its name, the shape declared in the header, and
/// `product(shape)` samples in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeBuffer {
  name: String,
  shape: Vec<u64>,
  data: Vec<f32>,
}

impl AttributeBuffer {
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[must_use]
  pub fn shape(&self) -> &[u64] {
    &self.shape
  }

  #[must_use]
  pub fn data(&self) -> &[f32] {
    &self.data
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[must_use]
  pub fn into_data(self) -> Vec<f32> {
    self.data
  }
}

/// Slot index of an output buffer inside an [`OutputRegistry`].
///
/// Handles are what a parser holds on to after
/// [`ByteParser::register_output`](crate::ByteParser::register_output);
/// it never sees the buffers themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputHandle(usize);

impl OutputHandle {
  #[must_use]
  pub fn index(self) -> usize {
    self.0
  }
}

/// The set of output buffers for one stream, one per header attribute,
/// in declaration order.
///
/// A registry is built in one step by [`allocate`](Self::allocate): every
/// attribute is sized and checked first, and buffers are only allocated
/// once all of them pass. Afterwards the only write path is
/// [`slot_mut`](Self::slot_mut).
#[derive(Debug, Default)]
pub struct OutputRegistry {
  buffers: Vec<AttributeBuffer>,
}

impl OutputRegistry {
  /// Allocate one zeroed buffer per attribute.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Allocation`] for the first attribute whose shape
  /// holds no elements, overflows, or exceeds `config.max_elements`.
  pub fn allocate(header: &Header, config: &DecoderConfig) -> Result<Self, DecodeError> {
    let mut counts = Vec::with_capacity(header.attributes().len());
    for (name, shape) in header.attributes().iter().zip(header.shapes()) {
      let count = element_count(shape)
        .filter(|&n| n > 0 && n <= config.max_elements)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DecodeError::Allocation {
          attribute: name.clone(),
          shape: shape.clone(),
          limit: config.max_elements,
        })?;
      counts.push(count);
    }

    let buffers = header
      .attributes()
      .iter()
      .zip(header.shapes())
      .zip(counts)
      .map(|((name, shape), count)| {
        tracing::debug!(attribute = %name, ?shape, elements = count, "allocating output buffer");
        AttributeBuffer {
          name: name.clone(),
          shape: shape.clone(),
          data: vec![0.0; count],
        }
      })
      .collect();

    Ok(Self { buffers })
  }

  /// Attribute names paired with their handles, in declaration order.
  pub fn handles(&self) -> impl Iterator<Item = (&str, OutputHandle)> {
    self
      .buffers
      .iter()
      .enumerate()
      .map(|(i, buffer)| (buffer.name.as_str(), OutputHandle(i)))
  }

  /// Mutable samples behind `handle`, or `None` for a handle this
  /// registry did not hand out.
  pub fn slot_mut(&mut self, handle: OutputHandle) -> Option<&mut [f32]> {
    self.buffers.get_mut(handle.0).map(|buffer| buffer.data.as_mut_slice())
  }

  #[must_use]
  pub fn get(&self, attribute: &str) -> Option<&AttributeBuffer> {
    self.buffers.iter().find(|buffer| buffer.name == attribute)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.buffers.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.buffers.is_empty()
  }

  #[must_use]
  pub fn into_buffers(self) -> Vec<AttributeBuffer> {
    self.buffers
  }
}
