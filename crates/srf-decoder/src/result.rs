use srf_types::Header;

use crate::registry::AttributeBuffer;

/// The completed decode of one stream: the header and every attribute's
/// samples.
///
/// Sessions hand this out behind an `Arc`, so once a stream is complete
/// nothing can write to the buffers again.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeResult {
  header: Header,
  attributes: Vec<AttributeBuffer>,
}

impl DecodeResult {
  pub(crate) fn new(header: Header, attributes: Vec<AttributeBuffer>) -> Self {
    Self { header, attributes }
  }

  #[must_use]
  pub fn header(&self) -> &Header {
    &self.header
  }

  /// Buffers in header declaration order.
  #[must_use]
  pub fn attributes(&self) -> &[AttributeBuffer] {
    &self.attributes
  }

  #[must_use]
  pub fn get(&self, attribute: &str) -> Option<&AttributeBuffer> {
    self.attributes.iter().find(|buffer| buffer.name() == attribute)
  }

  pub fn iter(&self) -> std::slice::Iter<'_, AttributeBuffer> {
    self.attributes.iter()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.attributes.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.attributes.is_empty()
  }
}

impl<'a> IntoIterator for &'a DecodeResult {
  type Item = &'a AttributeBuffer;
  type IntoIter = std::slice::Iter<'a, AttributeBuffer>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
