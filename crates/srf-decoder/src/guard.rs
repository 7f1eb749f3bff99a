use std::ops::{Deref, DerefMut};

use crate::parser::ByteParser;

/// Owns a parser and releases it exactly once: either explicitly through
/// [`release`](Self::release) on a terminal transition, or on drop if the
/// owner is abandoned mid-stream.
pub(crate) struct ParserGuard<P: ByteParser> {
  parser: P,
  released: bool,
}

impl<P: ByteParser> ParserGuard<P> {
  pub(crate) fn new(parser: P) -> Self {
    Self {
      parser,
      released: false,
    }
  }

  /// Release the parser. Later calls are no-ops.
  pub(crate) fn release(&mut self) {
    if !self.released {
      self.released = true;
      self.parser.release();
    }
  }
}

impl<P: ByteParser> Deref for ParserGuard<P> {
  type Target = P;

  fn deref(&self) -> &P {
    &self.parser
  }
}

impl<P: ByteParser> DerefMut for ParserGuard<P> {
  fn deref_mut(&mut self) -> &mut P {
    &mut self.parser
  }
}

impl<P: ByteParser> Drop for ParserGuard<P> {
  fn drop(&mut self) {
    self.release();
  }
}
