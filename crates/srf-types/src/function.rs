use std::fmt;

use serde::Serialize;

use crate::error::TypeError;

/// Which server-side operation produced a result.
///
/// The id travels as a plain integer in the header's `function` field.
/// It decides how payload bundles are laid out (see
/// [`Bundle::decode`](crate::Bundle::decode)); beyond that it is opaque
/// to the decoder and is handed to the caller for dispatch.
///
/// ```text
/// ┌─────────┬──────┬─────────────────────────────────────────────┐
/// │ Variant │ Wire │ Bundle layout                               │
/// ├─────────┼──────┼─────────────────────────────────────────────┤
/// │ Slice   │ 1    │ [attribute, [tile...]]                      │
/// │ Curtain │ 2    │ [attribute, size, major, minor, values]     │
/// └─────────┴──────┴─────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionId {
  Slice,
  Curtain,
}

impl FunctionId {
  /// Convert the wire integer.
  ///
  /// # Errors
  ///
  /// [`TypeError::UnknownFunction`] for anything but 1 and 2.
  pub fn from_wire(value: i64) -> Result<Self, TypeError> {
    match value {
      1 => Ok(Self::Slice),
      2 => Ok(Self::Curtain),
      other => Err(TypeError::UnknownFunction { value: other }),
    }
  }

  #[must_use]
  pub fn to_wire(self) -> i64 {
    match self {
      Self::Slice => 1,
      Self::Curtain => 2,
    }
  }

  #[must_use]
  pub fn name(self) -> &'static str {
    match self {
      Self::Slice => "slice",
      Self::Curtain => "curtain",
    }
  }
}

impl fmt::Display for FunctionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_values_match_protocol() {
    assert_eq!(FunctionId::from_wire(1).unwrap(), FunctionId::Slice);
    assert_eq!(FunctionId::from_wire(2).unwrap(), FunctionId::Curtain);
    assert_eq!(FunctionId::Curtain.to_wire(), 2);
  }

  #[test]
  fn unknown_function_rejected() {
    for value in [0, 3, -1] {
      assert!(matches!(
        FunctionId::from_wire(value),
        Err(TypeError::UnknownFunction { value: v }) if v == value
      ));
    }
  }

  #[test]
  fn displays_lowercase_name() {
    assert_eq!(FunctionId::Curtain.to_string(), "curtain");
    assert_eq!(FunctionId::Slice.to_string(), "slice");
  }
}
