//! Length-prefixed list packing.
//!
//! The header carries per-attribute shapes and labels as flat lists, where
//! each group is written as its length followed by that many items:
//!
//! ```text
//! shapes  = [2, 5, 850,  1, 12]             → [[5, 850], [12]]
//! labels  = [2, "trace", "depth",  1, "t"]  → [["trace", "depth"], ["t"]]
//! ```
//!
//! An empty flat list unpacks to no groups. A count that runs past the end
//! of the list is an error, never a silent truncation.

use crate::error::TypeError;
use crate::header::LabelToken;

/// Split `flat` into groups, reading each group's length with `count_of`.
///
/// `count_of` receives the offset of the count token and the token
/// itself, and may reject the token.
fn unpack_groups<T, F>(flat: &[T], count_of: F) -> Result<Vec<Vec<T>>, TypeError>
where
  T: Clone,
  F: Fn(usize, &T) -> Result<u64, TypeError>,
{
  let mut groups = Vec::new();
  let mut offset = 0;

  while offset < flat.len() {
    let count = count_of(offset, &flat[offset])?;
    let remaining = flat.len() - offset - 1;
    let Some(len) = usize::try_from(count).ok().filter(|&len| len <= remaining) else {
      return Err(TypeError::PackedOverrun {
        offset,
        count,
        remaining,
      });
    };
    let start = offset + 1;
    groups.push(flat[start..start + len].to_vec());
    offset = start + len;
  }

  Ok(groups)
}

/// Unpack the header's flat shape list into one shape per attribute.
///
/// # Errors
///
/// [`TypeError::PackedOverrun`] if a count exceeds the values left.
pub fn unpack_shapes(flat: &[u64]) -> Result<Vec<Vec<u64>>, TypeError> {
  unpack_groups(flat, |_, &count| Ok(count))
}

/// Unpack the header's flat label list into one label group per
/// attribute.
///
/// Counts must be integers and group members must be strings.
///
/// # Errors
///
/// - [`TypeError::PackedOverrun`] if a count exceeds the tokens left.
/// - [`TypeError::LabelToken`] if a token has the wrong kind for its
///   position.
pub fn unpack_labels(flat: &[LabelToken]) -> Result<Vec<Vec<String>>, TypeError> {
  let groups = unpack_groups(flat, |offset, token| match token {
    LabelToken::Count(count) => Ok(*count),
    LabelToken::Label(_) => Err(TypeError::LabelToken { offset }),
  })?;

  let mut offset = 0;
  let mut labels = Vec::with_capacity(groups.len());
  for group in groups {
    let mut names = Vec::with_capacity(group.len());
    for (i, token) in group.into_iter().enumerate() {
      match token {
        LabelToken::Label(name) => names.push(name),
        LabelToken::Count(_) => return Err(TypeError::LabelToken { offset: offset + 1 + i }),
      }
    }
    offset += 1 + names.len();
    labels.push(names);
  }
  Ok(labels)
}

/// Inverse of [`unpack_shapes`].
#[must_use]
pub fn pack_shapes(shapes: &[Vec<u64>]) -> Vec<u64> {
  let mut flat = Vec::with_capacity(shapes.iter().map(|s| s.len() + 1).sum());
  for shape in shapes {
    flat.push(shape.len() as u64);
    flat.extend_from_slice(shape);
  }
  flat
}

/// Inverse of [`unpack_labels`].
#[must_use]
pub fn pack_labels(labels: &[Vec<String>]) -> Vec<LabelToken> {
  let mut flat = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
  for group in labels {
    flat.push(LabelToken::Count(group.len() as u64));
    flat.extend(group.iter().cloned().map(LabelToken::Label));
  }
  flat
}

/// Number of elements in a buffer of the given shape, or `None` on
/// overflow. The empty shape is a scalar and holds one element.
#[must_use]
pub fn element_count(shape: &[u64]) -> Option<u64> {
  shape.iter().try_fold(1u64, |acc, &dim| acc.checked_mul(dim))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unpack_two_shapes() {
    let shapes = unpack_shapes(&[2, 5, 850, 1, 12]).unwrap();
    assert_eq!(shapes, vec![vec![5, 850], vec![12]]);
  }

  #[test]
  fn unpack_empty_list() {
    assert!(unpack_shapes(&[]).unwrap().is_empty());
  }

  #[test]
  fn zero_count_yields_empty_group() {
    let shapes = unpack_shapes(&[0, 1, 7]).unwrap();
    assert_eq!(shapes, vec![vec![], vec![7]]);
  }

  #[test]
  fn count_overrun_is_error() {
    let err = unpack_shapes(&[2, 5, 850, 3, 1]).unwrap_err();
    assert!(matches!(
      err,
      TypeError::PackedOverrun {
        offset: 3,
        count: 3,
        remaining: 1
      }
    ));
  }

  #[test]
  fn huge_count_is_overrun() {
    let err = unpack_shapes(&[u64::MAX]).unwrap_err();
    assert!(matches!(err, TypeError::PackedOverrun { offset: 0, .. }));
  }

  #[test]
  fn pack_inverts_unpack() {
    let shapes = vec![vec![3, 4, 5], vec![], vec![9]];
    assert_eq!(unpack_shapes(&pack_shapes(&shapes)).unwrap(), shapes);
  }

  #[test]
  fn unpack_labels_groups() {
    let flat = vec![
      LabelToken::Count(2),
      LabelToken::Label("trace".into()),
      LabelToken::Label("depth".into()),
      LabelToken::Count(0),
    ];
    let labels = unpack_labels(&flat).unwrap();
    assert_eq!(labels, vec![vec!["trace".to_string(), "depth".to_string()], vec![]]);
  }

  #[test]
  fn label_where_count_expected() {
    let flat = vec![LabelToken::Label("x".into())];
    assert!(matches!(unpack_labels(&flat), Err(TypeError::LabelToken { offset: 0 })));
  }

  #[test]
  fn count_where_label_expected() {
    let flat = vec![
      LabelToken::Count(1),
      LabelToken::Label("a".into()),
      LabelToken::Count(2),
      LabelToken::Label("b".into()),
      LabelToken::Count(4),
    ];
    assert!(matches!(unpack_labels(&flat), Err(TypeError::LabelToken { offset: 4 })));
  }

  #[test]
  fn element_count_products() {
    assert_eq!(element_count(&[5, 850]), Some(4250));
    assert_eq!(element_count(&[]), Some(1));
    assert_eq!(element_count(&[0, 10]), Some(0));
    assert_eq!(element_count(&[u64::MAX, 2]), None);
  }
}
