use std::ops::Range;

use serde_bytes::Bytes;

use crate::error::TypeError;
use crate::function::FunctionId;

const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// One tile of a slice bundle: `iterations` strided copies of `chunk_size`
/// samples each.
///
/// ```text
/// for i in 0..iterations:
///   dst[i * superstride + initial_skip ..][..chunk_size]
///     = src[i * substride ..][..chunk_size]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SliceTile<'a> {
  pub iterations: usize,
  pub chunk_size: usize,
  pub initial_skip: usize,
  pub superstride: usize,
  pub substride: usize,
  /// Little-endian `f32` samples.
  pub values: &'a [u8],
}

/// One run of a curtain bundle: every trace in `traces` receives the depth
/// samples `depths`, read sequentially from the bundle's value payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRun {
  pub traces: Range<usize>,
  pub depths: Range<usize>,
}

/// Tile slots as they travel: `iterations, chunk_size, initial_skip,
/// superstride, substride, values`.
pub type TileWire<'a> = (usize, usize, usize, usize, usize, &'a Bytes);

/// `[attribute, tiles]`
pub type SliceWire<'a> = (&'a str, Vec<TileWire<'a>>);

/// `[attribute, size, major, minor, values]`
pub type CurtainWire<'a> = (&'a str, usize, Vec<usize>, Vec<usize>, &'a Bytes);

/// A decoded payload bundle, borrowing its sample bytes from the stream
/// buffer.
///
/// The layout on the wire depends on the header's [`FunctionId`]:
///
/// ```text
/// slice   = [attribute: str, [[iterations, chunk_size, initial_skip,
///                              superstride, substride, values: bin], ...]]
/// curtain = [attribute: str, size, major: [int; 2*size],
///            minor: [int; 2*size], values: bin]
/// ```
///
/// In a curtain, run `n` covers traces `major[2n]..major[2n+1]` and depths
/// `minor[2n]..minor[2n+1]`.
///
/// [`SliceWire`] and [`CurtainWire`] are the serde forms of both layouts;
/// the encoder serializes the same tuples.
#[derive(Clone, Debug, PartialEq)]
pub enum Bundle<'a> {
  Slice {
    attribute: &'a str,
    tiles: Vec<SliceTile<'a>>,
  },
  Curtain {
    attribute: &'a str,
    runs: Vec<TraceRun>,
    values: &'a [u8],
  },
}

impl<'a> Bundle<'a> {
  /// Decode one bundle from a slice holding exactly one msgpack value.
  /// Names and sample bytes are borrowed from `bytes`.
  ///
  /// # Errors
  ///
  /// - [`TypeError::Bundle`] if the value does not have the layout the
  ///   function calls for.
  /// - [`TypeError::BundleArity`] if a curtain's range lists disagree with
  ///   its run count.
  /// - [`TypeError::InvertedRange`] for a curtain run with `last < first`.
  pub fn decode(function: FunctionId, bytes: &'a [u8]) -> Result<Self, TypeError> {
    match function {
      FunctionId::Slice => {
        let (attribute, tiles): SliceWire<'a> = rmp_serde::from_slice(bytes).map_err(TypeError::Bundle)?;
        let tiles = tiles
          .into_iter()
          .map(
            |(iterations, chunk_size, initial_skip, superstride, substride, values)| SliceTile {
              iterations,
              chunk_size,
              initial_skip,
              superstride,
              substride,
              values: values.as_ref(),
            },
          )
          .collect();
        Ok(Self::Slice { attribute, tiles })
      }
      FunctionId::Curtain => {
        let (attribute, size, major, minor, values): CurtainWire<'a> =
          rmp_serde::from_slice(bytes).map_err(TypeError::Bundle)?;
        let major = pairs("curtain major", size, &major)?;
        let minor = pairs("curtain minor", size, &minor)?;
        let runs = major
          .into_iter()
          .zip(minor)
          .map(|(traces, depths)| TraceRun { traces, depths })
          .collect();
        Ok(Self::Curtain {
          attribute,
          runs,
          values: values.as_ref(),
        })
      }
    }
  }

  #[must_use]
  pub fn attribute(&self) -> &'a str {
    match self {
      Self::Slice { attribute, .. } | Self::Curtain { attribute, .. } => attribute,
    }
  }

  /// Copy this bundle's samples into `dst`, the attribute's output buffer.
  /// `index` is the header's index; curtains read the depth axis length
  /// from `index[2]`.
  ///
  /// Returns the number of samples written. Every read and write is
  /// bounds-checked, so a hostile bundle cannot touch memory outside
  /// either buffer. On error `dst` may be partially written.
  ///
  /// # Errors
  ///
  /// [`TypeError::MisalignedValues`], [`TypeError::MissingDepthAxis`] or
  /// [`TypeError::BundleBounds`].
  pub fn scatter(&self, dst: &mut [f32], index: &[i64]) -> Result<usize, TypeError> {
    match self {
      Self::Slice { tiles, .. } => {
        let mut written = 0;
        for tile in tiles {
          written += scatter_tile(tile, dst)?;
        }
        Ok(written)
      }
      Self::Curtain { runs, values, .. } => {
        let zlen = index
          .get(2)
          .and_then(|&z| usize::try_from(z).ok())
          .ok_or(TypeError::MissingDepthAxis {
            index_len: index.len(),
          })?;
        scatter_runs(runs, values, zlen, dst)
      }
    }
  }
}

/// Split a flat `[first, last, first, last, ...]` list into `size` ranges.
fn pairs(what: &'static str, size: usize, flat: &[usize]) -> Result<Vec<Range<usize>>, TypeError> {
  let expected = size.saturating_mul(2);
  if flat.len() != expected {
    return Err(TypeError::BundleArity {
      what,
      expected,
      found: flat.len(),
    });
  }
  flat
    .chunks_exact(2)
    .map(|pair| {
      let (start, end) = (pair[0], pair[1]);
      if end < start {
        return Err(TypeError::InvertedRange { start, end });
      }
      Ok(start..end)
    })
    .collect()
}

fn sample_count(values: &[u8]) -> Result<usize, TypeError> {
  if values.len() % SAMPLE_SIZE == 0 {
    Ok(values.len() / SAMPLE_SIZE)
  } else {
    Err(TypeError::MisalignedValues { len: values.len() })
  }
}

/// `start..start + len`, checked against `capacity`.
fn bounded(side: &'static str, start: usize, len: usize, capacity: usize) -> Result<Range<usize>, TypeError> {
  match start.checked_add(len) {
    Some(end) if end <= capacity => Ok(start..end),
    end => Err(TypeError::BundleBounds {
      side,
      end: end.unwrap_or(usize::MAX),
      capacity,
    }),
  }
}

fn copy_samples(src: &[u8], dst: &mut [f32]) {
  for (out, bytes) in dst.iter_mut().zip(src.chunks_exact(SAMPLE_SIZE)) {
    *out = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
  }
}

fn scatter_tile(tile: &SliceTile<'_>, dst: &mut [f32]) -> Result<usize, TypeError> {
  let available = sample_count(tile.values)?;
  if tile.chunk_size == 0 {
    return Ok(0);
  }
  // every iteration reads chunk_size samples, so the payload caps the loop
  if tile.iterations > available / tile.chunk_size {
    return Err(TypeError::BundleBounds {
      side: "source",
      end: tile.iterations.saturating_mul(tile.chunk_size),
      capacity: available,
    });
  }

  for i in 0..tile.iterations {
    let src_start = i.checked_mul(tile.substride).unwrap_or(usize::MAX);
    let dst_start = i
      .checked_mul(tile.superstride)
      .and_then(|offset| offset.checked_add(tile.initial_skip))
      .unwrap_or(usize::MAX);

    let src = bounded("source", src_start, tile.chunk_size, available)?;
    let dst_range = bounded("destination", dst_start, tile.chunk_size, dst.len())?;
    copy_samples(
      &tile.values[src.start * SAMPLE_SIZE..src.end * SAMPLE_SIZE],
      &mut dst[dst_range],
    );
  }
  Ok(tile.iterations.saturating_mul(tile.chunk_size))
}

fn scatter_runs(runs: &[TraceRun], values: &[u8], zlen: usize, dst: &mut [f32]) -> Result<usize, TypeError> {
  let available = sample_count(values)?;
  let mut cursor = 0;

  for run in runs {
    let chunk = run.depths.len();
    if run.depths.end > zlen {
      return Err(TypeError::BundleBounds {
        side: "depth",
        end: run.depths.end,
        capacity: zlen,
      });
    }
    if chunk == 0 {
      continue;
    }

    for trace in run.traces.clone() {
      let dst_start = trace
        .checked_mul(zlen)
        .and_then(|offset| offset.checked_add(run.depths.start))
        .unwrap_or(usize::MAX);

      let src = bounded("source", cursor, chunk, available)?;
      let dst_range = bounded("destination", dst_start, chunk, dst.len())?;
      copy_samples(
        &values[src.start * SAMPLE_SIZE..src.end * SAMPLE_SIZE],
        &mut dst[dst_range],
      );
      cursor = src.end;
    }
  }

  Ok(cursor)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
  }

  /// A slice bundle for `amp` in which every tile carries `values`.
  fn slice_bytes(tiles: &[[usize; 5]], values: &[f32]) -> Vec<u8> {
    let payload = le(values);
    let wire: SliceWire<'_> = (
      "amp",
      tiles
        .iter()
        .map(|t| (t[0], t[1], t[2], t[3], t[4], Bytes::new(&payload)))
        .collect(),
    );
    rmp_serde::to_vec(&wire).unwrap()
  }

  fn curtain_bytes(major: &[usize], minor: &[usize], values: &[f32]) -> Vec<u8> {
    let payload = le(values);
    let wire: CurtainWire<'_> = ("cube", major.len() / 2, major.to_vec(), minor.to_vec(), Bytes::new(&payload));
    rmp_serde::to_vec(&wire).unwrap()
  }

  #[test]
  fn slice_tile_strides_into_destination() {
    // two rows of two samples, placed at columns 1..3 of a 2x4 grid
    let bytes = slice_bytes(&[[2, 2, 1, 4, 2]], &[1.0, 2.0, 3.0, 4.0]);
    let bundle = Bundle::decode(FunctionId::Slice, &bytes).unwrap();
    assert_eq!(bundle.attribute(), "amp");

    let mut dst = vec![0.0; 8];
    assert_eq!(bundle.scatter(&mut dst, &[]).unwrap(), 4);
    assert_eq!(dst, vec![0.0, 1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0]);
  }

  #[test]
  fn values_are_borrowed_from_the_input() {
    let bytes = slice_bytes(&[[1, 1, 0, 0, 0]], &[9.0]);
    let Bundle::Slice { tiles, .. } = Bundle::decode(FunctionId::Slice, &bytes).unwrap() else {
      panic!("expected a slice bundle");
    };
    let range = bytes.as_ptr_range();
    assert!(range.contains(&tiles[0].values.as_ptr()));
  }

  #[test]
  fn curtain_runs_fill_traces() {
    // traces 0..2 get depths 1..3 of a zlen=4 volume
    let bytes = curtain_bytes(&[0, 2], &[1, 3], &[1.0, 2.0, 3.0, 4.0]);
    let bundle = Bundle::decode(FunctionId::Curtain, &bytes).unwrap();
    assert_eq!(bundle.attribute(), "cube");

    let mut dst = vec![0.0; 8];
    assert_eq!(bundle.scatter(&mut dst, &[2, 1, 4]).unwrap(), 4);
    assert_eq!(dst, vec![0.0, 1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0]);
  }

  #[test]
  fn curtain_needs_depth_axis() {
    let bytes = curtain_bytes(&[0, 1], &[0, 1], &[1.0]);
    let bundle = Bundle::decode(FunctionId::Curtain, &bytes).unwrap();
    let mut dst = vec![0.0; 4];
    assert!(matches!(
      bundle.scatter(&mut dst, &[1, 1]),
      Err(TypeError::MissingDepthAxis { index_len: 2 })
    ));
  }

  #[test]
  fn curtain_source_overrun() {
    // claims 2 traces x 2 depths but carries only 3 samples
    let bytes = curtain_bytes(&[0, 2], &[0, 2], &[1.0, 2.0, 3.0]);
    let bundle = Bundle::decode(FunctionId::Curtain, &bytes).unwrap();
    let mut dst = vec![0.0; 4];
    assert!(matches!(
      bundle.scatter(&mut dst, &[2, 1, 2]),
      Err(TypeError::BundleBounds { side: "source", end: 4, capacity: 3 })
    ));
  }

  #[test]
  fn slice_destination_overrun() {
    let bytes = slice_bytes(&[[1, 2, 3, 0, 0]], &[1.0, 2.0]);
    let bundle = Bundle::decode(FunctionId::Slice, &bytes).unwrap();
    let mut dst = vec![0.0; 4];
    assert!(matches!(
      bundle.scatter(&mut dst, &[]),
      Err(TypeError::BundleBounds {
        side: "destination",
        end: 5,
        capacity: 4
      })
    ));
  }

  #[test]
  fn empty_tile_is_skipped_whatever_its_iterations() {
    let bytes = slice_bytes(&[[usize::MAX, 0, 0, usize::MAX, usize::MAX]], &[]);
    let bundle = Bundle::decode(FunctionId::Slice, &bytes).unwrap();
    let mut dst = vec![0.0; 4];
    assert_eq!(bundle.scatter(&mut dst, &[]).unwrap(), 0);
    assert_eq!(dst, vec![0.0; 4]);
  }

  #[test]
  fn tile_iterations_capped_by_payload() {
    // substride 0 would otherwise re-read the same two samples forever
    let bytes = slice_bytes(&[[usize::MAX, 1, 0, 0, 0]], &[1.0, 2.0]);
    let bundle = Bundle::decode(FunctionId::Slice, &bytes).unwrap();
    let mut dst = vec![0.0; 4];
    assert!(matches!(
      bundle.scatter(&mut dst, &[]),
      Err(TypeError::BundleBounds {
        side: "source",
        end: usize::MAX,
        capacity: 2
      })
    ));
  }

  #[test]
  fn empty_depth_run_is_skipped_whatever_its_traces() {
    let bytes = curtain_bytes(&[0, usize::MAX], &[0, 0], &[]);
    let bundle = Bundle::decode(FunctionId::Curtain, &bytes).unwrap();
    let mut dst = vec![0.0; 1];
    assert_eq!(bundle.scatter(&mut dst, &[1, 1, 0]).unwrap(), 0);
  }

  #[test]
  fn inverted_run_rejected() {
    let bytes = curtain_bytes(&[3, 1], &[0, 1], &[]);
    assert!(matches!(
      Bundle::decode(FunctionId::Curtain, &bytes),
      Err(TypeError::InvertedRange { start: 3, end: 1 })
    ));
  }

  #[test]
  fn range_lists_must_match_run_count() {
    let payload = le(&[1.0]);
    let wire: CurtainWire<'_> = ("cube", 2, vec![0, 1], vec![0, 1], Bytes::new(&payload));
    let bytes = rmp_serde::to_vec(&wire).unwrap();
    assert!(matches!(
      Bundle::decode(FunctionId::Curtain, &bytes),
      Err(TypeError::BundleArity {
        what: "curtain major",
        expected: 4,
        found: 2
      })
    ));
  }

  #[test]
  fn curtain_read_as_slice() {
    let bytes = curtain_bytes(&[0, 1], &[0, 1], &[1.0]);
    assert!(matches!(
      Bundle::decode(FunctionId::Slice, &bytes),
      Err(TypeError::Bundle(_))
    ));
  }

  #[test]
  fn misaligned_values() {
    let wire: CurtainWire<'_> = ("cube", 0, Vec::new(), Vec::new(), Bytes::new(&[0, 0, 0]));
    let bytes = rmp_serde::to_vec(&wire).unwrap();

    let bundle = Bundle::decode(FunctionId::Curtain, &bytes).unwrap();
    let mut dst = vec![0.0; 1];
    assert!(matches!(
      bundle.scatter(&mut dst, &[1, 1, 1]),
      Err(TypeError::MisalignedValues { len: 3 })
    ));
  }
}
