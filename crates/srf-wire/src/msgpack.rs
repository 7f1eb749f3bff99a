use crate::error::WireError;

// Nothing is *interpreted* here beyond array headers: the tokenizer only
// knows the extent of every tag, so complete values can be framed and handed
// to rmp-serde while partial ones stay buffered.

/// How a tag byte lays out the bytes that follow it.
///
/// ```text
/// ┌────────┬──────────────────────────────────────────────────────────┐
/// │ Fixed  │ tag (+ ext type) then a payload of known size            │
/// │ Bytes  │ tag, big-endian length of `width` bytes, `extra` bytes,  │
/// │        │ then `length` payload bytes (str, bin, ext)              │
/// │ Items  │ tag, big-endian count of `width` bytes, then `count *    │
/// │        │ per_entry` nested values (array = 1, map = 2)            │
/// └────────┴──────────────────────────────────────────────────────────┘
/// ```
enum Layout {
    Fixed { head: usize, payload: u64, children: u64 },
    Bytes { width: usize, extra: usize },
    Items { width: usize, per_entry: u64 },
}

fn layout(tag: u8, offset: usize) -> Result<Layout, WireError> {
    let fixed = |head: usize, payload: u64| Layout::Fixed {
        head,
        payload,
        children: 0,
    };

    Ok(match tag {
        0x00..=0x7F | 0xC0 | 0xC2 | 0xC3 | 0xE0..=0xFF => fixed(1, 0),
        0x80..=0x8F => Layout::Fixed {
            head: 1,
            payload: 0,
            children: 2 * u64::from(tag & 0x0F),
        },
        0x90..=0x9F => Layout::Fixed {
            head: 1,
            payload: 0,
            children: u64::from(tag & 0x0F),
        },
        0xA0..=0xBF => fixed(1, u64::from(tag & 0x1F)),
        0xC1 => return Err(WireError::ReservedTag { found: tag, offset }),
        0xC4 | 0xD9 => Layout::Bytes { width: 1, extra: 0 },
        0xC5 | 0xDA => Layout::Bytes { width: 2, extra: 0 },
        0xC6 | 0xDB => Layout::Bytes { width: 4, extra: 0 },
        0xC7 => Layout::Bytes { width: 1, extra: 1 },
        0xC8 => Layout::Bytes { width: 2, extra: 1 },
        0xC9 => Layout::Bytes { width: 4, extra: 1 },
        0xCA => fixed(1, 4),
        0xCB => fixed(1, 8),
        0xCC | 0xD0 => fixed(1, 1),
        0xCD | 0xD1 => fixed(1, 2),
        0xCE | 0xD2 => fixed(1, 4),
        0xCF | 0xD3 => fixed(1, 8),
        0xD4 => fixed(2, 1),
        0xD5 => fixed(2, 2),
        0xD6 => fixed(2, 4),
        0xD7 => fixed(2, 8),
        0xD8 => fixed(2, 16),
        0xDC => Layout::Items {
            width: 2,
            per_entry: 1,
        },
        0xDD => Layout::Items {
            width: 4,
            per_entry: 1,
        },
        0xDE => Layout::Items {
            width: 2,
            per_entry: 2,
        },
        0xDF => Layout::Items {
            width: 4,
            per_entry: 2,
        },
    })
}

/// Read a `width`-byte big-endian length at `at`, or `None` if the slice
/// is too short.
fn read_be(buf: &[u8], at: usize, width: usize) -> Option<u64> {
    let bytes = buf.get(at..at.checked_add(width)?)?;
    Some(bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Measure the complete msgpack value at the start of `buf`.
///
/// This is the resumable primitive the streaming parser is built on: it
/// never consumes anything, it only answers "does `buf` hold a whole
/// value yet, and if so how many bytes is it?".
///
/// # Returns
///
/// - `Ok(Some(len))`: the first `len` bytes are one complete value
///   (containers included, recursively).
/// - `Ok(None)`: the value is cut off; buffer more bytes and retry.
///
/// # Errors
///
/// - [`WireError::ReservedTag`] on the never-assigned 0xC1 tag.
/// - [`WireError::IntegerOutOfRange`] if a declared length cannot be
///   represented as a buffer offset.
pub fn object_len(buf: &[u8]) -> Result<Option<usize>, WireError> {
    let mut pos = 0usize;
    let mut pending: u64 = 1;

    while pending > 0 {
        let Some(&tag) = buf.get(pos) else {
            return Ok(None);
        };
        pending -= 1;

        let (head, payload, children) = match layout(tag, pos)? {
            Layout::Fixed {
                head,
                payload,
                children,
            } => (head, payload, children),
            Layout::Bytes { width, extra } => {
                let Some(len) = read_be(buf, pos + 1, width) else {
                    return Ok(None);
                };
                (1 + width + extra, len, 0)
            }
            Layout::Items { width, per_entry } => {
                let Some(count) = read_be(buf, pos + 1, width) else {
                    return Ok(None);
                };
                (1 + width, 0, count * per_entry)
            }
        };

        let end = usize::try_from(payload)
            .ok()
            .and_then(|payload| pos.checked_add(head)?.checked_add(payload))
            .ok_or(WireError::IntegerOutOfRange { offset: pos })?;
        if end > buf.len() {
            return Ok(None);
        }

        pos = end;
        pending = pending.saturating_add(children);
    }

    Ok(Some(pos))
}

/// Peek an array header at the start of `buf`.
///
/// Returns `Ok(Some((count, header_len)))` when the full array header is
/// present, `Ok(None)` when more bytes are needed. The array's items are
/// *not* inspected, which is what lets the parser treat the envelope and
/// the bundle list as headers and stream their items one by one.
///
/// # Errors
///
/// [`WireError::UnexpectedTag`] if the first byte is not an array tag.
pub fn peek_array_len(buf: &[u8]) -> Result<Option<(u64, usize)>, WireError> {
    let Some(&tag) = buf.first() else {
        return Ok(None);
    };

    let width = match tag {
        0x90..=0x9F => return Ok(Some((u64::from(tag & 0x0F), 1))),
        0xDC => 2,
        0xDD => 4,
        found => {
            return Err(WireError::UnexpectedTag {
                expected: "array",
                found,
                offset: 0,
            });
        }
    };

    Ok(read_be(buf, 1, width).map(|count| (count, 1 + width)))
}
