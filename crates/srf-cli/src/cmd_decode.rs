/// Implementation of `srf decode`.
///
/// Feeds the file through a [`DecodeSession`], either whole or in fixed
/// size chunks, and prints statistics for every attribute.
///
/// # Output format
///
/// ```text
/// curtain pid="golden-curtain" ndims=3 bundles=2 | cube [5, 850] [trace, depth]
/// cube     shape=[5, 850]  len=4250  min=-1.499000  max=0.050000  sum=-1.589000
/// ```
///
/// With `--json` the same information is printed as one JSON document.
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use srf_decoder::{AttributeBuffer, DecodeResult, DecodeSession, Feed};
use srf_types::Header;

use crate::DecodeArgs;

#[derive(Serialize)]
struct Report<'a> {
    header: &'a Header,
    attributes: Vec<AttributeStats<'a>>,
}

#[derive(Serialize)]
struct AttributeStats<'a> {
    name: &'a str,
    shape: &'a [u64],
    len: usize,
    min: f32,
    max: f32,
    sum: f64,
}

impl<'a> AttributeStats<'a> {
    fn of(buffer: &'a AttributeBuffer) -> Self {
        let data = buffer.data();
        Self {
            name: buffer.name(),
            shape: buffer.shape(),
            len: data.len(),
            min: data.iter().copied().fold(f32::INFINITY, f32::min),
            max: data.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            sum: data.iter().map(|&v| f64::from(v)).sum(),
        }
    }
}

/// Feed `bytes` to a fresh session in chunks of `chunk_size` (or whole),
/// then signal end of input if the stream has not completed.
pub fn decode_bytes(bytes: &[u8], chunk_size: Option<usize>) -> Result<Arc<DecodeResult>> {
    let mut session = DecodeSession::new();
    let step = chunk_size.unwrap_or(bytes.len()).max(1);

    for chunk in bytes.chunks(step) {
        if let Feed::Ready(result) = session.feed(Some(chunk))? {
            return Ok(result);
        }
    }
    match session.feed(None)? {
        Feed::Ready(result) => Ok(result),
        Feed::Pending => bail!("decoder still pending after end of input"),
    }
}

/// Run the `srf decode` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to decode.
pub fn run(args: &DecodeArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let chunk_size = args
        .chunk_size
        .map(usize::try_from)
        .transpose()
        .context("chunk size does not fit in memory")?;
    let result = decode_bytes(&bytes, chunk_size)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    let stats: Vec<_> = result.iter().map(AttributeStats::of).collect();

    if args.json {
        let report = Report {
            header: result.header(),
            attributes: stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", result.header());
    for s in &stats {
        println!(
            "{:<8} shape={:?}  len={}  min={:.6}  max={:.6}  sum={:.6}",
            s.name, s.shape, s.len, s.min, s.max, s.sum
        );
    }
    Ok(())
}
