/// Implementation of `srf inspect`.
///
/// Drives a bare [`ResponseParser`] just far enough to read the header, so
/// no output buffers are allocated and payload problems do not hide the
/// header.
///
/// # Output format
///
/// ```text
/// Function:   curtain
/// Pid:        "golden-curtain"
/// Dimensions: 3
/// Index:      [5, 1, 850]
/// Bundles:    2
/// Attribute 0: cube shape=[5, 850] labels=[trace, depth] (4250 samples)
/// ```
use std::fs;

use anyhow::{Context, Result, bail};
use srf_decoder::{ByteParser, DecoderConfig, OutputRegistry, Progress, ResponseParser};
use srf_types::{Header, element_count};

use crate::InspectArgs;

/// Run the `srf inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its header is
/// incomplete or invalid.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let header = read_header(&bytes)
        .with_context(|| format!("failed to read header of {}", args.file.display()))?;

    println!("Function:   {}", header.function_id());
    println!("Pid:        {:?}", header.pid());
    println!("Dimensions: {}", header.dimensionality());
    println!("Index:      {:?}", header.index());
    println!("Bundles:    {}", header.bundle_count());

    for (idx, ((name, shape), labels)) in header
        .attributes()
        .iter()
        .zip(header.shapes())
        .zip(header.labels())
        .enumerate()
    {
        let samples = element_count(shape).map_or_else(|| "overflowing".to_string(), |n| n.to_string());
        println!(
            "Attribute {idx}: {name} shape={shape:?} labels=[{}] ({samples} samples)",
            labels.join(", ")
        );
    }

    Ok(())
}

fn read_header(bytes: &[u8]) -> Result<Header> {
    let mut parser = ResponseParser::with_config(&DecoderConfig::default());
    parser.supply(bytes);

    match parser.advance(&mut OutputRegistry::default())? {
        Progress::HeaderReady => {}
        Progress::NeedsMoreInput => bail!("file ends before the header is complete"),
        Progress::Finished => bail!("stream finished without a header"),
    }

    let Some(raw) = parser.read_header() else {
        bail!("parser produced no header");
    };
    parser.release();
    Ok(Header::from_raw(raw)?)
}
