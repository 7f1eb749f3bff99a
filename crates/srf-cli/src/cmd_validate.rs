/// Implementation of `srf validate`.
///
/// Runs a full decode and reports either a series of success checkmarks
/// (`✓`) or a diagnostic failure line (`✗`). The main dispatcher turns an
/// `Err` into exit code 1.
///
/// # Success output
///
/// ```text
/// ✓ Header: curtain, 1 attribute
/// ✓ Allocation: 4250 samples
/// ✓ Payload: 2 bundles routed
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: stream truncated while awaiting payload (1234 bytes received)
/// ```
use std::fs;

use anyhow::{Context, Result, anyhow};

use crate::ValidateArgs;
use crate::cmd_decode::decode_bytes;

/// Run the `srf validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    match decode_bytes(&bytes, None) {
        Ok(result) => {
            let header = result.header();
            let samples: usize = result.iter().map(|buffer| buffer.len()).sum();
            println!(
                "✓ Header: {}, {} attribute{}",
                header.function_id(),
                result.len(),
                if result.len() == 1 { "" } else { "s" }
            );
            println!("✓ Allocation: {samples} samples");
            println!(
                "✓ Payload: {} bundle{} routed",
                header.bundle_count(),
                if header.bundle_count() == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Err(e) => {
            println!("✗ Error: {e:#}");
            Err(anyhow!("validation failed"))
        }
    }
}
