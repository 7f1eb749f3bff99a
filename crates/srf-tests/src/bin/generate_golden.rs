//! Golden fixture generator for the SRF conformance test suite.
//!
//! This binary writes every fixture under `tests/golden/`. Run it after a
//! wire-format change to regenerate the committed payloads; the
//! conformance tests then pin the decoded result with inline snapshots.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_golden -p srf-tests
//! ```
//!
//! # Generated fixtures
//!
//! | Directory | Contents                                          |
//! |-----------|---------------------------------------------------|
//! | curtain   | `cube` [5, 850] curtain, two bundles, three runs  |
//! | slice     | `amp` [4, 6] slice, two bundles, three tiles      |

use std::path::Path;

use srf_tests::{amp_slice, cube_curtain, golden_path};

fn main() -> std::io::Result<()> {
    write_fixture(&golden_path("curtain"), &cube_curtain())?;
    write_fixture(&golden_path("slice"), &amp_slice())?;

    println!("All golden fixtures written.");
    Ok(())
}

fn write_fixture(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, payload)?;
    println!("  {} ({} bytes)", path.display(), payload.len());
    Ok(())
}
