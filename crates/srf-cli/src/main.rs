//! SRF command-line tool: inspect, decode and validate seismic result
//! streams (`.srf` files holding one complete response).
//!
//! # Command overview
//!
//! ```text
//! srf <COMMAND> [OPTIONS]
//!
//! Commands:
//!   inspect    Print the header of a result stream
//!   decode     Decode every attribute and print per-attribute statistics
//!   validate   Check that a result stream decodes cleanly
//!   help       Print help information
//!
//! Global options:
//!   -v, --verbose    Log decoder progress to stderr (debug level)
//!   -h, --help       Print help
//!   -V, --version    Print version
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning                                 |
//! |------|-----------------------------------------|
//! | 0    | Success                                 |
//! | 1    | Error (I/O failure, invalid file, etc.) |
//!
//! All error details and logs are written to stderr so stdout can be piped
//! cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;

mod cmd_decode;
mod cmd_inspect;
mod cmd_validate;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// The SRF (seismic result format) command-line tool.
#[derive(Parser)]
#[command(name = "srf", version, about = "Seismic result stream CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder state transitions and allocations to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print the header of a result stream.
    Inspect(InspectArgs),
    /// Decode every attribute and print per-attribute statistics.
    Decode(DecodeArgs),
    /// Check that a result stream decodes cleanly.
    Validate(ValidateArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `srf inspect`.
///
/// Only the header is parsed, so a file with a damaged payload can still
/// be inspected.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the `.srf` file to inspect.
    pub file: PathBuf,
}

/// Arguments for `srf decode`.
///
/// ```text
/// ┌──────────────────┬───────────────────────────────────────────────────┐
/// │ Flag             │ Effect                                            │
/// ├──────────────────┼───────────────────────────────────────────────────┤
/// │ --json           │ Print a JSON document instead of a table          │
/// │ --chunk-size N   │ Feed the decoder N bytes at a time (default: the  │
/// │                  │ whole file in one chunk)                          │
/// └──────────────────┴───────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Path to the `.srf` file to decode.
    pub file: PathBuf,

    /// Emit JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Feed the file to the decoder in chunks of this many bytes.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,
}

/// Arguments for `srf validate`.
///
/// Runs a full decode. Exits with code 0 on success and code 1 on any
/// decode error.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the `.srf` file to validate.
    pub file: PathBuf,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Decode(args) => cmd_decode::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
