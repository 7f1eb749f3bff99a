#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod parser;
pub mod registry;
pub mod result;
pub mod session;
pub mod streaming;

mod guard;

pub use config::DecoderConfig;
pub use error::{DecodeError, ReadError};
pub use parser::{ByteParser, Progress, ResponseParser};
pub use registry::{AttributeBuffer, OutputHandle, OutputRegistry};
pub use result::DecodeResult;
pub use session::{DecodeSession, Feed, SessionState};
pub use streaming::StreamingDecoder;
