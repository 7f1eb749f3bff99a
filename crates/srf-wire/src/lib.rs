#![warn(clippy::pedantic)]

pub mod envelope;
pub mod error;
pub mod msgpack;

pub use error::WireError;
