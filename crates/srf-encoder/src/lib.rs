#![warn(clippy::pedantic)]

pub mod error;
pub mod encoder;

pub use encoder::{CurtainRun, ResponseEncoder, Tile};
pub use error::EncodeError;
