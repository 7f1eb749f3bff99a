#![warn(clippy::pedantic)]

pub mod error;
pub mod function;
pub mod shape;
pub mod header;
pub mod bundle;

pub use bundle::{Bundle, CurtainWire, SliceTile, SliceWire, TileWire, TraceRun};
pub use error::TypeError;
pub use function::FunctionId;
pub use header::{Header, LabelToken, RawHeader};
pub use shape::{element_count, pack_labels, pack_shapes, unpack_labels, unpack_shapes};
