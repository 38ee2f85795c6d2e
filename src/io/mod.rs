//! Byte-order-aware primitive reads over seekable streams.

pub mod reader;

pub use reader::{Endian, VpfReader};
