//! Coordinate tuple string decoding.

pub mod tuple;

pub use tuple::{CoordinateTupleSet, Precision};
