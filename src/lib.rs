//! VPFDB -- reader for VPF (Vector Product Format) binary index and
//! coordinate files.
//!
//! VPF is a military/government binary standard for geospatial vector
//! data. This crate decodes its index-layer structures directly from
//! byte streams, in either byte order:
//!
//! - [`ThematicIndex`] -- attribute-value index mapping distinct column
//!   values to row numbers (inverted list or bitmap), with binary-search
//!   point lookup.
//! - [`VariableLengthIndex`] -- compact offset/size table mapping record
//!   numbers to byte ranges in a companion data file.
//! - [`CoordinateTupleSet`] -- dense fixed-arity coordinate tuples in
//!   single or double precision.
//!
//! Indexes load fully into memory at construction and close their
//! stream; thematic lookups reopen the file lazily only to fetch
//! multi-row lists or bitmaps. The crate is read-only: nothing here
//! serializes back to bytes.

pub mod coord;
pub mod error;
pub mod index;
pub mod io;

pub use coord::{CoordinateTupleSet, Precision};
pub use error::{Result, VpfError};
pub use index::{
    compare_key, IndexEntry, IndexKey, IndexKind, KeyType, NullObserver, ReadObserver,
    ThematicIndex, ThematicIndexHeader, VariableLengthIndex,
};
pub use io::{Endian, VpfReader};
