//! Variable-length record index reader.
//!
//! A variable-length index (`.vdx`-family file) maps 1-based record
//! numbers to `(offset, size)` byte ranges in a companion data file.
//!
//! # File layout (either byte order)
//!
//! ```text
//! [record_count: i32]
//! [header_len: i32]            // read, not otherwise validated
//! [(offset: i32, size: i32) x record_count]
//! ```
//!
//! The whole table is loaded at construction and the stream is closed;
//! lookups never touch the file again.

use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{Result, VpfError};
use crate::io::{Endian, VpfReader};

/// In-memory variable-length record index.
///
/// Record numbers are 1-based. A record number past the end resolves to
/// the end-of-file sentinel `(last_offset + last_size, 0)`, an empty
/// terminal record, not an error.
#[derive(Debug, Clone)]
pub struct VariableLengthIndex {
    /// (offset, size) per record, in file order.
    records: Vec<(i32, i32)>,
    /// Derived sentinel: one byte past the last record's data.
    eof_offset: i32,
}

impl VariableLengthIndex {
    /// Load the index from a file.
    pub fn open(path: &Path, endian: Endian) -> Result<Self> {
        let reader = VpfReader::open(path, endian)?;
        Self::from_reader(reader)
    }

    /// Load the index from an already-open reader, consuming it.
    pub fn from_reader<R: Read + Seek>(mut reader: VpfReader<R>) -> Result<Self> {
        let record_count = reader.read_i32()?;
        let _header_len = reader.read_i32()?;

        if record_count < 0 {
            return Err(VpfError::InvalidFormat(format!(
                "Negative record count in variable-length index: {}",
                record_count
            )));
        }

        let mut records = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            let offset = reader.read_i32()?;
            let size = reader.read_i32()?;
            records.push((offset, size));
        }

        let eof_offset = records
            .last()
            .map(|&(offset, size)| offset + size)
            .unwrap_or(0);

        Ok(Self {
            records,
            eof_offset,
        })
    }

    /// Byte offset of record `n` (1-based). Out-of-range record numbers
    /// resolve to the end-of-file sentinel offset.
    pub fn record_offset(&self, n: usize) -> i32 {
        if n == 0 || n > self.records.len() {
            return self.eof_offset;
        }
        self.records[n - 1].0
    }

    /// Byte size of record `n` (1-based). Out-of-range record numbers
    /// resolve to the empty terminal record (size 0).
    pub fn record_size(&self, n: usize) -> i32 {
        if n == 0 || n > self.records.len() {
            return 0;
        }
        self.records[n - 1].1
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The derived end-of-file sentinel offset.
    pub fn eof_offset(&self) -> i32 {
        self.eof_offset
    }
}
