//! Thematic index entries: `(key, offset, count)` triples.

use std::cmp::Ordering;
use std::io::{Read, Seek};

use crate::error::Result;
use crate::index::key::{IndexKey, KeyType};
use crate::io::VpfReader;

/// One thematic index entry.
///
/// `offset` is a byte position in the companion data file, except when
/// `count == 0`: then `offset` is itself the single associated row value,
/// not a pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub key: IndexKey,
    pub offset: i32,
    pub count: i32,
}

impl IndexEntry {
    pub fn new(key: IndexKey, offset: i32, count: i32) -> Self {
        Self { key, offset, count }
    }

    /// Decode one entry: key per the declared type, then offset and count.
    pub fn read_from<R: Read + Seek>(
        reader: &mut VpfReader<R>,
        key_type: KeyType,
        element_count: usize,
    ) -> Result<Self> {
        let key = IndexKey::read_from(reader, key_type, element_count)?;
        let offset = reader.read_i32()?;
        let count = reader.read_i32()?;
        Ok(Self { key, offset, count })
    }
}

/// Compare a bare lookup key against an entry by projecting the entry's
/// embedded key. This is the comparator handed to binary search; the
/// ordering relation is defined on keys only.
pub fn compare_key(probe: &IndexKey, entry: &IndexEntry) -> Ordering {
    probe.compare(&entry.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Endian, VpfReader};
    use std::io::Cursor;

    #[test]
    fn test_read_entry_int_key() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&20i32.to_le_bytes());
        buf.extend_from_slice(&1024i32.to_le_bytes());
        buf.extend_from_slice(&2i32.to_le_bytes());

        let mut r = VpfReader::new(Cursor::new(buf), Endian::Little);
        let entry = IndexEntry::read_from(&mut r, KeyType::Int, 1).unwrap();
        assert_eq!(entry.key, IndexKey::Int(20));
        assert_eq!(entry.offset, 1024);
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn test_compare_key_projects_entry_key() {
        let entry = IndexEntry::new(IndexKey::Int(20), 0, 0);
        assert_eq!(compare_key(&IndexKey::Int(10), &entry), Ordering::Less);
        assert_eq!(compare_key(&IndexKey::Int(20), &entry), Ordering::Equal);
        assert_eq!(compare_key(&IndexKey::Int(30), &entry), Ordering::Greater);
    }

    #[test]
    fn test_entry_truncated() {
        // Key present, offset missing.
        let buf = 20i32.to_le_bytes().to_vec();
        let mut r = VpfReader::new(Cursor::new(buf), Endian::Little);
        let err = IndexEntry::read_from(&mut r, KeyType::Int, 1).unwrap_err();
        assert!(err.to_string().contains("Unexpected end of file"));
    }
}
