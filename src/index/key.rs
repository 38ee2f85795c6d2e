//! Typed index keys and their total ordering.
//!
//! A thematic index declares one key type in its header and every entry's
//! key decodes as that type. Keys are modeled as a closed tagged union so
//! dispatch over the declared type is exhaustive at compile time, and
//! comparison is a single two-argument function usable by binary search.

use std::cmp::Ordering;
use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VpfError};
use crate::io::VpfReader;

// ── Key Type ───────────────────────────────────────────────────────

/// Declared key type of an index column (header field-type byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// `'I'`: 32-bit signed integer.
    Int,
    /// `'T'`: fixed-length text, width from the header's element count.
    Text,
    /// `'S'`: 16-bit signed integer.
    Short,
    /// `'F'`: 32-bit float.
    Float,
    /// `'R'`: 64-bit float.
    Double,
}

impl KeyType {
    /// Decode the header's field-type byte.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'I' => Ok(Self::Int),
            b'T' => Ok(Self::Text),
            b'S' => Ok(Self::Short),
            b'F' => Ok(Self::Float),
            b'R' => Ok(Self::Double),
            other => Err(VpfError::UnknownFieldType(other as char)),
        }
    }

    /// The on-disk marker byte for this key type.
    pub fn code(self) -> u8 {
        match self {
            Self::Int => b'I',
            Self::Text => b'T',
            Self::Short => b'S',
            Self::Float => b'F',
            Self::Double => b'R',
        }
    }
}

// ── Index Key ──────────────────────────────────────────────────────

/// A decoded index key value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IndexKey {
    Int(i32),
    Short(i16),
    Float(f32),
    Double(f64),
    Text(String),
}

impl IndexKey {
    /// Decode one key of the declared type. Text keys occupy
    /// `element_count` bytes and are trimmed of padding on both ends.
    pub fn read_from<R: Read + Seek>(
        reader: &mut VpfReader<R>,
        key_type: KeyType,
        element_count: usize,
    ) -> Result<Self> {
        match key_type {
            KeyType::Int => Ok(Self::Int(reader.read_i32()?)),
            KeyType::Short => Ok(Self::Short(reader.read_i16()?)),
            KeyType::Float => Ok(Self::Float(reader.read_f32()?)),
            KeyType::Double => Ok(Self::Double(reader.read_f64()?)),
            KeyType::Text => {
                let s = reader.read_fixed_string(element_count)?;
                Ok(Self::Text(s.trim().to_string()))
            }
        }
    }

    /// Which declared type this key carries.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Int(_) => KeyType::Int,
            Self::Short(_) => KeyType::Short,
            Self::Float(_) => KeyType::Float,
            Self::Double(_) => KeyType::Double,
            Self::Text(_) => KeyType::Text,
        }
    }

    /// Discriminant used only to keep cross-type comparison total.
    fn tag(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Short(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 3,
            Self::Text(_) => 4,
        }
    }

    /// Natural total order on keys: numeric types by value (floats via
    /// `total_cmp`), text lexicographic by code point. A well-formed index
    /// holds one key type throughout; mismatched variants fall back to
    /// tag order so the relation stays total.
    pub fn compare(&self, other: &IndexKey) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Short(a), Self::Short(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => a.tag().cmp(&b.tag()),
        }
    }
}
