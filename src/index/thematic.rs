//! Thematic (attribute-value) index reader.
//!
//! A thematic index maps distinct values of one table column to the row
//! numbers carrying that value, either as an inverted list or as a packed
//! bitmap. The header and all `(key, offset, count)` entries are loaded
//! once at construction and the stream is closed; the file is reopened
//! lazily only to fetch multi-row lists or bitmaps on a lookup hit.
//!
//! # File layout (either byte order)
//!
//! ```text
//! Offset  Size  Field
//! 0       4     header_len: i32
//! 4       4     code_count: i32
//! 8       4     row_count: i32
//! 12      1     index_kind: 'T' | 'I' | 'B' | 'G'
//! 13      1     field_type: 'I' | 'T' | 'S' | 'F' | 'R'
//! 14      4     element_count: i32 (text key width)
//! 18      1     data_type: 'S' | 'I' (row-number width)
//! 19      12    table_indexed (padded ASCII)
//! 31      25    column_indexed (padded ASCII)
//! 56      1     sorted_flag ('S' = sorted; honored only for non-legacy)
//! 57      3     reserved
//! 60      -     entries: (key, offset: i32, count: i32) x code_count
//! ```
//!
//! Row lists and bitmaps referenced by entry offsets live in the same
//! file, past the entry section.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VpfError};
use crate::index::entry::{compare_key, IndexEntry};
use crate::index::key::{IndexKey, KeyType};
use crate::index::observer::{NullObserver, ReadObserver};
use crate::io::{Endian, VpfReader};

// ── Constants ──────────────────────────────────────────────────────

/// Absolute offset where the entry section begins. Bytes between the
/// last header field and this offset are reserved padding.
pub const ENTRY_SECTION_OFFSET: u64 = 60;

/// Sorted-flag byte meaning the entry section is already key-sorted.
pub const SORTED_FLAG: u8 = b'S';

/// Rows packed per bitmap word.
const BITMAP_WORD_BITS: usize = 16;

// ── Index Kind ─────────────────────────────────────────────────────

/// Index kind marker (header byte 12).
///
/// `Thematic`/`Inverted` carry explicit row lists; `Bitmap`/`Gazetteer`
/// carry one membership bit per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// `'T'`: inverted-list index.
    Thematic,
    /// `'I'`: inverted-list index.
    Inverted,
    /// `'B'`: bitmap index.
    Bitmap,
    /// `'G'`: gazetteer bitmap index.
    Gazetteer,
}

impl IndexKind {
    /// Decode the header's index-kind byte.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'T' => Ok(Self::Thematic),
            b'I' => Ok(Self::Inverted),
            b'B' => Ok(Self::Bitmap),
            b'G' => Ok(Self::Gazetteer),
            other => Err(VpfError::UnknownIndexKind(other as char)),
        }
    }

    /// The on-disk marker byte for this kind.
    pub fn code(self) -> u8 {
        match self {
            Self::Thematic => b'T',
            Self::Inverted => b'I',
            Self::Bitmap => b'B',
            Self::Gazetteer => b'G',
        }
    }

    /// True for the bitmap kinds.
    pub fn is_bitmap(self) -> bool {
        matches!(self, Self::Bitmap | Self::Gazetteer)
    }
}

// ── Header ─────────────────────────────────────────────────────────

/// Decoded thematic index header. Read exactly once, in fixed order,
/// at construction; immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct ThematicIndexHeader {
    /// Declared header byte length (read, not otherwise validated).
    pub header_len: i32,
    /// Number of distinct indexed values (index entries).
    pub code_count: i32,
    /// Number of rows in the indexed table.
    pub row_count: i32,
    /// Inverted-list or bitmap kind.
    pub index_kind: IndexKind,
    /// Key type of the indexed column.
    pub field_type: KeyType,
    /// Element count of the indexed column (text key width).
    pub element_count: i32,
    /// Row-number width specifier (`'S'` or `'I'`), validated lazily at
    /// fetch time.
    pub data_type: char,
    /// Indexed table name, trimmed and lowercased.
    pub table_indexed: String,
    /// Indexed column name, trimmed and lowercased.
    pub column_indexed: String,
    /// Whether the entry section is already key-sorted. Legacy-format
    /// files carry no meaningful flag and are always treated as unsorted.
    pub sorted: bool,
}

impl ThematicIndexHeader {
    /// Read the fixed-layout header and seek past the reserved padding
    /// to the entry section.
    pub fn read_from<R: Read + Seek>(reader: &mut VpfReader<R>, legacy: bool) -> Result<Self> {
        let header_len = reader.read_i32()?;
        let code_count = reader.read_i32()?;
        let row_count = reader.read_i32()?;
        let index_kind = IndexKind::from_code(reader.read_byte()?)?;
        let field_type = KeyType::from_code(reader.read_byte()?)?;
        let element_count = reader.read_i32()?;
        let data_type = reader.read_byte()? as char;
        let table_indexed = reader.read_fixed_string(12)?.trim().to_lowercase();
        let column_indexed = reader.read_fixed_string(25)?.trim().to_lowercase();
        let sorted_flag = reader.read_byte()?;
        let sorted = !legacy && sorted_flag == SORTED_FLAG;

        if code_count < 0 || row_count < 0 {
            return Err(VpfError::InvalidFormat(format!(
                "Negative count in thematic index header: codes={}, rows={}",
                code_count, row_count
            )));
        }

        if header_len != ENTRY_SECTION_OFFSET as i32 {
            tracing::debug!(
                header_len,
                "Declared header length differs from fixed entry section offset"
            );
        }

        reader.seek(ENTRY_SECTION_OFFSET)?;

        Ok(Self {
            header_len,
            code_count,
            row_count,
            index_kind,
            field_type,
            element_count,
            data_type,
            table_indexed,
            column_indexed,
            sorted,
        })
    }
}

// ── Thematic Index ─────────────────────────────────────────────────

/// Memory-resident thematic index over one column of one VPF table.
///
/// Entries are sorted at construction (unless the file declares itself
/// sorted) and immutable afterwards, so concurrent lookups are
/// order-independent. The only shared mutable state is the lazily
/// reopened file handle, guarded by a single mutex so interleaved
/// reopen/seek/read sequences from different threads cannot corrupt
/// each other's fetches.
pub struct ThematicIndex {
    path: PathBuf,
    endian: Endian,
    header: ThematicIndexHeader,
    entries: Vec<IndexEntry>,
    handle: Mutex<Option<VpfReader<File>>>,
    observer: Arc<dyn ReadObserver>,
}

impl std::fmt::Debug for ThematicIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThematicIndex")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ThematicIndex {
    /// Open and fully load a thematic index file.
    ///
    /// `legacy` marks pre-revision VPF files whose sorted flag is not
    /// meaningful; their entries are always sorted in memory.
    pub fn open(path: &Path, endian: Endian, legacy: bool) -> Result<Self> {
        Self::with_observer(path, endian, legacy, Arc::new(NullObserver))
    }

    /// Like [`open`](Self::open), with a decode observer installed.
    pub fn with_observer(
        path: &Path,
        endian: Endian,
        legacy: bool,
        observer: Arc<dyn ReadObserver>,
    ) -> Result<Self> {
        let mut reader = VpfReader::open(path, endian)?;

        let header = ThematicIndexHeader::read_from(&mut reader, legacy)?;
        observer.header_loaded(header.code_count as usize, header.row_count as usize);

        let mut entries = Vec::with_capacity(header.code_count as usize);
        for _ in 0..header.code_count {
            entries.push(IndexEntry::read_from(
                &mut reader,
                header.field_type,
                header.element_count.max(0) as usize,
            )?);
        }

        if !header.sorted {
            entries.sort_by(|a, b| a.key.compare(&b.key));
        }
        observer.entries_loaded(entries.len());

        // Entries are memory-resident; the stream is reopened lazily only
        // for row-list and bitmap fetches.
        drop(reader);

        Ok(Self {
            path: path.to_path_buf(),
            endian,
            header,
            entries,
            handle: Mutex::new(None),
            observer,
        })
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Look up the rows associated with `probe`.
    ///
    /// Returns an empty vector when the key is absent (a miss is not an
    /// error). On a hit, inverted-list entries with `count == 0` yield
    /// the entry offset itself as the single row; otherwise the row list
    /// or bitmap is fetched from the file. A fetch error surfaces to
    /// this call only; the in-memory index stays usable.
    pub fn get(&self, probe: &IndexKey) -> Result<Vec<i32>> {
        // binary_search_by wants entry-vs-probe ordering.
        let found = self
            .entries
            .binary_search_by(|entry| compare_key(probe, entry).reverse());

        let entry = match found {
            Ok(i) => &self.entries[i],
            Err(_) => return Ok(Vec::new()),
        };

        if self.header.index_kind.is_bitmap() {
            self.fetch_bitmap(entry.offset)
        } else if entry.count == 0 {
            // The offset is itself the single associated row value.
            Ok(vec![entry.offset])
        } else {
            self.fetch_row_list(entry.offset, entry.count)
        }
    }

    /// Fetch an explicit row-number list from the data section.
    fn fetch_row_list(&self, offset: i32, count: i32) -> Result<Vec<i32>> {
        if count < 0 {
            tracing::warn!(
                count,
                table = self.header.table_indexed.as_str(),
                "Negative row count in index entry, treating as empty"
            );
            return Ok(Vec::new());
        }

        let mut guard = self.handle.lock().unwrap();
        let reader = Self::acquire(&mut guard, &self.path, self.endian, offset as u64)?;

        let mut rows = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let row = match self.header.data_type {
                'S' => i32::from(reader.read_i16()?),
                'I' => reader.read_i32()?,
                other => return Err(VpfError::UnknownDataType(other)),
            };
            rows.push(row);
        }

        self.observer.rows_fetched(offset as u64, rows.len());
        Ok(rows)
    }

    /// Fetch and unpack a row bitmap: `ceil(row_count / 16)` words, bit 0
    /// of each word naming the next sequential row. Rows are 1-based.
    fn fetch_bitmap(&self, offset: i32) -> Result<Vec<i32>> {
        let row_count = self.header.row_count as usize;
        let words = row_count.div_ceil(BITMAP_WORD_BITS);

        let mut guard = self.handle.lock().unwrap();
        let reader = Self::acquire(&mut guard, &self.path, self.endian, offset as u64)?;

        let mut rows = Vec::new();
        for word_index in 0..words {
            let word = reader.read_u16()?;
            for bit in 0..BITMAP_WORD_BITS {
                let row = word_index * BITMAP_WORD_BITS + bit + 1;
                if row > row_count {
                    break;
                }
                if word & (1 << bit) != 0 {
                    rows.push(row as i32);
                }
            }
        }

        self.observer.rows_fetched(offset as u64, rows.len());
        Ok(rows)
    }

    /// Open the shared handle if absent and seek it to `offset`.
    ///
    /// Callers must hold the handle mutex. Every acquisition seeks to an
    /// explicit absolute offset, so the stream position is always defined
    /// regardless of where a previous fetch stopped.
    fn acquire<'a>(
        guard: &'a mut Option<VpfReader<File>>,
        path: &Path,
        endian: Endian,
        offset: u64,
    ) -> Result<&'a mut VpfReader<File>> {
        if guard.is_none() {
            *guard = Some(VpfReader::open(path, endian)?);
        }
        let reader = guard.as_mut().unwrap();
        reader.seek(offset)?;
        Ok(reader)
    }

    // ── Resource lifecycle ─────────────────────────────────────────

    /// Release the underlying file descriptor. The index stays usable;
    /// the next lookup that needs the file reopens it. Safe to call
    /// repeatedly.
    pub fn close(&self) {
        *self.handle.lock().unwrap() = None;
    }

    /// Reacquire the file handle and seek to an absolute offset. Opens
    /// the file if it is currently closed. Safe to call repeatedly.
    pub fn reopen(&self, offset: u64) -> Result<()> {
        let mut guard = self.handle.lock().unwrap();
        Self::acquire(&mut guard, &self.path, self.endian, offset)?;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// All distinct keys, in index (sorted) order.
    pub fn value_indexes(&self) -> Vec<IndexKey> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// Number of distinct indexed values.
    pub fn num_codes(&self) -> usize {
        self.entries.len()
    }

    /// Number of rows in the indexed table.
    pub fn num_rows(&self) -> usize {
        self.header.row_count as usize
    }

    pub fn index_kind(&self) -> IndexKind {
        self.header.index_kind
    }

    pub fn field_type(&self) -> KeyType {
        self.header.field_type
    }

    /// Element count of the indexed column (text key width).
    pub fn element_count(&self) -> usize {
        self.header.element_count.max(0) as usize
    }

    /// Row-number width specifier byte (`'S'` or `'I'`).
    pub fn data_type(&self) -> char {
        self.header.data_type
    }

    /// Indexed table name (trimmed, lowercased).
    pub fn table_indexed(&self) -> &str {
        &self.header.table_indexed
    }

    /// Indexed column name (trimmed, lowercased).
    pub fn column_indexed(&self) -> &str {
        &self.header.column_indexed
    }

    /// Whether the file declared its entries sorted.
    pub fn sorted(&self) -> bool {
        self.header.sorted
    }

    /// The full decoded header.
    pub fn header(&self) -> &ThematicIndexHeader {
        &self.header
    }
}
