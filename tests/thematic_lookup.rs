//! Integration test: thematic index end-to-end lookups.
//!
//! Builds handcrafted index files on disk and verifies lookup results,
//! miss behavior, both byte orders, and shared-handle concurrency.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use vpfdb::{Endian, IndexKey, IndexKind, KeyType, ThematicIndex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ENTRY_SECTION_OFFSET: usize = 60;

struct HeaderSpec {
    code_count: i32,
    row_count: i32,
    kind: u8,
    field_type: u8,
    element_count: i32,
    data_type: u8,
    sorted_flag: u8,
}

fn push_i32(buf: &mut Vec<u8>, v: i32, endian: Endian) {
    match endian {
        Endian::Little => buf.extend_from_slice(&v.to_le_bytes()),
        Endian::Big => buf.extend_from_slice(&v.to_be_bytes()),
    }
}

fn write_header(buf: &mut Vec<u8>, spec: &HeaderSpec, endian: Endian) {
    push_i32(buf, ENTRY_SECTION_OFFSET as i32, endian); // header_len
    push_i32(buf, spec.code_count, endian);
    push_i32(buf, spec.row_count, endian);
    buf.push(spec.kind);
    buf.push(spec.field_type);
    push_i32(buf, spec.element_count, endian);
    buf.push(spec.data_type);
    buf.extend_from_slice(b"edg.ati     "); // table, 12 bytes
    buf.extend_from_slice(b"f_code                   "); // column, 25 bytes
    buf.push(spec.sorted_flag);
    while buf.len() < ENTRY_SECTION_OFFSET {
        buf.push(0);
    }
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(bytes).unwrap();
    path
}

/// The spec scenario: three int keys {10, 20, 30}, each mapping to two
/// rows stored at distinct offsets past the entry section.
fn build_three_key_index(endian: Endian) -> Vec<u8> {
    let mut buf = Vec::new();
    write_header(
        &mut buf,
        &HeaderSpec {
            code_count: 3,
            row_count: 10,
            kind: b'I',
            field_type: b'I',
            element_count: 1,
            data_type: b'I',
            sorted_flag: b'S',
        },
        endian,
    );

    // Entry section: 3 x 12 bytes; row lists follow at 96.
    let lists_start = ENTRY_SECTION_OFFSET as i32 + 3 * 12;
    let rows: [(i32, [i32; 2]); 3] = [(10, [1, 5]), (20, [3, 9]), (30, [4, 6])];
    for (i, (key, _)) in rows.iter().enumerate() {
        push_i32(&mut buf, *key, endian);
        push_i32(&mut buf, lists_start + (i as i32) * 8, endian);
        push_i32(&mut buf, 2, endian);
    }
    for (_, list) in &rows {
        for row in list {
            push_i32(&mut buf, *row, endian);
        }
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests: inverted-list lookups
// ---------------------------------------------------------------------------

#[test]
fn three_key_scenario_little_endian() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "le.ati", &build_three_key_index(Endian::Little));

    let idx = ThematicIndex::open(&path, Endian::Little, false).unwrap();
    assert_eq!(idx.num_codes(), 3);
    assert_eq!(idx.num_rows(), 10);
    assert_eq!(idx.index_kind(), IndexKind::Inverted);
    assert_eq!(idx.field_type(), KeyType::Int);
    assert_eq!(idx.table_indexed(), "edg.ati");
    assert_eq!(idx.column_indexed(), "f_code");

    assert_eq!(idx.get(&IndexKey::Int(10)).unwrap(), vec![1, 5]);
    assert_eq!(idx.get(&IndexKey::Int(20)).unwrap(), vec![3, 9]);
    assert_eq!(idx.get(&IndexKey::Int(30)).unwrap(), vec![4, 6]);

    // Absent key: empty result, not an error.
    assert!(idx.get(&IndexKey::Int(99)).unwrap().is_empty());
}

#[test]
fn three_key_scenario_big_endian() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "be.ati", &build_three_key_index(Endian::Big));

    let idx = ThematicIndex::open(&path, Endian::Big, false).unwrap();
    assert_eq!(idx.get(&IndexKey::Int(20)).unwrap(), vec![3, 9]);
    assert!(idx.get(&IndexKey::Int(99)).unwrap().is_empty());
}

#[test]
fn text_keys_lookup_after_sort() {
    let dir = TempDir::new().unwrap();
    let mut buf = Vec::new();
    write_header(
        &mut buf,
        &HeaderSpec {
            code_count: 3,
            row_count: 6,
            kind: b'T',
            field_type: b'T',
            element_count: 5,
            data_type: b'I',
            sorted_flag: 0, // unsorted on disk
        },
        Endian::Little,
    );
    // Single-valued entries (count == 0, offset is the row), out of order.
    for (key, row) in [(&b"DB070"[..], 4i32), (&b"AP030"[..], 1), (&b"BH140"[..], 2)] {
        buf.extend_from_slice(key);
        push_i32(&mut buf, row, Endian::Little);
        push_i32(&mut buf, 0, Endian::Little);
    }
    let path = write_file(&dir, "text.ati", &buf);

    let idx = ThematicIndex::open(&path, Endian::Little, false).unwrap();
    assert_eq!(
        idx.value_indexes(),
        vec![
            IndexKey::Text("AP030".into()),
            IndexKey::Text("BH140".into()),
            IndexKey::Text("DB070".into()),
        ]
    );
    assert_eq!(idx.get(&IndexKey::Text("BH140".into())).unwrap(), vec![2]);
    assert_eq!(idx.get(&IndexKey::Text("DB070".into())).unwrap(), vec![4]);
    assert!(idx.get(&IndexKey::Text("ZZ999".into())).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Tests: shared handle across threads
// ---------------------------------------------------------------------------

#[test]
fn concurrent_lookups_with_interleaved_close() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "conc.ati", &build_three_key_index(Endian::Little));

    let idx = Arc::new(ThematicIndex::open(&path, Endian::Little, false).unwrap());

    let mut handles = Vec::new();
    for t in 0..4 {
        let idx = Arc::clone(&idx);
        handles.push(std::thread::spawn(move || {
            for i in 0..50 {
                assert_eq!(idx.get(&IndexKey::Int(10)).unwrap(), vec![1, 5]);
                assert_eq!(idx.get(&IndexKey::Int(30)).unwrap(), vec![4, 6]);
                // One thread keeps dropping the handle mid-stream; every
                // fetch seeks explicitly, so results stay correct.
                if t == 0 && i % 10 == 0 {
                    idx.close();
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

// ---------------------------------------------------------------------------
// Tests: failure modes
// ---------------------------------------------------------------------------

#[test]
fn unknown_kind_byte_fails_construction() {
    let dir = TempDir::new().unwrap();
    let mut buf = Vec::new();
    write_header(
        &mut buf,
        &HeaderSpec {
            code_count: 0,
            row_count: 0,
            kind: b'Q',
            field_type: b'I',
            element_count: 1,
            data_type: b'I',
            sorted_flag: 0,
        },
        Endian::Little,
    );
    let path = write_file(&dir, "unknown.ati", &buf);

    let err = ThematicIndex::open(&path, Endian::Little, false).unwrap_err();
    assert!(err.to_string().contains("Unidentified index format"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does_not_exist.ati");
    let err = ThematicIndex::open(&path, Endian::Little, false).unwrap_err();
    assert!(err.to_string().contains("IO error"));
}

#[test]
fn truncated_row_list_fails_fetch_not_index() {
    let dir = TempDir::new().unwrap();
    let mut buf = Vec::new();
    write_header(
        &mut buf,
        &HeaderSpec {
            code_count: 1,
            row_count: 5,
            kind: b'I',
            field_type: b'I',
            element_count: 1,
            data_type: b'I',
            sorted_flag: b'S',
        },
        Endian::Little,
    );
    // Entry claims 4 rows at an offset holding only one.
    let list_offset = ENTRY_SECTION_OFFSET as i32 + 12;
    push_i32(&mut buf, 7, Endian::Little);
    push_i32(&mut buf, list_offset, Endian::Little);
    push_i32(&mut buf, 4, Endian::Little);
    push_i32(&mut buf, 2, Endian::Little); // one row, then EOF
    let path = write_file(&dir, "shortlist.ati", &buf);

    let idx = ThematicIndex::open(&path, Endian::Little, false).unwrap();
    let err = idx.get(&IndexKey::Int(7)).unwrap_err();
    assert!(err.to_string().contains("Unexpected end of file"));

    // The loaded index survives the failed fetch.
    assert_eq!(idx.num_codes(), 1);
    assert!(idx.get(&IndexKey::Int(8)).unwrap().is_empty());
}
