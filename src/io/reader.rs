//! Seekable, byte-order-aware primitive reader for VPF files.
//!
//! VPF files self-describe their byte order via a marker the caller
//! resolves upstream; every multi-byte read here dispatches on the
//! caller-supplied [`Endian`] flag. Strings in VPF tables are fixed-width
//! ASCII fields padded with spaces or NULs.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::{Result, VpfError};

/// Byte order of a VPF file, resolved by the caller from the file's
/// byte-order marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Primitive reader over a seekable stream with a fixed byte order.
#[derive(Debug)]
pub struct VpfReader<R> {
    inner: R,
    endian: Endian,
}

impl VpfReader<File> {
    /// Open a file-backed reader.
    pub fn open(path: &Path, endian: Endian) -> Result<Self> {
        let file = File::open(path).map_err(VpfError::Io)?;
        Ok(Self::new(file, endian))
    }
}

impl<R: Read + Seek> VpfReader<R> {
    /// Wrap a seekable stream with the given byte order.
    pub fn new(inner: R, endian: Endian) -> Self {
        Self { inner, endian }
    }

    /// Byte order this reader was constructed with.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Map a short read to a format error; pass real I/O failures through.
    fn read_err(e: std::io::Error, what: &str) -> VpfError {
        if e.kind() == ErrorKind::UnexpectedEof {
            VpfError::InvalidFormat(format!("Unexpected end of file reading {}", what))
        } else {
            VpfError::Io(e)
        }
    }

    /// Read a 32-bit signed integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        match self.endian {
            Endian::Little => self.inner.read_i32::<LittleEndian>(),
            Endian::Big => self.inner.read_i32::<BigEndian>(),
        }
        .map_err(|e| Self::read_err(e, "i32"))
    }

    /// Read a 16-bit signed integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        match self.endian {
            Endian::Little => self.inner.read_i16::<LittleEndian>(),
            Endian::Big => self.inner.read_i16::<BigEndian>(),
        }
        .map_err(|e| Self::read_err(e, "i16"))
    }

    /// Read a 16-bit unsigned integer (bitmap words).
    pub fn read_u16(&mut self) -> Result<u16> {
        match self.endian {
            Endian::Little => self.inner.read_u16::<LittleEndian>(),
            Endian::Big => self.inner.read_u16::<BigEndian>(),
        }
        .map_err(|e| Self::read_err(e, "u16"))
    }

    /// Read an IEEE 754 single-precision float.
    pub fn read_f32(&mut self) -> Result<f32> {
        match self.endian {
            Endian::Little => self.inner.read_f32::<LittleEndian>(),
            Endian::Big => self.inner.read_f32::<BigEndian>(),
        }
        .map_err(|e| Self::read_err(e, "f32"))
    }

    /// Read an IEEE 754 double-precision float.
    pub fn read_f64(&mut self) -> Result<f64> {
        match self.endian {
            Endian::Little => self.inner.read_f64::<LittleEndian>(),
            Endian::Big => self.inner.read_f64::<BigEndian>(),
        }
        .map_err(|e| Self::read_err(e, "f64"))
    }

    /// Read a single byte (format marker chars).
    pub fn read_byte(&mut self) -> Result<u8> {
        self.inner
            .read_u8()
            .map_err(|e| Self::read_err(e, "byte"))
    }

    /// Read a fixed-width ASCII field, trimming trailing NUL/space padding.
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String> {
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| Self::read_err(e, "fixed-length string"))?;

        // VPF text fields are ASCII; map bytes directly to chars rather
        // than rejecting the occasional stray high byte in damaged files.
        let s: String = buf.iter().map(|&b| b as char).collect();
        Ok(s.trim_end_matches(['\0', ' ']).to_string())
    }

    /// Seek to an absolute byte offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(VpfError::Io)?;
        Ok(())
    }

    /// Current byte offset in the stream.
    pub fn position(&mut self) -> Result<u64> {
        self.inner.stream_position().map_err(VpfError::Io)
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
