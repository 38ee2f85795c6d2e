//! Error types for VPF file decoding

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VpfError>;

#[derive(Error, Debug)]
pub enum VpfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unidentified index format: {0:?}")]
    UnknownIndexKind(char),

    #[error("Unknown field type: {0:?}")]
    UnknownFieldType(char),

    #[error("Unknown data type specifier: {0:?}")]
    UnknownDataType(char),
}
