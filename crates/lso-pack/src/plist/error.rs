//! Binary property list error type.

use lso_buffers::BufferError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlistError {
    #[error("not a binary property list")]
    InvalidMagic,
    #[error("unsupported binary property list version {0:?}")]
    UnsupportedVersion(String),
    #[error("malformed trailer: {0}")]
    InvalidTrailer(&'static str),
    #[error("object offset {0:#x} outside the object area")]
    InvalidOffset(u64),
    #[error("object reference {0} outside the object table")]
    InvalidReference(u64),
    #[error("object {0} contains itself")]
    CyclicObject(u64),
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("decoded tree exceeds {0} values")]
    TooManyNodes(usize),
    #[error("unknown object marker 0x{0:02x}")]
    UnknownMarker(u8),
    #[error("malformed length at offset {0:#x}")]
    InvalidLength(usize),
    #[error("invalid string at offset {0:#x}")]
    InvalidString(usize),
    #[error("dictionary key at offset {0:#x} is not a string")]
    NonStringKey(usize),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
