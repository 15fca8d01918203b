//! The flat chunk stream that makes up a project container.
//!
//! Layout: a 24-byte [`FileHeader`], then back-to-back records of a 36-byte
//! fixed header plus a payload whose length the header declares.
//!
//! | bytes   | field                               |
//! |---------|-------------------------------------|
//! | 0..4    | descriptor, byte-reversed           |
//! | 4..6    | `m1`, u16 LE                        |
//! | 6..22   | `m2`..`m5`, u32 LE each             |
//! | 22..28  | status bytes                        |
//! | 28..36  | payload length, u64 LE              |

use std::fmt;

mod encoder;
mod header;
mod record;
mod stream;

pub use encoder::ChunkEncoder;
pub use header::{FileHeader, CHUNK_HEADER_LEN, FILE_HEADER_LEN, FILE_MAGIC};
pub use record::{ChunkRecord, Descriptor};
pub use stream::ChunkStream;

/// A problem that was noted and stepped over while reading the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The first bytes are not [`FILE_MAGIC`].
    HeaderMismatch { found: Vec<u8> },
    /// A payload was declared longer than the rest of the buffer.
    Truncated {
        offset: usize,
        declared: u64,
        available: usize,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::HeaderMismatch { found } => {
                write!(f, "unexpected file signature")?;
                for b in found {
                    write!(f, " {b:02x}")?;
                }
                Ok(())
            }
            DecodeWarning::Truncated {
                offset,
                declared,
                available,
            } => write!(
                f,
                "chunk at {offset:#x} truncated: {declared} bytes declared, {available} available"
            ),
        }
    }
}
