//! Byte cursor and writer shared by the `lso` decoders.
//!
//! [`Reader`] is the only way the decoders touch raw bytes: every read is
//! bounds-checked and fails with [`BufferError::EndOfBuffer`] rather than
//! panicking. [`Writer`] is its append-only counterpart, used to build
//! chunk streams and property lists in tests and fixtures.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for cursor operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer at offset {offset:#x} (need {need} bytes, have {have})")]
    EndOfBuffer {
        offset: usize,
        need: usize,
        have: usize,
    },
    #[error("cannot seek to offset {target:#x} in a buffer of {len} bytes")]
    SeekOutOfRange { target: usize, len: usize },
    #[error("unsupported integer width: {0} bytes")]
    InvalidWidth(usize),
}
