//! Binary property lists (`bplist00`).

mod decoder;
mod encoder;
mod error;

pub use decoder::{
    decode_binary_plist, BinaryPlistDecoder, Trailer, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, MAGIC,
};
pub use encoder::{encode_binary_plist, BinaryPlistEncoder};
pub use error::PlistError;
