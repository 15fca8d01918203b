//! Top-level entry: recognize what a buffer holds and run the matching decoder.

use std::fmt;
use std::io::Read;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::archive::{ArchiveError, KeyedArchive, ResolveOptions};
use crate::chunk::{ChunkStream, FILE_MAGIC};
use crate::plist::{BinaryPlistDecoder, PlistError, DEFAULT_MAX_NODES, MAGIC as PLIST_MAGIC};
use crate::scan::ScanOptions;
use crate::value::Value;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

pub const DEFAULT_MAX_INFLATED_LEN: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Gzip,
    BinaryPlist,
    ChunkStream,
    Unknown,
}

impl Format {
    /// Recognizes a buffer by its leading magic bytes.
    pub fn sniff(data: &[u8]) -> Format {
        if data.starts_with(&GZIP_MAGIC) {
            Format::Gzip
        } else if data.starts_with(PLIST_MAGIC) {
            Format::BinaryPlist
        } else if data.starts_with(&FILE_MAGIC) {
            Format::ChunkStream
        } else {
            Format::Unknown
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Gzip => "gzip",
            Format::BinaryPlist => "binary plist",
            Format::ChunkStream => "chunk stream",
            Format::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("gzip inflate failed: {0}")]
    Inflate(String),
    #[error("inflated data exceeds {0} bytes")]
    InflatedTooLarge(usize),
    #[error(transparent)]
    Plist(#[from] PlistError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("unrecognized format")]
    UnknownFormat,
    #[error("compressed {0} content is not supported")]
    UnsupportedInner(Format),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub scan: ScanOptions,
    pub resolve: ResolveOptions,
    /// Upper bound on gzip output.
    pub max_inflated_len: usize,
    /// Upper bound on values produced by the plist decoder.
    pub max_nodes: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            resolve: ResolveOptions::default(),
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

#[derive(Debug)]
pub enum Decoded<'a> {
    /// A chunk container; records are pulled lazily.
    Chunks(ChunkStream<'a>),
    /// A keyed archive, already resolved.
    Archive(Value),
    /// A plain property list.
    Plist(Value),
}

/// Inflates a gzip member, refusing output longer than `max_len`.
pub fn inflate(data: &[u8], max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|err| DecodeError::Inflate(err.to_string()))?;
    if out.len() > max_len {
        return Err(DecodeError::InflatedTooLarge(max_len));
    }
    Ok(out)
}

/// Decodes `data` according to its sniffed format.
///
/// Gzip input is inflated once and must contain a property list. Property
/// lists that carry a keyed archive envelope are unarchived.
///
/// Sniffing is strict: a chunk container whose first bytes are not
/// [`FILE_MAGIC`] is reported as [`DecodeError::UnknownFormat`]. Callers that
/// expect a container regardless of its signature should use
/// [`ChunkStream::open`] directly, which only warns about the mismatch.
pub fn decode<'a>(data: &'a [u8], options: &DecodeOptions) -> Result<Decoded<'a>, DecodeError> {
    match Format::sniff(data) {
        Format::ChunkStream => Ok(Decoded::Chunks(ChunkStream::open(data))),
        Format::BinaryPlist => decode_plist(data, options),
        Format::Gzip => {
            let inflated = inflate(data, options.max_inflated_len)?;
            log::debug!("inflated {} bytes to {}", data.len(), inflated.len());
            match Format::sniff(&inflated) {
                Format::BinaryPlist => decode_plist(&inflated, options),
                inner => Err(DecodeError::UnsupportedInner(inner)),
            }
        }
        Format::Unknown => Err(DecodeError::UnknownFormat),
    }
}

fn decode_plist<'a>(data: &[u8], options: &DecodeOptions) -> Result<Decoded<'a>, DecodeError> {
    let value = BinaryPlistDecoder::new(data)?
        .with_max_nodes(options.max_nodes)
        .decode()?;
    if !KeyedArchive::is_keyed_archive(&value) {
        return Ok(Decoded::Plist(value));
    }
    let archive = KeyedArchive::from_plist(value)?;
    Ok(Decoded::Archive(archive.unarchive_with(&options.resolve)?))
}
