//! Structural decoder for chunked music-project containers.
//!
//! The container is a flat stream of fixed-header records ([`chunk`]).
//! Payloads may embed JSON documents ([`scan`]) or event records
//! ([`events`]); sidecar files are binary property lists ([`plist`]), often
//! gzip-wrapped, holding keyed archives ([`archive`]). Everything decodes
//! into one [`Value`] model. Nothing here interprets musical meaning beyond
//! converting ticks to bar positions ([`ticks`]).
//!
//! Decoding never aborts because one local structure is malformed:
//! truncated chunks are flagged, unparsable documents are skipped and bad
//! references become placeholders.

mod decode;
mod value;

pub mod archive;
pub mod chunk;
pub mod events;
pub mod plist;
pub mod scan;
pub mod ticks;

pub use value::{Mapping, Placeholder, Value};

pub use archive::{resolve, resolve_with, ArchiveError, KeyedArchive, ResolveOptions};
pub use chunk::{ChunkEncoder, ChunkRecord, ChunkStream, DecodeWarning, Descriptor, FileHeader};
pub use decode::{
    decode, inflate, DecodeError, DecodeOptions, Decoded, Format, DEFAULT_MAX_INFLATED_LEN,
};
pub use events::{scan_events, EventRecord};
pub use plist::{decode_binary_plist, encode_binary_plist, BinaryPlistDecoder, PlistError};
pub use scan::{scan, scan_with, EmbeddedDocument, ScanOptions};
pub use ticks::{ticks_to_position, Position, TickError, TimeBase};
