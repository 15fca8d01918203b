//! Chunk records and their descriptors.

use std::fmt;

use lso_buffers::{BufferError, Reader};

use super::header::CHUNK_HEADER_LEN;
use crate::events::{scan_events, EventRecord};
use crate::scan::{scan_with, EmbeddedDocument, ScanOptions};

/// Four-character chunk tag in logical (human-readable) order.
///
/// The container stores tags byte-reversed, so `Song` appears on disk as
/// `gnoS`. [`Descriptor::from_raw`] and [`Descriptor::to_raw`] convert
/// between the two.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Descriptor(pub [u8; 4]);

impl Descriptor {
    pub const SONG: Descriptor = Descriptor(*b"Song");
    pub const EVENT_SEQUENCE: Descriptor = Descriptor(*b"EvSq");
    pub const TEXT_SEQUENCE: Descriptor = Descriptor(*b"TxSq");
    pub const TRACK: Descriptor = Descriptor(*b"Trak");
    pub const AUDIO_REGION: Descriptor = Descriptor(*b"AuRg");
    pub const MIDI_SEQUENCE: Descriptor = Descriptor(*b"MSeq");
    pub const INSTRUMENT: Descriptor = Descriptor(*b"InSt");
    pub const AUDIO_FILE: Descriptor = Descriptor(*b"AUFL");
    pub const AUDIO_FILE_ALT: Descriptor = Descriptor(*b"AuFl");
    pub const COMP: Descriptor = Descriptor(*b"COMP");
    pub const TRANSFORM: Descriptor = Descriptor(*b"Trns");
    pub const CORE: Descriptor = Descriptor(*b"CorM");

    /// Tags observed in real project files.
    pub const KNOWN: [Descriptor; 12] = [
        Self::SONG,
        Self::EVENT_SEQUENCE,
        Self::TEXT_SEQUENCE,
        Self::TRACK,
        Self::AUDIO_REGION,
        Self::MIDI_SEQUENCE,
        Self::INSTRUMENT,
        Self::AUDIO_FILE,
        Self::AUDIO_FILE_ALT,
        Self::COMP,
        Self::TRANSFORM,
        Self::CORE,
    ];

    /// Builds a descriptor from the four bytes as stored in the stream.
    pub fn from_raw(raw: [u8; 4]) -> Self {
        Descriptor([raw[3], raw[2], raw[1], raw[0]])
    }

    /// The four bytes as they must be written to the stream.
    pub fn to_raw(self) -> [u8; 4] {
        let [a, b, c, d] = self.0;
        [d, c, b, a]
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The tag packed big-endian, so `Song` is `0x536F6E67`.
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({self})")
    }
}

/// One record of the chunk stream.
///
/// `m1`..`m5` and `status` are kept exactly as stored; their meaning is not
/// known well enough to name them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord<'a> {
    /// Absolute offset of the record header in the buffer.
    pub offset: usize,
    pub descriptor: Descriptor,
    pub m1: u16,
    pub m2: u32,
    pub m3: u32,
    pub m4: u32,
    pub m5: u32,
    pub status: [u8; 6],
    /// Payload length as declared in the header.
    pub payload_len: u64,
    /// Payload bytes; shorter than `payload_len` when `truncated`.
    pub payload: &'a [u8],
    /// The declared length ran past the end of the buffer.
    pub truncated: bool,
}

/// The fixed part of a chunk header, before the payload is sliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    pub descriptor: Descriptor,
    pub m1: u16,
    pub m2: u32,
    pub m3: u32,
    pub m4: u32,
    pub m5: u32,
    pub status: [u8; 6],
    pub payload_len: u64,
}

impl RecordHeader {
    /// Reads the 36-byte header: reversed tag, m1 (u16), m2..m5 (u32),
    /// six status bytes and the u64 payload length. All integers are LE.
    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, BufferError> {
        let start = reader.position();
        let header = Self {
            descriptor: Descriptor::from_raw(reader.array()?),
            m1: reader.u16_le()?,
            m2: reader.u32_le()?,
            m3: reader.u32_le()?,
            m4: reader.u32_le()?,
            m5: reader.u32_le()?,
            status: reader.array()?,
            payload_len: reader.u64_le()?,
        };
        debug_assert_eq!(reader.position() - start, CHUNK_HEADER_LEN);
        Ok(header)
    }
}

impl<'a> ChunkRecord<'a> {
    /// Offset one past the last byte consumed by this record.
    pub fn end_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_LEN + self.payload.len()
    }

    /// JSON documents embedded in the payload.
    pub fn documents(&self, options: &ScanOptions) -> Vec<EmbeddedDocument> {
        scan_with(self.payload, options)
    }

    /// Event records, for `EvSq` chunks. Empty for every other descriptor.
    pub fn events(&self) -> Vec<EventRecord> {
        if self.descriptor == Descriptor::EVENT_SEQUENCE {
            scan_events(self.payload)
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_is_stored_reversed() {
        let d = Descriptor::from_raw(*b"karT");
        assert_eq!(d, Descriptor::TRACK);
        assert_eq!(d.to_raw(), *b"karT");
        assert_eq!(d.to_string(), "Trak");
        assert!(d.is_known());
        assert_eq!(Descriptor(*b"Song").as_u32(), 0x536F_6E67);
    }

    #[test]
    fn non_printable_descriptor_bytes_are_masked() {
        let d = Descriptor([b'A', 0, 0xff, b'z']);
        assert_eq!(d.to_string(), "A..z");
        assert!(!d.is_known());
    }

    #[test]
    fn reads_fixed_header_fields() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"gnoS");
        bytes.extend_from_slice(&0x0102u16.to_le_bytes());
        for m in [10u32, 20, 30, 40] {
            bytes.extend_from_slice(&m.to_le_bytes());
        }
        bytes.extend_from_slice(&[2, 0, 0, 0, 1, 0]);
        bytes.extend_from_slice(&99u64.to_le_bytes());
        let header = RecordHeader::read(&mut Reader::new(&bytes)).unwrap();
        assert_eq!(header.descriptor, Descriptor::SONG);
        assert_eq!(header.m1, 0x0102);
        assert_eq!((header.m2, header.m3, header.m4, header.m5), (10, 20, 30, 40));
        assert_eq!(header.status, [2, 0, 0, 0, 1, 0]);
        assert_eq!(header.payload_len, 99);
    }
}
