//! Chunk stream encoder.

use lso_buffers::Writer;

use super::header::FileHeader;
use super::record::{ChunkRecord, Descriptor};

/// Writes a container: the file header followed by chunk records.
///
/// Mirrors [`ChunkStream`](super::ChunkStream): whatever this writes, the
/// stream reads back field for field.
pub struct ChunkEncoder {
    writer: Writer,
}

impl Default for ChunkEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkEncoder {
    /// Starts a container with the default header (known magic, version 0).
    pub fn new() -> Self {
        Self::with_header(&FileHeader::default())
    }

    pub fn with_header(header: &FileHeader) -> Self {
        let mut writer = Writer::new();
        writer.buf(&header.magic);
        writer.u16_le(header.version);
        writer.buf(&header.reserved);
        Self { writer }
    }

    /// Appends a chunk with all opaque header fields zeroed.
    pub fn chunk(&mut self, descriptor: Descriptor, payload: &[u8]) -> &mut Self {
        self.record(&ChunkRecord {
            offset: 0,
            descriptor,
            m1: 0,
            m2: 0,
            m3: 0,
            m4: 0,
            m5: 0,
            status: [0; 6],
            payload_len: payload.len() as u64,
            payload,
            truncated: false,
        })
    }

    /// Appends a record. `offset` and `truncated` are ignored and the
    /// declared length is taken from the payload itself.
    pub fn record(&mut self, record: &ChunkRecord<'_>) -> &mut Self {
        let w = &mut self.writer;
        w.buf(&record.descriptor.to_raw());
        w.u16_le(record.m1);
        w.u32_le(record.m2);
        w.u32_le(record.m3);
        w.u32_le(record.m4);
        w.u32_le(record.m5);
        w.buf(&record.status);
        w.u64_le(record.payload.len() as u64);
        w.buf(record.payload);
        self
    }

    /// Current length of the encoded container.
    pub fn position(&self) -> usize {
        self.writer.position()
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.writer.flush()
    }
}
