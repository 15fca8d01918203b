//! Sequential chunk reader.

use lso_buffers::Reader;

use super::header::{FileHeader, CHUNK_HEADER_LEN, FILE_HEADER_LEN, FILE_MAGIC};
use super::record::{ChunkRecord, RecordHeader};
use super::DecodeWarning;

/// Pull-based reader over the chunk records of a container.
///
/// The stream never fails: a wrong file signature and payloads that run
/// past the end of the buffer are recorded as [`DecodeWarning`]s and
/// decoding carries on. Iteration ends once fewer than
/// [`CHUNK_HEADER_LEN`] bytes remain.
///
/// ```
/// use lso_pack::chunk::{ChunkEncoder, ChunkStream, Descriptor};
///
/// let mut encoder = ChunkEncoder::new();
/// encoder.chunk(Descriptor::SONG, b"payload");
/// let bytes = encoder.finish();
///
/// let records: Vec<_> = ChunkStream::open(&bytes).collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].payload, b"payload");
/// ```
#[derive(Debug, Clone)]
pub struct ChunkStream<'a> {
    reader: Reader<'a>,
    header: Option<FileHeader>,
    warnings: Vec<DecodeWarning>,
}

impl<'a> ChunkStream<'a> {
    /// Opens a stream over a whole container file.
    pub fn open(data: &'a [u8]) -> Self {
        let mut warnings = Vec::new();
        let found: Vec<u8> = data.iter().take(FILE_MAGIC.len()).copied().collect();
        if found != FILE_MAGIC {
            log::warn!(
                "file signature {} does not match {}",
                hex(&found),
                hex(&FILE_MAGIC)
            );
            warnings.push(DecodeWarning::HeaderMismatch { found });
        }
        let header = FileHeader::parse(data).ok();
        Self {
            reader: Reader::at(data, FILE_HEADER_LEN),
            header,
            warnings,
        }
    }

    /// The file header, when the buffer is long enough to hold one.
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Non-fatal problems met so far.
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Absolute offset of the next record header.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Reads the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Option<ChunkRecord<'a>> {
        if self.reader.remaining() < CHUNK_HEADER_LEN {
            return None;
        }
        let offset = self.reader.position();
        let header = match RecordHeader::read(&mut self.reader) {
            Ok(header) => header,
            Err(err) => {
                log::warn!("chunk header at {offset:#x} unreadable: {err}");
                return None;
            }
        };

        let available = self.reader.remaining();
        let truncated = header.payload_len > available as u64;
        let take = if truncated {
            available
        } else {
            header.payload_len as usize
        };
        if truncated {
            log::warn!(
                "chunk {} at {offset:#x} declares {} payload bytes, only {available} remain",
                header.descriptor,
                header.payload_len
            );
            self.warnings.push(DecodeWarning::Truncated {
                offset,
                declared: header.payload_len,
                available,
            });
        }
        let payload = match self.reader.buf(take) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("chunk payload at {offset:#x} unreadable: {err}");
                return None;
            }
        };
        log::trace!(
            "chunk {} at {offset:#x}, {} payload bytes",
            header.descriptor,
            payload.len()
        );

        Some(ChunkRecord {
            offset,
            descriptor: header.descriptor,
            m1: header.m1,
            m2: header.m2,
            m3: header.m3,
            m4: header.m4,
            m5: header.m5,
            status: header.status,
            payload_len: header.payload_len,
            payload,
            truncated,
        })
    }
}

impl<'a> Iterator for ChunkStream<'a> {
    type Item = ChunkRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
