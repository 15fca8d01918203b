//! File header and fixed layout constants.

use lso_buffers::{BufferError, Reader};

/// Leading signature of a project container (`0xABC04723` read as u32 LE).
pub const FILE_MAGIC: [u8; 4] = [0x23, 0x47, 0xC0, 0xAB];

/// Size of the file header; the first chunk header starts here.
pub const FILE_HEADER_LEN: usize = 24;

/// Size of the fixed header in front of every chunk payload.
pub const CHUNK_HEADER_LEN: usize = 36;

/// The 24-byte container header.
///
/// Only the magic and the version word have been observed to vary; the rest
/// is kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub reserved: [u8; 18],
}

impl FileHeader {
    /// Reads the header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, BufferError> {
        let mut reader = Reader::new(data);
        Ok(Self {
            magic: reader.array()?,
            version: reader.u16_le()?,
            reserved: reader.array()?,
        })
    }

    pub fn has_known_magic(&self) -> bool {
        self.magic == FILE_MAGIC
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: FILE_MAGIC,
            version: 0,
            reserved: [0; 18],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_magic_and_version() {
        let mut data = vec![0x23, 0x47, 0xC0, 0xAB, 0x1A, 0x00];
        data.extend_from_slice(&[7; 18]);
        let header = FileHeader::parse(&data).unwrap();
        assert!(header.has_known_magic());
        assert_eq!(header.version, 0x1A);
        assert_eq!(header.reserved, [7; 18]);
    }

    #[test]
    fn short_header_is_an_error() {
        assert!(FileHeader::parse(&FILE_MAGIC).is_err());
    }
}
