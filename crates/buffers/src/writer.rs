//! Binary buffer writer.

/// An append-only binary writer.
///
/// # Example
///
/// ```
/// use lso_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16_le(0x0203);
/// writer.u16_be(0x0405);
/// assert_eq!(writer.flush(), [0x01, 0x03, 0x02, 0x04, 0x05]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.uint8.len()
    }

    /// Takes the written data, leaving the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn buf(&mut self, bytes: &[u8]) {
        self.uint8.extend_from_slice(bytes);
    }

    #[inline]
    pub fn u16_le(&mut self, val: u16) {
        self.buf(&val.to_le_bytes());
    }

    #[inline]
    pub fn u16_be(&mut self, val: u16) {
        self.buf(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32_le(&mut self, val: u32) {
        self.buf(&val.to_le_bytes());
    }

    #[inline]
    pub fn u32_be(&mut self, val: u32) {
        self.buf(&val.to_be_bytes());
    }

    #[inline]
    pub fn u64_le(&mut self, val: u64) {
        self.buf(&val.to_le_bytes());
    }

    #[inline]
    pub fn u64_be(&mut self, val: u64) {
        self.buf(&val.to_be_bytes());
    }

    #[inline]
    pub fn f64_be(&mut self, val: f64) {
        self.buf(&val.to_be_bytes());
    }

    /// Overwrites a little-endian u64 at an earlier position (for length
    /// back-patching).
    ///
    /// Panics if `pos + 8` is past the written data.
    pub fn patch_u64_le(&mut self, pos: usize, val: u64) {
        self.uint8[pos..pos + 8].copy_from_slice(&val.to_le_bytes());
    }
}
