//! Bounds-checked binary reader with cursor tracking.

use crate::BufferError;

/// A binary reader over an immutable byte slice.
///
/// Every read checks the remaining length first and returns
/// [`BufferError::EndOfBuffer`] instead of reading past the end, so the
/// reader never panics on truncated or hostile input. Reads advance the
/// cursor; [`Reader::peek`] does not.
///
/// # Example
///
/// ```
/// use lso_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16_le().unwrap(), 0x0302);
/// assert_eq!(reader.u16_be().unwrap(), 0x0405);
/// assert!(reader.u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader positioned at the start of `uint8`.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Creates a reader positioned at an absolute offset into `uint8`.
    ///
    /// The offset is clamped to the buffer length.
    pub fn at(uint8: &'a [u8], x: usize) -> Self {
        Self {
            uint8,
            x: x.min(uint8.len()),
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.x
    }

    /// Total length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    /// Whether the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Number of bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.uint8.len().saturating_sub(self.x)
    }

    /// The whole underlying buffer, for absolute-offset slicing.
    pub fn data(&self) -> &'a [u8] {
        self.uint8
    }

    /// Moves the cursor to an absolute offset.
    ///
    /// Seeking to exactly the end of the buffer is allowed; anything beyond
    /// it fails and leaves the cursor where it was.
    pub fn seek(&mut self, offset: usize) -> Result<(), BufferError> {
        if offset > self.uint8.len() {
            return Err(BufferError::SeekOutOfRange {
                target: offset,
                len: self.uint8.len(),
            });
        }
        self.x = offset;
        Ok(())
    }

    /// Advances the cursor by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), BufferError> {
        self.check(n)?;
        self.x += n;
        Ok(())
    }

    /// Checks that `n` more bytes are available from the current cursor.
    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if n > self.remaining() {
            Err(BufferError::EndOfBuffer {
                offset: self.x,
                need: n,
                have: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Returns the byte under the cursor without advancing.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.check(1)?;
        Ok(self.uint8[self.x])
    }

    /// Reads `size` raw bytes without copying and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..x + size])
    }

    /// Reads exactly `N` bytes into an array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.buf(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads an unsigned 16-bit little-endian integer.
    #[inline]
    pub fn u16_le(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 16-bit big-endian integer.
    #[inline]
    pub fn u16_be(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned 32-bit little-endian integer.
    #[inline]
    pub fn u32_le(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 32-bit big-endian integer.
    #[inline]
    pub fn u32_be(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned 64-bit little-endian integer.
    #[inline]
    pub fn u64_le(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned 64-bit big-endian integer.
    #[inline]
    pub fn u64_be(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// Reads a signed 64-bit big-endian integer.
    #[inline]
    pub fn i64_be(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Reads a signed 128-bit big-endian integer.
    #[inline]
    pub fn i128_be(&mut self) -> Result<i128, BufferError> {
        Ok(i128::from_be_bytes(self.array()?))
    }

    /// Reads a 32-bit little-endian float.
    #[inline]
    pub fn f32_le(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Reads a 32-bit big-endian float.
    #[inline]
    pub fn f32_be(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    /// Reads a 64-bit big-endian float.
    #[inline]
    pub fn f64_be(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned big-endian integer of 1 to 8 bytes.
    ///
    /// Used by formats whose integer width is declared in the data itself.
    pub fn uint_be(&mut self, width: usize) -> Result<u64, BufferError> {
        if width == 0 || width > 8 {
            return Err(BufferError::InvalidWidth(width));
        }
        let bytes = self.buf(width)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_and_peek_does_not() {
        let data = [0xAA, 0x01, 0x00, 0x00, 0x00];
        let mut r = Reader::new(&data);
        assert_eq!(r.peek().unwrap(), 0xAA);
        assert_eq!(r.position(), 0);
        assert_eq!(r.u8().unwrap(), 0xAA);
        assert_eq!(r.u32_le().unwrap(), 1);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_read_fails_without_moving() {
        let data = [1, 2, 3];
        let mut r = Reader::new(&data);
        r.skip(1).unwrap();
        let err = r.u32_be().unwrap_err();
        assert_eq!(
            err,
            BufferError::EndOfBuffer {
                offset: 1,
                need: 4,
                have: 2
            }
        );
        assert_eq!(r.position(), 1);
        assert_eq!(r.u16_be().unwrap(), 0x0203);
        assert!(r.peek().is_err());
    }

    #[test]
    fn endianness() {
        let data = [0x3F, 0x80, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F];
        let mut r = Reader::new(&data);
        assert_eq!(r.f32_be().unwrap(), 1.0);
        assert_eq!(r.f32_le().unwrap(), 1.0);

        let data = [0, 0, 0, 0, 0, 0, 1, 2];
        assert_eq!(Reader::new(&data).u64_be().unwrap(), 0x0102);
        assert_eq!(Reader::new(&data).u64_le().unwrap(), 0x0201 << 48);
    }

    #[test]
    fn seek_is_bounded() {
        let data = [0u8; 4];
        let mut r = Reader::new(&data);
        assert!(r.seek(4).is_ok());
        assert_eq!(r.remaining(), 0);
        assert_eq!(
            r.seek(5),
            Err(BufferError::SeekOutOfRange { target: 5, len: 4 })
        );
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn variable_width_uint() {
        let data = [0x01, 0x02, 0x03];
        let mut r = Reader::new(&data);
        assert_eq!(r.uint_be(3).unwrap(), 0x010203);
        assert_eq!(
            Reader::new(&data).uint_be(9).unwrap_err(),
            BufferError::InvalidWidth(9)
        );
    }
}
