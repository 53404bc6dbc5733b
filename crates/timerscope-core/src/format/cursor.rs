//! Bounds-checked read cursor over a timer file buffer.
//!
//! Every read checks the remaining length before touching the buffer, so a
//! short buffer always surfaces as [`Error::TruncatedInput`] carrying the
//! offending offset and field name.

use crate::error::{Error, Result};
use bytes::Buf;

use super::{COUNT_SIZE, FLAG_SIZE, VALUE_SIZE};

/// Forward-only reader over an immutable byte slice
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Creates a cursor positioned at `position`.
    ///
    /// Offsets reported in errors stay relative to the start of `data`.
    /// A position past the end leaves nothing to read.
    pub fn starting_at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position: position.min(data.len()),
        }
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Consumes exactly `len` bytes
    pub fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::truncated(self.position, field, len, remaining));
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Consumes `count` elements of `width` bytes each.
    ///
    /// A span that overflows `usize` is reported as truncated input.
    pub fn take_array(
        &mut self,
        count: usize,
        width: usize,
        field: &'static str,
    ) -> Result<&'a [u8]> {
        let len = count
            .checked_mul(width)
            .ok_or_else(|| Error::truncated(self.position, field, usize::MAX, self.remaining()))?;
        self.take(len, field)
    }

    /// Skips `len` bytes
    pub fn skip(&mut self, len: usize, field: &'static str) -> Result<()> {
        self.take(len, field).map(|_| ())
    }

    /// Reads a single byte
    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        let mut bytes = self.take(FLAG_SIZE, field)?;
        Ok(bytes.get_u8())
    }

    /// Reads a little-endian `u32`
    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        let mut bytes = self.take(COUNT_SIZE, field)?;
        Ok(bytes.get_u32_le())
    }

    /// Reads a little-endian `f64`
    pub fn read_f64(&mut self, field: &'static str) -> Result<f64> {
        let mut bytes = self.take(VALUE_SIZE, field)?;
        Ok(bytes.get_f64_le())
    }

    /// Reads `count` consecutive little-endian `f64` values.
    ///
    /// Nothing is allocated until the whole span is known to be present.
    pub fn read_f64_array(&mut self, count: usize, field: &'static str) -> Result<Vec<f64>> {
        let mut bytes = self.take_array(count, VALUE_SIZE, field)?;
        let mut values = Vec::with_capacity(count);
        while bytes.has_remaining() {
            values.push(bytes.get_f64_le());
        }
        Ok(values)
    }

    /// Reads `len` bytes of strict UTF-8
    pub fn read_str(&mut self, len: usize, field: &'static str) -> Result<&'a str> {
        let offset = self.position;
        let bytes = self.take(len, field)?;
        std::str::from_utf8(bytes).map_err(|e| Error::invalid_text(offset, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u32("value").unwrap(), 0x0403_0201);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_f64_little_endian() {
        let data = 1.5f64.to_le_bytes();
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_f64("value").unwrap(), 1.5);
    }

    #[test]
    fn test_take_past_end() {
        let data = [0u8; 3];
        let mut cursor = Cursor::new(&data);
        cursor.skip(1, "pad").unwrap();

        let err = cursor.read_u32("count").unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedInput {
                offset: 1,
                field: "count",
                needed: 4,
                remaining: 2
            }
        ));
        // A failed read does not move the cursor
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_array_overflow_is_truncation() {
        let data = [0u8; 16];
        let mut cursor = Cursor::new(&data);
        let err = cursor.read_f64_array(usize::MAX, "runtimes").unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { field: "runtimes", .. }));
    }

    #[test]
    fn test_read_f64_array() {
        let mut data = Vec::new();
        for v in [1.0f64, -2.0, 0.25] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_f64_array(3, "values").unwrap(), vec![1.0, -2.0, 0.25]);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_str_invalid_utf8() {
        let data = [b'o', b'k', 0xC3, 0x28];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_str(2, "name").unwrap(), "ok");

        let err = cursor.read_str(2, "name").unwrap_err();
        assert!(matches!(err, Error::InvalidText { offset: 2, .. }));
    }

    #[test]
    fn test_starting_at_clamps() {
        let data = [0u8; 4];
        let cursor = Cursor::starting_at(&data, 10);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.remaining(), 0);
    }
}
