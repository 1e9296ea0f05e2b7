//! Bounds-checked big-endian primitives.
//!
//! All field extraction funnels through [`ByteReader`], so decoding never
//! depends on host byte order and never walks past the end of a received
//! buffer.

use crate::DIGEST_LEN;

/// Cursor over received wire bytes.
///
/// Reads past the end return `None` and leave the cursor where it was.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wrap a received byte slice.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Option<u8> {
        if self.pos < self.data.len() {
            let value = self.data[self.pos];
            self.pos += 1;
            Some(value)
        } else {
            None
        }
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Option<u16> {
        if self.pos + 2 <= self.data.len() {
            let value = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
            self.pos += 2;
            Some(value)
        } else {
            None
        }
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Option<u32> {
        if self.pos + 4 <= self.data.len() {
            let value = u32::from_be_bytes([
                self.data[self.pos],
                self.data[self.pos + 1],
                self.data[self.pos + 2],
                self.data[self.pos + 3],
            ]);
            self.pos += 4;
            Some(value)
        } else {
            None
        }
    }

    /// Borrow `len` raw bytes.
    ///
    /// `len` comes straight from wire-declared sizes, so the bounds check
    /// must hold for any value up to `usize::MAX`.
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        // pos never exceeds data.len(), so the subtraction cannot underflow.
        if len <= self.data.len() - self.pos {
            let slice = &self.data[self.pos..self.pos + len];
            self.pos += len;
            Some(slice)
        } else {
            None
        }
    }

    /// Borrow a 20-byte digest or nonce blob, verbatim.
    pub fn read_digest(&mut self) -> Option<&'a [u8; DIGEST_LEN]> {
        let bytes = self.read_bytes(DIGEST_LEN)?;
        bytes.try_into().ok()
    }

    /// Advance without reading; `false` if the slice is too short.
    pub fn skip(&mut self, len: usize) -> bool {
        if len <= self.data.len() - self.pos {
            self.pos += len;
            true
        } else {
            false
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Current cursor offset.
    pub fn offset(&self) -> usize {
        self.pos
    }
}

// =============================================================================
// TESTS
// =============================================================================
