//! Seekable, MSB-first bit cursor over the trie bit-stream.
//!
//! Bits are numbered from the most significant bit of the first byte. The reader knows the exact
//! number of valid bits, so padding in the last byte is never read.
//!
//! Every operation is bounds-checked. Running out of bits and seeking past the end are reported
//! as [`crate::Error::OutOfBounds`]; the caller decides whether that means damaged data.

use crate::Result;

/// A bit cursor over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    num_bits: usize,
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over the first `num_bits` bits of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `data` holds fewer than `num_bits` bits.
    pub fn new(data: &'a [u8], num_bits: usize) -> Result<Self> {
        if num_bits.div_ceil(8) > data.len() {
            return Err(malformed_error!(
                "Bit length {} exceeds buffer of {} bytes",
                num_bits,
                data.len()
            ));
        }

        Ok(BitReader {
            data,
            num_bits,
            position: 0,
        })
    }

    /// Current bit offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bits left before the end of the stream.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.num_bits - self.position
    }

    /// Read a single bit.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] once all bits are consumed.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool> {
        if self.position >= self.num_bits {
            return Err(out_of_bounds_error!());
        }

        let byte = self.data[self.position / 8];
        let bit = (byte >> (7 - (self.position % 8))) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    /// Read `bits` bits, most significant first, into a `u32`.
    ///
    /// Nothing is consumed if the read fails. Reading zero bits yields zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `bits` exceeds 32, and
    /// [`crate::Error::OutOfBounds`] if fewer than `bits` bits remain.
    pub fn read(&mut self, bits: u32) -> Result<u32> {
        if bits > 32 {
            return Err(malformed_error!("Cannot read {} bits into a u32", bits));
        }
        if bits as usize > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let mut value = 0_u32;
        for _ in 0..bits {
            value = (value << 1) | u32::from(self.next()?);
        }
        Ok(value)
    }

    /// Count `1` bits up to and including the next `0` bit.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the stream ends before a `0` bit.
    pub fn unary(&mut self) -> Result<usize> {
        let mut count = 0;
        while self.next()? {
            count += 1;
        }
        Ok(count)
    }

    /// Move to an absolute bit offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is not less than the bit length.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset >= self.num_bits {
            return Err(out_of_bounds_error!());
        }

        self.position = offset;
        Ok(())
    }
}
