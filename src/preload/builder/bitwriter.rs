/// Append-only MSB-first bit buffer, the writing side of
/// [`crate::preload::bitreader::BitReader`].
#[derive(Debug, Default, Clone)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        BitWriter::default()
    }

    /// Number of bits written.
    pub(crate) fn len(&self) -> usize {
        self.bits
    }

    pub(crate) fn write_bit(&mut self, bit: bool) {
        let shift = 7 - (self.bits % 8);
        if shift == 7 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << shift;
            }
        }
        self.bits += 1;
    }

    /// Write the low `width` bits of `value`, most significant first.
    pub(crate) fn write_bits(&mut self, value: u32, width: u32) {
        for i in (0..width).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// `count` one bits followed by a zero bit.
    pub(crate) fn write_unary(&mut self, count: usize) {
        for _ in 0..count {
            self.write_bit(true);
        }
        self.write_bit(false);
    }

    pub(crate) fn append(&mut self, other: &BitWriter) {
        if self.bits % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.bits += other.bits;
            return;
        }

        for i in 0..other.bits {
            let bit = (other.bytes[i / 8] >> (7 - (i % 8))) & 1 == 1;
            self.write_bit(bit);
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, usize) {
        (self.bytes, self.bits)
    }
}
