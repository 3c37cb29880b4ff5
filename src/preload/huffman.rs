//! Symbol decoder for the trie's Huffman table.
//!
//! The table is a flat array of two-byte nodes with the root as the last node. For each node,
//! a `0` bit selects the first byte and a `1` bit the second. A byte with its high bit set is a
//! leaf holding a 7-bit symbol; any other byte is the index of the next node.

use crate::{preload::bitreader::BitReader, Result};

/// Marks a leaf byte in the table.
pub(crate) const LEAF_FLAG: u8 = 0x80;

/// Decodes symbols from a borrowed Huffman table.
#[derive(Debug, Clone, Copy)]
pub struct HuffmanDecoder<'a> {
    tree: &'a [u8],
}

impl<'a> HuffmanDecoder<'a> {
    /// Wrap a table.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table is empty or has an odd length.
    pub fn new(tree: &'a [u8]) -> Result<Self> {
        if tree.len() < 2 || tree.len() % 2 != 0 {
            return Err(malformed_error!(
                "Huffman table of {} bytes is not a sequence of nodes",
                tree.len()
            ));
        }

        Ok(HuffmanDecoder { tree })
    }

    /// Decode one symbol from `reader`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the reader runs out mid-symbol, and
    /// [`crate::Error::Malformed`] if a node index points outside the table.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u8> {
        let mut current = self.tree.len() - 2;
        loop {
            let bit = reader.next()?;
            let byte = self.tree[current + usize::from(bit)];
            if byte & LEAF_FLAG != 0 {
                return Ok(byte & !LEAF_FLAG);
            }

            let next = usize::from(byte) * 2;
            if next + 1 >= self.tree.len() {
                return Err(malformed_error!(
                    "Huffman node {} is outside a table of {} bytes",
                    byte,
                    self.tree.len()
                ));
            }
            current = next;
        }
    }
}
