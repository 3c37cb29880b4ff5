//! Hostname lookup in the preloaded trie.
//!
//! The trie is matched from the end of the hostname towards its start, so a node's children are
//! the possible characters *preceding* what has been matched so far and DNS nesting maps onto
//! the tree (`com` above `google.com` above `www.google.com`).
//!
//! Each node is laid out as
//!
//! ```text
//! unary(prefix length) huffman(prefix char)* dispatch* huffman(END_OF_TABLE)
//! ```
//!
//! where a dispatch entry is either `huffman(END_OF_STRING)` followed by the policy bits of the
//! name ending here, or `huffman(c)` followed by a jump to the child for character `c`. Entries
//! are sorted by character. Children are written before their parent, so the first jump of a
//! node is a backward delta from the node's own offset; later jumps are forward deltas from the
//! previous child.

use crate::{
    preload::{bitreader::BitReader, huffman::HuffmanDecoder, PreloadResult},
    Result,
};

/// Dispatch symbol: a name ends at this node.
pub(crate) const END_OF_STRING: u8 = 0;
/// Dispatch symbol: no more entries in this node.
pub(crate) const END_OF_TABLE: u8 = 127;

/// Bits used for a pinset id.
pub(crate) const PINSET_ID_BITS: u32 = 4;
/// Bits used for a domain id.
pub(crate) const DOMAIN_ID_BITS: u32 = 9;
/// Bits announcing the width of a node's first jump.
pub(crate) const FIRST_JUMP_WIDTH_BITS: u32 = 5;
/// Width of a short forward jump.
pub(crate) const SHORT_JUMP_BITS: u32 = 7;
/// Bits announcing the extra width of a long forward jump.
pub(crate) const LONG_JUMP_WIDTH_BITS: u32 = 4;
/// Minimum width of a long forward jump.
pub(crate) const LONG_JUMP_BASE_BITS: u32 = 8;

/// Resolves hostnames against one trie.
#[derive(Debug, Clone, Copy)]
pub struct TrieDecoder<'a> {
    huffman: HuffmanDecoder<'a>,
    trie: &'a [u8],
    trie_bits: usize,
    root: usize,
}

impl<'a> TrieDecoder<'a> {
    /// Create a decoder.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the Huffman table is invalid, the bit length does
    /// not fit `trie`, or the root lies outside the bit-stream.
    pub fn new(huffman_tree: &'a [u8], trie: &'a [u8], trie_bits: usize, root: usize) -> Result<Self> {
        let huffman = HuffmanDecoder::new(huffman_tree)?;
        if trie_bits.div_ceil(8) > trie.len() {
            return Err(malformed_error!(
                "Trie bit length {} exceeds {} bytes",
                trie_bits,
                trie.len()
            ));
        }
        if root >= trie_bits {
            return Err(malformed_error!(
                "Trie root {} lies outside {} bits",
                root,
                trie_bits
            ));
        }

        Ok(TrieDecoder {
            huffman,
            trie,
            trie_bits,
            root,
        })
    }

    /// Find the most specific entry that applies to `hostname`.
    ///
    /// An entry applies if it names the host exactly, or names a parent domain and includes
    /// subdomains for HSTS or for pinning. `hostname` must already be lowercase. Returns
    /// `Ok(None)` when no entry applies; `hostname_offset` of a result is the byte offset in
    /// `hostname` where the matched entry's name begins.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the trie data is
    /// inconsistent.
    pub fn decode(&self, hostname: &[u8]) -> Result<Option<PreloadResult>> {
        if hostname.is_empty() {
            return Ok(None);
        }

        let mut reader = BitReader::new(self.trie, self.trie_bits)?;
        let mut bit_offset = self.root;
        let mut hostname_offset = hostname.len();
        let mut found = false;
        let mut result = PreloadResult::default();

        loop {
            reader.seek(bit_offset)?;

            let prefix_length = reader.unary()?;
            for _ in 0..prefix_length {
                if hostname_offset == 0 {
                    return Ok(found.then_some(result));
                }
                let c = self.huffman.decode(&mut reader)?;
                if hostname[hostname_offset - 1] != c {
                    return Ok(found.then_some(result));
                }
                hostname_offset -= 1;
            }

            let mut is_first_offset = true;
            let mut current_offset = 0_usize;
            loop {
                let c = self.huffman.decode(&mut reader)?;
                if c == END_OF_TABLE {
                    return Ok(found.then_some(result));
                }

                if c == END_OF_STRING {
                    let mut entry = PreloadResult {
                        sts_include_subdomains: reader.next()?,
                        force_https: reader.next()?,
                        has_pins: reader.next()?,
                        hostname_offset,
                        ..PreloadResult::default()
                    };
                    entry.pkp_include_subdomains = entry.sts_include_subdomains;
                    if entry.has_pins {
                        entry.pinset_id = reader.read(PINSET_ID_BITS)?;
                        entry.domain_id = reader.read(DOMAIN_ID_BITS)?;
                        if !entry.sts_include_subdomains {
                            entry.pkp_include_subdomains = reader.next()?;
                        }
                    }

                    if hostname_offset == 0 {
                        return Ok(Some(entry));
                    }
                    if hostname[hostname_offset - 1] == b'.' {
                        found = entry.sts_include_subdomains || entry.pkp_include_subdomains;
                        entry.force_https &= entry.sts_include_subdomains;
                        result = entry;
                    }
                    continue;
                }

                if hostname_offset == 0 || hostname[hostname_offset - 1] < c {
                    return Ok(found.then_some(result));
                }

                if is_first_offset {
                    let width = reader.read(FIRST_JUMP_WIDTH_BITS)?;
                    let delta = reader.read(width)? as usize;
                    if bit_offset < delta {
                        return Err(malformed_error!(
                            "Backward jump of {} from bit {}",
                            delta,
                            bit_offset
                        ));
                    }
                    current_offset = bit_offset - delta;
                    is_first_offset = false;
                } else {
                    let delta = if reader.next()? {
                        let width = reader.read(LONG_JUMP_WIDTH_BITS)?;
                        reader.read(width + LONG_JUMP_BASE_BITS)?
                    } else {
                        reader.read(SHORT_JUMP_BITS)?
                    } as usize;

                    current_offset += delta;
                    if current_offset >= bit_offset {
                        return Err(malformed_error!(
                            "Forward jump to {} does not precede node at {}",
                            current_offset,
                            bit_offset
                        ));
                    }
                }

                if hostname[hostname_offset - 1] == c {
                    bit_offset = current_offset;
                    hostname_offset -= 1;
                    break;
                }
            }
        }
    }
}
