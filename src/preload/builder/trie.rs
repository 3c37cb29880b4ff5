//! Trie layout for the builder.
//!
//! Names are reversed and terminated with [`END_OF_STRING`], sorted, and split into nodes at the
//! point where their longest common prefix ends. Nodes are emitted children first so every jump
//! target precedes the node that refers to it.

use crate::{
    preload::{
        builder::{bitwriter::BitWriter, huffman::HuffmanBuilder, huffman::HuffmanCode, PreloadEntry},
        trie::{
            DOMAIN_ID_BITS, END_OF_STRING, END_OF_TABLE, FIRST_JUMP_WIDTH_BITS,
            LONG_JUMP_BASE_BITS, LONG_JUMP_WIDTH_BITS, PINSET_ID_BITS, SHORT_JUMP_BITS,
        },
    },
    Error, Result,
};

pub(crate) struct TrieNode<'a> {
    prefix: Vec<u8>,
    dispatch: Vec<Dispatch<'a>>,
}

enum Dispatch<'a> {
    Terminal(&'a PreloadEntry),
    Child(u8, TrieNode<'a>),
}

/// Reversed, terminated name paired with its entry.
type Name<'a> = (Vec<u8>, &'a PreloadEntry);

impl<'a> TrieNode<'a> {
    /// Build the tree for `entries`. Hostnames must be validated and unique.
    pub(crate) fn build(entries: &'a [PreloadEntry]) -> Result<TrieNode<'a>> {
        let mut names: Vec<Name<'a>> = entries
            .iter()
            .map(|entry| {
                let mut name: Vec<u8> = entry.hostname.bytes().rev().collect();
                name.push(END_OF_STRING);
                (name, entry)
            })
            .collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));

        if names.is_empty() {
            return Ok(TrieNode {
                prefix: Vec::new(),
                dispatch: Vec::new(),
            });
        }

        build_node(names)
    }

    /// Feed every symbol the node will emit into `huffman`.
    pub(crate) fn count_symbols(&self, huffman: &mut HuffmanBuilder) {
        for &c in &self.prefix {
            huffman.record(c);
        }
        for dispatch in &self.dispatch {
            match dispatch {
                Dispatch::Terminal(_) => huffman.record(END_OF_STRING),
                Dispatch::Child(c, child) => {
                    huffman.record(*c);
                    child.count_symbols(huffman);
                }
            }
        }
        huffman.record(END_OF_TABLE);
    }

    /// Emit the subtree and return the bit offset of this node.
    pub(crate) fn write(&self, code: &HuffmanCode, out: &mut BitWriter) -> Result<usize> {
        let mut children = Vec::new();
        for dispatch in &self.dispatch {
            if let Dispatch::Child(_, child) = dispatch {
                children.push(child.write(code, out)?);
            }
        }

        let position = out.len();
        let mut node = BitWriter::new();

        node.write_unary(self.prefix.len());
        for &c in &self.prefix {
            code.write(c, &mut node)?;
        }

        let mut children = children.into_iter();
        let mut previous: Option<usize> = None;
        for dispatch in &self.dispatch {
            match dispatch {
                Dispatch::Terminal(entry) => {
                    code.write(END_OF_STRING, &mut node)?;
                    write_policy(entry, &mut node);
                }
                Dispatch::Child(c, _) => {
                    let Some(target) = children.next() else {
                        return Err(Error::InternalError("Trie child offset missing".to_string()));
                    };
                    code.write(*c, &mut node)?;
                    match previous {
                        None => write_first_jump(position - target, &mut node)?,
                        Some(previous) => write_next_jump(target - previous, &mut node)?,
                    }
                    previous = Some(target);
                }
            }
        }
        code.write(END_OF_TABLE, &mut node)?;

        out.append(&node);
        Ok(position)
    }
}

fn build_node<'a>(mut names: Vec<Name<'a>>) -> Result<TrieNode<'a>> {
    let prefix = common_prefix(&names);
    for (name, _) in &mut names {
        name.drain(..prefix.len());
    }

    let mut dispatch = Vec::new();
    let mut names = names.into_iter().peekable();
    while let Some((name, entry)) = names.next() {
        let c = name[0];
        if c == END_OF_STRING {
            if let Some((_, duplicate)) = names.peek() {
                if duplicate.hostname == entry.hostname {
                    return Err(Error::InvalidParameter(format!(
                        "Duplicate entry for '{}'",
                        entry.hostname
                    )));
                }
            }
            dispatch.push(Dispatch::Terminal(entry));
            continue;
        }

        let mut group = vec![(name[1..].to_vec(), entry)];
        while let Some((next, _)) = names.peek() {
            if next[0] != c {
                break;
            }
            if let Some((next, entry)) = names.next() {
                group.push((next[1..].to_vec(), entry));
            }
        }
        dispatch.push(Dispatch::Child(c, build_node(group)?));
    }

    Ok(TrieNode { prefix, dispatch })
}

/// Longest common prefix of sorted names, never including the terminator.
fn common_prefix(names: &[Name<'_>]) -> Vec<u8> {
    let (Some((first, _)), Some((last, _))) = (names.first(), names.last()) else {
        return Vec::new();
    };

    first
        .iter()
        .zip(last.iter())
        .take_while(|(a, b)| a == b && **a != END_OF_STRING)
        .map(|(a, _)| *a)
        .collect()
}

fn write_policy(entry: &PreloadEntry, out: &mut BitWriter) {
    out.write_bit(entry.include_subdomains);
    out.write_bit(entry.force_https);
    match &entry.pins {
        Some(pins) => {
            out.write_bit(true);
            out.write_bits(pins.pinset_id, PINSET_ID_BITS);
            out.write_bits(pins.domain_id, DOMAIN_ID_BITS);
            if !entry.include_subdomains {
                out.write_bit(pins.include_subdomains);
            }
        }
        None => out.write_bit(false),
    }
}

fn bit_width(value: usize) -> u32 {
    usize::BITS - value.leading_zeros()
}

fn write_first_jump(delta: usize, out: &mut BitWriter) -> Result<()> {
    let width = bit_width(delta);
    if width >= 1 << FIRST_JUMP_WIDTH_BITS {
        return Err(Error::InvalidParameter(format!("Trie jump of {delta} bits is too long")));
    }

    out.write_bits(width, FIRST_JUMP_WIDTH_BITS);
    out.write_bits(delta as u32, width);
    Ok(())
}

fn write_next_jump(delta: usize, out: &mut BitWriter) -> Result<()> {
    if delta < 1 << SHORT_JUMP_BITS {
        out.write_bit(false);
        out.write_bits(delta as u32, SHORT_JUMP_BITS);
        return Ok(());
    }

    let width = bit_width(delta);
    let extra = width - LONG_JUMP_BASE_BITS;
    if extra >= 1 << LONG_JUMP_WIDTH_BITS {
        return Err(Error::InvalidParameter(format!("Trie jump of {delta} bits is too long")));
    }

    out.write_bit(true);
    out.write_bits(extra, LONG_JUMP_WIDTH_BITS);
    out.write_bits(delta as u32, width);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::bitreader::BitReader;

    #[test]
    fn test_common_prefix_stops_at_terminator() {
        let entry = PreloadEntry::new("x", false, false);
        let names = vec![(b"ab\0".to_vec(), &entry), (b"abc\0".to_vec(), &entry)];
        assert_eq!(common_prefix(&names), b"ab");

        let names = vec![(b"ab\0".to_vec(), &entry)];
        assert_eq!(common_prefix(&names), b"ab");
    }

    #[test]
    fn test_shared_suffixes_become_one_node() {
        let entries = vec![
            PreloadEntry::new("a.example.com", false, false),
            PreloadEntry::new("b.example.com", false, false),
        ];
        let root = TrieNode::build(&entries).unwrap();
        assert_eq!(root.prefix, b"moc.elpmaxe.");
        assert_eq!(root.dispatch.len(), 2);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let entries = vec![
            PreloadEntry::new("example.com", false, false),
            PreloadEntry::new("example.com", true, false),
        ];
        assert!(matches!(
            TrieNode::build(&entries),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_long_jumps() {
        let mut out = BitWriter::new();
        write_next_jump(127, &mut out).unwrap();
        write_next_jump(128, &mut out).unwrap();
        write_next_jump(5000, &mut out).unwrap();
        write_first_jump(0, &mut out).unwrap();
        let (bytes, bits) = out.into_parts();

        let mut reader = BitReader::new(&bytes, bits).unwrap();
        assert!(!reader.next().unwrap());
        assert_eq!(reader.read(SHORT_JUMP_BITS).unwrap(), 127);
        assert!(reader.next().unwrap());
        let extra = reader.read(LONG_JUMP_WIDTH_BITS).unwrap();
        assert_eq!(extra, 0);
        assert_eq!(reader.read(extra + LONG_JUMP_BASE_BITS).unwrap(), 128);
        assert!(reader.next().unwrap());
        let extra = reader.read(LONG_JUMP_WIDTH_BITS).unwrap();
        assert_eq!(extra, 5);
        assert_eq!(reader.read(extra + LONG_JUMP_BASE_BITS).unwrap(), 5000);
        assert_eq!(reader.read(FIRST_JUMP_WIDTH_BITS).unwrap(), 0);
        assert_eq!(reader.remaining(), 0);
    }
}
