use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};

use crate::{
    preload::{builder::bitwriter::BitWriter, huffman::LEAF_FLAG},
    Error, Result,
};

/// Largest number of internal nodes a table can address with 7-bit indices.
const MAX_NODES: usize = 128;

/// Collects symbol frequencies for the trie's Huffman table.
#[derive(Debug, Default)]
pub(crate) struct HuffmanBuilder {
    frequencies: BTreeMap<u8, u64>,
}

enum Node {
    Leaf(u8),
    Internal(usize, usize),
}

/// A finished table together with the code of each symbol.
#[derive(Debug)]
pub(crate) struct HuffmanCode {
    table: Vec<u8>,
    codes: BTreeMap<u8, Vec<bool>>,
}

impl HuffmanBuilder {
    pub(crate) fn new() -> Self {
        HuffmanBuilder::default()
    }

    pub(crate) fn record(&mut self, symbol: u8) {
        *self.frequencies.entry(symbol).or_insert(0) += 1;
    }

    /// Build the tree. Ties are broken by creation order so the output is deterministic.
    pub(crate) fn build(mut self) -> Result<HuffmanCode> {
        if self.frequencies.keys().any(|symbol| *symbol & LEAF_FLAG != 0) {
            return Err(Error::InvalidParameter(
                "Huffman symbols must be 7-bit values".to_string(),
            ));
        }

        // A tree needs at least two leaves; pad with an unused symbol.
        while self.frequencies.len() < 2 {
            let Some(filler) = (0..LEAF_FLAG).find(|s| !self.frequencies.contains_key(s)) else {
                break;
            };
            self.frequencies.insert(filler, 0);
        }

        let mut nodes = Vec::new();
        let mut heap = BinaryHeap::new();
        for (&symbol, &frequency) in &self.frequencies {
            heap.push(Reverse((frequency, nodes.len())));
            nodes.push(Node::Leaf(symbol));
        }

        while heap.len() > 1 {
            let (Some(Reverse((left_weight, left))), Some(Reverse((right_weight, right)))) =
                (heap.pop(), heap.pop())
            else {
                break;
            };
            heap.push(Reverse((left_weight + right_weight, nodes.len())));
            nodes.push(Node::Internal(left, right));
        }

        let Some(Reverse((_, root))) = heap.pop() else {
            return Err(Error::InternalError("Empty Huffman tree".to_string()));
        };

        let mut table = Vec::new();
        serialize(&nodes, root, &mut table)?;

        let mut codes = BTreeMap::new();
        assign_codes(&nodes, root, &mut Vec::new(), &mut codes);

        Ok(HuffmanCode { table, codes })
    }
}

/// Writes the subtree children first and returns the byte that refers to `node`.
fn serialize(nodes: &[Node], node: usize, table: &mut Vec<u8>) -> Result<u8> {
    match nodes[node] {
        Node::Leaf(symbol) => Ok(symbol | LEAF_FLAG),
        Node::Internal(left, right) => {
            let left = serialize(nodes, left, table)?;
            let right = serialize(nodes, right, table)?;
            let index = table.len() / 2;
            if index >= MAX_NODES {
                return Err(Error::InvalidParameter(
                    "Huffman table exceeds 128 nodes".to_string(),
                ));
            }
            table.push(left);
            table.push(right);
            // index < 128, never collides with LEAF_FLAG
            Ok(index as u8)
        }
    }
}

fn assign_codes(
    nodes: &[Node],
    node: usize,
    prefix: &mut Vec<bool>,
    codes: &mut BTreeMap<u8, Vec<bool>>,
) {
    match nodes[node] {
        Node::Leaf(symbol) => {
            codes.insert(symbol, prefix.clone());
        }
        Node::Internal(left, right) => {
            prefix.push(false);
            assign_codes(nodes, left, prefix, codes);
            prefix.pop();
            prefix.push(true);
            assign_codes(nodes, right, prefix, codes);
            prefix.pop();
        }
    }
}

impl HuffmanCode {
    /// The serialized table, root last.
    pub(crate) fn table(&self) -> &[u8] {
        &self.table
    }

    pub(crate) fn write(&self, symbol: u8, writer: &mut BitWriter) -> Result<()> {
        let Some(code) = self.codes.get(&symbol) else {
            return Err(Error::InternalError(format!(
                "Symbol {symbol} missing from Huffman table"
            )));
        };

        for &bit in code {
            writer.write_bit(bit);
        }
        Ok(())
    }
}
