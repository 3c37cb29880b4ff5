//! Offline encoder for pin databases.
//!
//! [`PreloadBuilder`] turns a list of host entries and pinsets into a [`PreloadedDatabase`] in
//! the exact layout [`crate::preload::trie::TrieDecoder`] reads. The built-in database is
//! produced this way, and distributors can use it to ship their own pin lists through
//! [`PreloadedDatabase::to_bytes`].
//!
//! # Usage Examples
//!
//! ```rust
//! use pinscope::prelude::*;
//!
//! let pin = HashValue::sha1(b"example SPKI").to_pin();
//! let db = PreloadBuilder::new()
//!     .pinset(Pinset::new(0, "example").accept(pin))
//!     .entry(PreloadEntry::new("example.com", true, true).with_pins(PinPolicy::new(0, 1, true)))
//!     .build()?;
//!
//! let policy = db.lookup("www.example.com")?.expect("subdomains are covered");
//! assert!(policy.has_pins);
//! # Ok::<(), pinscope::Error>(())
//! ```

mod bitwriter;
mod huffman;
mod trie;

use crate::{
    pins::{PinIdentifier, Pinset},
    preload::{
        trie::{DOMAIN_ID_BITS, END_OF_TABLE, PINSET_ID_BITS},
        PreloadedDatabase,
    },
    Error, Result,
};

use self::{bitwriter::BitWriter, huffman::HuffmanBuilder, trie::TrieNode};

/// Pinning policy of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPolicy {
    /// Index into the pinset table, below 16
    pub pinset_id: u32,
    /// Identifier reported for the domain, below 512
    pub domain_id: u32,
    /// Whether the pins also apply to subdomains
    pub include_subdomains: bool,
}

impl PinPolicy {
    /// Create a pin policy.
    #[must_use]
    pub fn new(pinset_id: u32, domain_id: u32, include_subdomains: bool) -> Self {
        PinPolicy {
            pinset_id,
            domain_id,
            include_subdomains,
        }
    }
}

/// One host in the preload list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadEntry {
    /// Lowercase ASCII hostname
    pub hostname: String,
    /// HSTS applies to subdomains
    pub include_subdomains: bool,
    /// Plain HTTP must be upgraded
    pub force_https: bool,
    /// Pinning policy, if the host is pinned
    pub pins: Option<PinPolicy>,
}

impl PreloadEntry {
    /// Create an entry without pins.
    pub fn new(hostname: impl Into<String>, include_subdomains: bool, force_https: bool) -> Self {
        PreloadEntry {
            hostname: hostname.into(),
            include_subdomains,
            force_https,
            pins: None,
        }
    }

    /// Attach a pinning policy.
    #[must_use]
    pub fn with_pins(mut self, pins: PinPolicy) -> Self {
        self.pins = Some(pins);
        self
    }

    fn validate(&self, pinsets: &[Pinset]) -> Result<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidParameter(format!(
                "Entry '{}': {}",
                self.hostname, reason
            )))
        };

        if self.hostname.is_empty() {
            return invalid("empty hostname");
        }
        if self
            .hostname
            .bytes()
            .any(|b| b == 0 || b >= END_OF_TABLE || b.is_ascii_uppercase())
        {
            return invalid("hostname must be lowercase ASCII");
        }

        let Some(pins) = &self.pins else {
            return Ok(());
        };
        if pins.pinset_id >= 1 << PINSET_ID_BITS || pins.pinset_id as usize >= pinsets.len() {
            return invalid("unknown pinset");
        }
        if pins.domain_id >= 1 << DOMAIN_ID_BITS {
            return invalid("domain id out of range");
        }
        if self.include_subdomains && !pins.include_subdomains {
            return invalid("HSTS subdomains imply pinning subdomains");
        }

        Ok(())
    }
}

/// Collects entries and pinsets and encodes them into a database.
#[derive(Debug, Default, Clone)]
pub struct PreloadBuilder {
    pinsets: Vec<Pinset>,
    entries: Vec<PreloadEntry>,
}

impl PreloadBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        PreloadBuilder::default()
    }

    /// Add a pinset. Its id must equal the number of pinsets added before it.
    #[must_use]
    pub fn pinset(mut self, pinset: Pinset) -> Self {
        self.pinsets.push(pinset);
        self
    }

    /// Add a host entry.
    #[must_use]
    pub fn entry(mut self, entry: PreloadEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add several host entries.
    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = PreloadEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Validate the input and encode it.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] for out-of-order pinset ids, unparsable pins,
    /// duplicate or non-lowercase hostnames, out-of-range ids, and for an entry whose HSTS policy
    /// includes subdomains while its pins do not (the format cannot express that).
    pub fn build(self) -> Result<PreloadedDatabase> {
        for (index, pinset) in self.pinsets.iter().enumerate() {
            if pinset.id as usize != index {
                return Err(Error::InvalidParameter(format!(
                    "Pinset '{}' has id {} but is at position {}",
                    pinset.name, pinset.id, index
                )));
            }
            if pinset.name.len() > usize::from(u8::MAX) {
                return Err(Error::InvalidParameter(format!(
                    "Pinset name '{}' is too long",
                    pinset.name
                )));
            }
            for pin in pinset.accepted_pins.iter().chain(&pinset.rejected_pins) {
                check_pin(pin)?;
            }
        }
        for entry in &self.entries {
            entry.validate(&self.pinsets)?;
        }

        let root = TrieNode::build(&self.entries)?;

        let mut huffman = HuffmanBuilder::new();
        root.count_symbols(&mut huffman);
        let code = huffman.build()?;

        let mut out = BitWriter::new();
        let root_position = root.write(&code, &mut out)?;
        let (trie, trie_bits) = out.into_parts();

        PreloadedDatabase::from_parts(
            code.table().to_vec(),
            trie,
            trie_bits,
            root_position,
            self.pinsets,
        )
    }
}

fn check_pin(pin: &PinIdentifier) -> Result<()> {
    if pin.as_str().len() > usize::from(u8::MAX) {
        return Err(Error::InvalidParameter(format!("Pin '{pin}' is too long")));
    }
    PinIdentifier::parse(pin.as_str()).map(|_| ())
}
