//! The preloaded pin database and hostname policy lookup.
//!
//! A [`PreloadedDatabase`] bundles a Huffman table, a bit-packed trie of hostnames and the
//! pinset table the trie refers to. Looking up a host walks the trie backwards over the hostname
//! (see [`trie`]) and yields a [`PreloadResult`]: which pinset applies, whether subdomains are
//! covered, and whether plain HTTP must be upgraded.
//!
//! # Key Components
//!
//! - [`PreloadedDatabase`] - Immutable database, built in or loaded from bytes or a file
//! - [`PreloadResult`] - Policy of the most specific entry covering a host
//! - [`builder::PreloadBuilder`] - Encoder producing databases from host lists
//! - [`bitreader`], [`huffman`], [`trie`] - The decoding layers
//!
//! # Usage Examples
//!
//! ```rust
//! use pinscope::PreloadedDatabase;
//!
//! let db = PreloadedDatabase::builtin();
//! let policy = db.resolve("www.google.com").expect("google.com covers its subdomains");
//! assert!(policy.has_pins);
//! assert!(db.resolve("thehackernews.com").is_none());
//! ```
//!
//! # Failure Handling
//!
//! [`PreloadedDatabase::lookup`] reports inconsistent data as an error.
//! [`PreloadedDatabase::resolve`] logs it and answers "no policy" instead: a damaged pin list
//! must not make every TLS connection fail, and certificate trust is still verified upstream.

pub mod bitreader;
pub mod builder;
mod builtin;
mod container;
pub mod huffman;
pub mod trie;

use std::{io::Read, path::Path, sync::LazyLock};

use log::{error, warn};

use crate::{
    file::File,
    pins::{PinMatcher, Pinset},
    preload::trie::TrieDecoder,
    Result,
};

/// Policy of the most specific preload entry covering a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadResult {
    /// Index into the database's pinset table; meaningful only if `has_pins`
    pub pinset_id: u32,
    /// Identifier of the pinned domain; meaningful only if `has_pins`
    pub domain_id: u32,
    /// Byte offset in the hostname at which the matched entry's name begins
    pub hostname_offset: usize,
    /// HSTS applies to subdomains of the entry
    pub sts_include_subdomains: bool,
    /// Pins apply to subdomains of the entry
    pub pkp_include_subdomains: bool,
    /// Plain HTTP must be upgraded
    pub force_https: bool,
    /// The host is pinned
    pub has_pins: bool,
}

impl PreloadResult {
    /// Returns `true` if the entry names the host itself rather than a parent domain.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.hostname_offset == 0
    }
}

/// An immutable pin database.
#[derive(Debug, Clone)]
pub struct PreloadedDatabase {
    huffman_tree: Vec<u8>,
    trie: Vec<u8>,
    trie_bits: usize,
    root_position: usize,
    pinsets: Vec<Pinset>,
}

static BUILTIN: LazyLock<PreloadedDatabase> = LazyLock::new(|| match builtin::database() {
    Ok(db) => db,
    Err(e) => {
        error!("Built-in pin database failed to build, pinning disabled: {e}");
        PreloadedDatabase::empty()
    }
});

impl PreloadedDatabase {
    pub(crate) fn from_parts(
        huffman_tree: Vec<u8>,
        trie: Vec<u8>,
        trie_bits: usize,
        root_position: usize,
        pinsets: Vec<Pinset>,
    ) -> Result<Self> {
        TrieDecoder::new(&huffman_tree, &trie, trie_bits, root_position)?;

        Ok(PreloadedDatabase {
            huffman_tree,
            trie,
            trie_bits,
            root_position,
            pinsets,
        })
    }

    /// A database without entries.
    ///
    /// The Huffman table holds only the two table sentinels and the trie is a root node with an
    /// empty prefix and an empty dispatch table.
    #[must_use]
    pub fn empty() -> Self {
        PreloadedDatabase {
            huffman_tree: vec![0x80 | trie::END_OF_STRING, 0x80 | trie::END_OF_TABLE],
            // unary(0), END_OF_TABLE
            trie: vec![0b0100_0000],
            trie_bits: 2,
            root_position: 0,
            pinsets: Vec::new(),
        }
    }

    /// The database compiled into this library, built on first use.
    pub fn builtin() -> &'static PreloadedDatabase {
        &BUILTIN
    }

    /// Parse a database in container format.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for foreign data, [`crate::Error::OutOfBounds`]
    /// for truncated data and [`crate::Error::Malformed`] for inconsistent fields.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        container::read(data)
    }

    /// Memory-map and parse a database file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, otherwise as
    /// [`PreloadedDatabase::from_bytes`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::from_file(path)?;
        container::read(file.data())
    }

    /// Read and parse a database from a stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if reading fails, otherwise as
    /// [`PreloadedDatabase::from_bytes`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        container::read(&data)
    }

    /// Serialize into container format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        container::write(self)
    }

    /// A decoder over this database's trie.
    ///
    /// # Errors
    /// Never fails for a database constructed by this crate; the signature mirrors
    /// [`TrieDecoder::new`].
    pub fn decoder(&self) -> Result<TrieDecoder<'_>> {
        TrieDecoder::new(
            &self.huffman_tree,
            &self.trie,
            self.trie_bits,
            self.root_position,
        )
    }

    /// Look up the policy covering `hostname`.
    ///
    /// The hostname is lowercased first. A decoded pinset id outside the pinset table is
    /// treated as "no pins".
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the trie data is
    /// inconsistent.
    pub fn lookup(&self, hostname: &str) -> Result<Option<PreloadResult>> {
        let hostname = hostname.to_ascii_lowercase();
        let Some(mut result) = self.decoder()?.decode(hostname.as_bytes())? else {
            return Ok(None);
        };

        if result.has_pins && result.pinset_id as usize >= self.pinsets.len() {
            warn!(
                "Pinset {} of '{}' is outside a table of {}, ignoring pins",
                result.pinset_id,
                hostname,
                self.pinsets.len()
            );
            result.has_pins = false;
        }

        Ok(Some(result))
    }

    /// Like [`PreloadedDatabase::lookup`], but damaged data yields `None`.
    #[must_use]
    pub fn resolve(&self, hostname: &str) -> Option<PreloadResult> {
        match self.lookup(hostname) {
            Ok(result) => result,
            Err(e) => {
                error!("Preload lookup for '{hostname}' failed: {e}");
                None
            }
        }
    }

    /// All pinsets, indexed by id.
    #[must_use]
    pub fn pinsets(&self) -> &[Pinset] {
        &self.pinsets
    }

    /// A single pinset.
    #[must_use]
    pub fn pinset(&self, id: u32) -> Option<&Pinset> {
        self.pinsets.get(id as usize)
    }

    /// A matcher over this database's pinsets.
    #[must_use]
    pub fn matcher(&self) -> PinMatcher<'_> {
        PinMatcher::new(&self.pinsets)
    }

    pub(crate) fn raw_parts(&self) -> (&[u8], &[u8], usize, usize) {
        (
            &self.huffman_tree,
            &self.trie,
            self.trie_bits,
            self.root_position,
        )
    }
}

impl Default for PreloadedDatabase {
    fn default() -> Self {
        PreloadedDatabase::empty()
    }
}
