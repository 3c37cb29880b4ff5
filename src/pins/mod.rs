//! Public key pins, pinsets and the hashes they are compared against.
//!
//! A pin is the digest of a certificate's DER-encoded SubjectPublicKeyInfo. Pin lists store pins
//! in their textual form, `sha1/<base64 digest>`, exactly as HPKP headers and the Chromium
//! preload list spell them. [`PinIdentifier`] keeps that text and decodes it the first time it
//! is compared, so a large compiled-in table costs nothing until a host actually needs it.
//!
//! # Key Components
//!
//! - [`HashAlgo`] / [`HashValue`] - A digest of one certificate's public key
//! - [`PinIdentifier`] - A pin in textual form, decoded lazily
//! - [`Pinset`] - Named accepted and rejected pin lists
//! - [`PinMatcher`] - The accept/reject decision for a resolved host

mod matcher;

pub use matcher::PinMatcher;

use std::{fmt, sync::OnceLock};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::{Digest, Sha1};

use crate::{Error, Result};

/// Digest algorithm of a pin or a computed public key hash.
///
/// Only SHA-1 is implemented. SHA-256 pins are recognised when parsing so that a pin list using
/// them is reported clearly, but hashing with SHA-256 or comparing SHA-256 values is an
/// [`Error::InternalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgo {
    /// SHA-1, 20 byte digests
    Sha1,
    /// SHA-256, 32 byte digests
    Sha256,
}

impl HashAlgo {
    /// Length of a digest in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgo::Sha1 => 20,
            HashAlgo::Sha256 => 32,
        }
    }

    fn from_prefix(prefix: &str) -> Option<HashAlgo> {
        match prefix {
            "sha1" => Some(HashAlgo::Sha1),
            "sha256" => Some(HashAlgo::Sha256),
            _ => None,
        }
    }

    /// Returns an error for algorithms that cannot be hashed or compared.
    ///
    /// # Errors
    /// Returns [`Error::InternalError`] for [`HashAlgo::Sha256`].
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            HashAlgo::Sha1 => Ok(()),
            HashAlgo::Sha256 => Err(Error::InternalError(
                "SHA-256 public key hashes are not supported".to_string(),
            )),
        }
    }
}

/// A digest of a DER-encoded SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashValue {
    algo: HashAlgo,
    digest: Vec<u8>,
}

impl HashValue {
    /// Wrap an existing digest.
    #[must_use]
    pub fn new(algo: HashAlgo, digest: Vec<u8>) -> Self {
        HashValue { algo, digest }
    }

    /// Hash `spki` with `algo`.
    ///
    /// # Errors
    /// Returns [`Error::InternalError`] if `algo` is not implemented.
    pub fn compute(algo: HashAlgo, spki: &[u8]) -> Result<Self> {
        algo.ensure_supported()?;

        let mut hasher = Sha1::new();
        hasher.update(spki);
        Ok(HashValue::new(algo, hasher.finalize().to_vec()))
    }

    /// SHA-1 of `spki`.
    #[must_use]
    pub fn sha1(spki: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(spki);
        HashValue::new(HashAlgo::Sha1, hasher.finalize().to_vec())
    }

    /// The digest algorithm.
    #[must_use]
    pub fn algo(&self) -> HashAlgo {
        self.algo
    }

    /// The raw digest bytes.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Textual pin form of this hash.
    #[must_use]
    pub fn to_pin(&self) -> PinIdentifier {
        PinIdentifier::from_digest(self.algo, &self.digest)
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.algo, STANDARD.encode(&self.digest))
    }
}

/// A pin in its textual form, `<algo>/<base64 digest>`.
///
/// Equality and hashing use the text only. The decoded digest is cached after the first use.
#[derive(Clone)]
pub struct PinIdentifier {
    text: String,
    decoded: OnceLock<HashValue>,
}

impl PinIdentifier {
    /// Wrap pin text without validating it.
    ///
    /// Invalid text is reported when the pin is first compared. Use [`PinIdentifier::parse`]
    /// for text from an untrusted source.
    pub fn new(text: impl Into<String>) -> Self {
        PinIdentifier {
            text: text.into(),
            decoded: OnceLock::new(),
        }
    }

    /// Parse and validate pin text.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if the algorithm prefix is unknown, the digest is not
    /// base64, or the digest length does not match the algorithm.
    pub fn parse(text: &str) -> Result<Self> {
        let pin = PinIdentifier::new(text);
        pin.decode()
            .map_err(|error| Error::InvalidParameter(format!("pin '{text}': {error}")))?;
        Ok(pin)
    }

    /// Build the textual form of `digest`.
    #[must_use]
    pub fn from_digest(algo: HashAlgo, digest: &[u8]) -> Self {
        let pin = PinIdentifier::new(format!("{}/{}", algo, STANDARD.encode(digest)));
        let _ = pin.decoded.set(HashValue::new(algo, digest.to_vec()));
        pin
    }

    /// The pin text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Decode the pin, caching the result.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the text is not a valid pin.
    pub fn decode(&self) -> Result<&HashValue> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }

        let value = decode_pin(&self.text)?;
        Ok(self.decoded.get_or_init(|| value))
    }

    /// Returns `true` if `hash` has the same algorithm and digest as this pin.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the pin text is invalid, and [`Error::InternalError`] if
    /// the pin or the hash uses an algorithm that cannot be compared.
    pub fn matches(&self, hash: &HashValue) -> Result<bool> {
        let pin = self.decode()?;
        pin.algo.ensure_supported()?;
        hash.algo.ensure_supported()?;
        Ok(pin.algo == hash.algo && pin.digest == hash.digest)
    }
}

fn decode_pin(text: &str) -> Result<HashValue> {
    let Some((prefix, encoded)) = text.split_once('/') else {
        return Err(malformed_error!("Pin '{}' has no algorithm prefix", text));
    };
    let Some(algo) = HashAlgo::from_prefix(prefix) else {
        return Err(malformed_error!("Pin '{}' uses unknown algorithm", text));
    };

    let digest = STANDARD
        .decode(encoded)
        .map_err(|error| malformed_error!("Pin '{}' is not base64 - {}", text, error))?;
    if digest.len() != algo.digest_len() {
        return Err(malformed_error!(
            "Pin '{}' has {} digest bytes, expected {}",
            text,
            digest.len(),
            algo.digest_len()
        ));
    }

    Ok(HashValue::new(algo, digest))
}

impl PartialEq for PinIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for PinIdentifier {}

impl std::hash::Hash for PinIdentifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Debug for PinIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PinIdentifier").field(&self.text).finish()
    }
}

impl fmt::Display for PinIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Accepted and rejected pins for a group of hosts.
///
/// The `id` is the pinset's position in its database's table; the trie refers to pinsets by
/// this id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pinset {
    /// Index in the pinset table
    pub id: u32,
    /// Human readable name, e.g. `google`
    pub name: String,
    /// A chain is accepted if one of its keys matches one of these
    pub accepted_pins: Vec<PinIdentifier>,
    /// A chain is rejected if one of its keys matches one of these, regardless of accepted pins
    pub rejected_pins: Vec<PinIdentifier>,
}

impl Pinset {
    /// Create an empty pinset.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Pinset {
            id,
            name: name.into(),
            accepted_pins: Vec::new(),
            rejected_pins: Vec::new(),
        }
    }

    /// Add an accepted pin.
    #[must_use]
    pub fn accept(mut self, pin: PinIdentifier) -> Self {
        self.accepted_pins.push(pin);
        self
    }

    /// Add a rejected pin.
    #[must_use]
    pub fn reject(mut self, pin: PinIdentifier) -> Self {
        self.rejected_pins.push(pin);
        self
    }
}
