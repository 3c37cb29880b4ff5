// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
// - 'file/mod.rs' uses mmap to map a file into memory

//! # pinscope
//!
//! HTTP Public Key Pinning for TLS clients. `pinscope` decides whether the certificate chain a
//! server presented is acceptable for the host being contacted, based on a preloaded list of
//! pinned hosts and the SHA-1 hashes of the public keys each of them may use.
//!
//! ## Features
//!
//! - **Compact preload list** - Hosts are stored in a Huffman-coded, bit-packed trie that is
//!   matched backwards over the hostname, so parent domains cover their subdomains
//! - **Built-in and loadable databases** - A compiled-in list, or a container file mapped from
//!   disk and swapped without rebuilding
//! - **Chain hashing** - SubjectPublicKeyInfo hashing of DER chains, with optional completion
//!   from a trust store
//! - **Remembered decisions** - A thread-safe cache of hosts the user allowed or denied
//! - **Consent hook** - A synchronous prompt asked when a chain does not match
//! - **Stable error codes** - [`ErrorCode`] values for TLS library adapters
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use pinscope::prelude::*;
//!
//! # fn peer_chain() -> Vec<Vec<u8>> { Vec::new() }
//! let verifier = PinVerifier::default();
//! match verifier.verify("https://www.google.com/", &peer_chain()) {
//!     Ok(()) => println!("pins satisfied"),
//!     Err(Error::PubkeyMismatch(host)) => println!("unexpected key for {host}"),
//!     Err(e) => println!("verification failed: {e}"),
//! }
//! ```
//!
//! ### Policy Lookup
//!
//! ```rust
//! use pinscope::PreloadedDatabase;
//!
//! let db = PreloadedDatabase::builtin();
//! let policy = db.lookup("maps.google.com")?.expect("google.com is preloaded");
//! assert!(policy.has_pins);
//! assert!(!policy.is_exact());
//! # Ok::<(), pinscope::Error>(())
//! ```
//!
//! ### Building a Database
//!
//! ```rust
//! use pinscope::prelude::*;
//!
//! let pin = PinIdentifier::parse("sha1/vq7OyjSnqOco9nyMCDGdy77eijM=")?;
//! let db = PreloadBuilder::new()
//!     .pinset(Pinset::new(0, "corp").accept(pin))
//!     .entry(PreloadEntry::new("corp.example", true, true).with_pins(PinPolicy::new(0, 1, true)))
//!     .build()?;
//!
//! assert!(db.resolve("intranet.corp.example").is_some_and(|p| p.has_pins));
//! let bytes = db.to_bytes();
//! assert_eq!(PreloadedDatabase::from_bytes(&bytes)?.pinsets().len(), 1);
//! # Ok::<(), pinscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`preload`] - Trie decoding, database container and builder
//! - [`pins`] - Pin identifiers, pinsets and matching
//! - [`chain`] - Public key hashing of certificate chains
//! - [`cache`] - Remembered decisions and per-thread URL slots
//! - [`consent`] - Consent prompt capability and its wire format
//! - [`verify`] - The verifier used by TLS callbacks
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. The library never installs
//! a logger.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use pinscope::prelude::*;
///
/// let db = PreloadedDatabase::builtin();
/// assert!(db.resolve("thehackernews.com").is_none());
/// ```
pub mod prelude;

/// Preloaded pin database: Huffman-coded trie decoding, container format and builder.
pub mod preload;

/// Pin identifiers, pinsets and pin matching.
///
/// A pin is the text `sha1/` followed by the base64 SHA-1 digest of a DER
/// SubjectPublicKeyInfo. A [`pins::Pinset`] groups accepted and rejected pins; a chain satisfies
/// it if one of its keys is accepted and none is rejected.
pub mod pins;

/// Public key hashing of peer certificate chains.
pub mod chain;

/// Remembered host decisions and per-thread URL slots.
pub mod cache;

/// Consent prompt capability and its inter-process message format.
pub mod consent;

/// Verifier configuration.
pub mod config;

/// Pin verification of peer chains.
pub mod verify;

/// Hostname extraction from URLs.
pub mod url;

/// `pinscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
///
/// # Examples
///
/// ```rust
/// use pinscope::{Result, PreloadedDatabase};
///
/// fn pinned(host: &str) -> Result<bool> {
///     let policy = PreloadedDatabase::builtin().lookup(host)?;
///     Ok(policy.is_some_and(|p| p.has_pins))
/// }
/// # assert!(pinned("www.google.com").unwrap());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `pinscope` Error type and the integer codes reported to TLS adapters.
pub use error::{Error, ErrorCode};

/// The preloaded database and the policy it resolves for a host.
pub use preload::{PreloadResult, PreloadedDatabase};

/// Pins and pinsets.
pub use pins::{HashAlgo, HashValue, PinIdentifier, Pinset};

/// Verification entry points.
pub use verify::{Context, PinVerifier, VerifyStatus};

/// Decision cache.
pub use cache::{Decision, DecisionCache};

/// Verifier configuration.
pub use config::PinningConfig;

/// Host extraction from URLs.
pub use url::extract_hostname;

/// Provides access to low-level file and memory parsing utilities.
///
/// The [`Parser`] type decodes the little-endian fields of database containers and prompt
/// messages.
///
/// # Example
///
/// ```rust
/// use pinscope::Parser;
///
/// let mut parser = Parser::new(&[0x48, 0x50, 0x4B, 0x50, 0x01, 0x00]);
/// assert_eq!(parser.read_bytes(4)?, b"HPKP");
/// assert_eq!(parser.read_le::<u16>()?, 1);
/// # Ok::<(), pinscope::Error>(())
/// ```
pub use file::Parser;
