//! # pinscope Prelude
//!
//! The types needed to verify peer chains, look up host policies and build pin databases,
//! for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pinscope operations
pub use crate::Error;

/// Stable integer codes for TLS adapters
pub use crate::ErrorCode;

/// The result type used throughout pinscope
pub use crate::Result;

// ================================================================================================
// Verification
// ================================================================================================

/// Verifier, per-connection context and boundary status
pub use crate::verify::{Context, PinVerifier, VerifyStatus};

/// Verifier configuration
pub use crate::config::PinningConfig;

/// Remembered decisions and per-thread URL slots
pub use crate::cache::{Decision, DecisionCache};

/// Consent prompt capability
pub use crate::consent::{ConsentPrompt, DenyAll, Response};

/// Chain hashing and issuer lookup
pub use crate::chain::{IssuerLookup, PubkeyHashExtractor, TrustAnchors};

/// Hostname extraction
pub use crate::url::extract_hostname;

// ================================================================================================
// Pin Database
// ================================================================================================

/// Database and host policy
pub use crate::preload::{PreloadResult, PreloadedDatabase};

/// Database construction
pub use crate::preload::builder::{PinPolicy, PreloadBuilder, PreloadEntry};

/// Pins, pinsets and matching
pub use crate::pins::{HashAlgo, HashValue, PinIdentifier, PinMatcher, Pinset};
