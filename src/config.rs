//! Verifier configuration.
//!
//! [`PinningConfig`] controls how a [`crate::PinVerifier`] reacts to a mismatch and how far it
//! goes to complete an incomplete peer chain.
//!
//! # Presets
//!
//! - [`PinningConfig::interactive()`] - Ask the consent prompt and remember the answer (default)
//! - [`PinningConfig::strict()`] - Never ask, fail every mismatch
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use pinscope::PinningConfig;
//!
//! let config = PinningConfig {
//!     prompt_timeout: Duration::from_secs(15),
//!     ..PinningConfig::default()
//! };
//! assert!(config.interactive);
//!
//! let config = PinningConfig::strict().with_max_chain_completion(0);
//! assert!(!config.interactive);
//! ```

use std::time::Duration;

/// Default time a consent prompt may take.
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of issuer certificates appended while completing a chain.
pub const DEFAULT_MAX_CHAIN_COMPLETION: usize = 4;

/// Verifier behavior settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinningConfig {
    /// Time the consent prompt may take before it is treated as a refusal.
    ///
    /// Passed to the prompt, which enforces it.
    pub prompt_timeout: Duration,

    /// Whether a configured consent prompt is asked on mismatch.
    ///
    /// When false every mismatch fails with [`crate::Error::PubkeyMismatch`].
    pub interactive: bool,

    /// Whether consent answers are stored in the decision cache.
    pub remember_decisions: bool,

    /// Maximum number of issuers looked up to complete a chain that does not end in a
    /// self-signed certificate. Zero disables completion.
    pub max_chain_completion: usize,
}

impl PinningConfig {
    /// Prompt on mismatch and remember the answer.
    #[must_use]
    pub fn interactive() -> Self {
        PinningConfig {
            prompt_timeout: DEFAULT_PROMPT_TIMEOUT,
            interactive: true,
            remember_decisions: true,
            max_chain_completion: DEFAULT_MAX_CHAIN_COMPLETION,
        }
    }

    /// Fail every mismatch without prompting.
    #[must_use]
    pub fn strict() -> Self {
        PinningConfig {
            interactive: false,
            remember_decisions: false,
            ..Self::interactive()
        }
    }

    /// Set the prompt timeout.
    #[must_use]
    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Enable or disable prompting.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Enable or disable remembering prompt answers.
    #[must_use]
    pub fn with_remember_decisions(mut self, remember: bool) -> Self {
        self.remember_decisions = remember;
        self
    }

    /// Set the chain completion depth.
    #[must_use]
    pub fn with_max_chain_completion(mut self, depth: usize) -> Self {
        self.max_chain_completion = depth;
        self
    }
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PinningConfig::default();
        assert_eq!(config.prompt_timeout, Duration::from_secs(60));
        assert!(config.interactive);
        assert!(config.remember_decisions);
        assert_eq!(config.max_chain_completion, 4);
    }

    #[test]
    fn test_strict_keeps_limits() {
        let config = PinningConfig::strict();
        assert!(!config.interactive);
        assert!(!config.remember_decisions);
        assert_eq!(config.prompt_timeout, DEFAULT_PROMPT_TIMEOUT);
    }

    #[test]
    fn test_builders() {
        let config = PinningConfig::default()
            .with_prompt_timeout(Duration::from_millis(10))
            .with_interactive(false)
            .with_remember_decisions(false)
            .with_max_chain_completion(1);
        assert_eq!(config.prompt_timeout, Duration::from_millis(10));
        assert!(!config.interactive);
        assert!(!config.remember_decisions);
        assert_eq!(config.max_chain_completion, 1);
    }
}
