//! Remembered pin decisions and per-thread URL slots.
//!
//! Once a user has allowed or denied a host whose chain failed pin verification, later
//! handshakes to the same host reuse that answer instead of prompting again. Decisions are keyed
//! by lowercase host and live until they are explicitly forgotten; there is no eviction.
//!
//! TLS libraries whose verify callbacks cannot carry user data learn the URL being fetched from
//! a per-thread slot: the integration layer stores the URL before starting the request and
//! clears it afterwards, and the callback reads it back on the same thread.
//!
//! Both maps are sharded concurrent maps. Every operation holds a shard lock only for the
//! duration of that single call, never across a consent prompt or a trie lookup.

use std::thread::{self, ThreadId};

use dashmap::DashMap;
use log::debug;

use crate::{url::extract_hostname, Result};

/// A remembered answer for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum Decision {
    /// Nothing remembered
    #[default]
    Unknown,
    /// Connections are allowed despite a pin mismatch
    Allowed,
    /// Connections are refused
    Denied,
}

/// Thread-safe store of host decisions and current URLs.
#[derive(Debug, Default)]
pub struct DecisionCache {
    urls: DashMap<ThreadId, String>,
    decisions: DashMap<String, Decision>,
}

impl DecisionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        DecisionCache::default()
    }

    /// Store the URL `thread` is about to fetch.
    pub fn set_current_url(&self, thread: ThreadId, url: impl Into<String>) {
        self.urls.insert(thread, url.into());
    }

    /// The URL stored for `thread`.
    #[must_use]
    pub fn get_current_url(&self, thread: ThreadId) -> Option<String> {
        self.urls.get(&thread).map(|url| url.value().clone())
    }

    /// Forget the URL of `thread`.
    pub fn clear_current_url(&self, thread: ThreadId) {
        self.urls.remove(&thread);
    }

    /// Forget the URLs of all threads.
    pub fn clear_all_current_urls(&self) {
        self.urls.clear();
    }

    /// [`DecisionCache::set_current_url`] for the calling thread.
    pub fn set_url(&self, url: impl Into<String>) {
        self.set_current_url(thread::current().id(), url);
    }

    /// [`DecisionCache::get_current_url`] for the calling thread.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.get_current_url(thread::current().id())
    }

    /// [`DecisionCache::clear_current_url`] for the calling thread.
    pub fn erase_url(&self) {
        self.clear_current_url(thread::current().id());
    }

    /// Remember `decision` for `hostname`. Recording [`Decision::Unknown`] forgets the host.
    pub fn record_decision(&self, hostname: &str, decision: Decision) {
        let hostname = hostname.to_ascii_lowercase();
        debug!("Remembering decision {decision} for '{hostname}'");

        match decision {
            Decision::Unknown => {
                self.decisions.remove(&hostname);
            }
            _ => {
                self.decisions.insert(hostname, decision);
            }
        }
    }

    /// The decision remembered for `hostname`.
    #[must_use]
    pub fn get_decision(&self, hostname: &str) -> Decision {
        self.decisions
            .get(&hostname.to_ascii_lowercase())
            .map(|decision| *decision.value())
            .unwrap_or_default()
    }

    /// Remember `decision` for the host of `url`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidUrl`] if no host can be extracted.
    pub fn record_decision_for_url(&self, url: &str, decision: Decision) -> Result<()> {
        self.record_decision(&extract_hostname(url)?, decision);
        Ok(())
    }

    /// The decision remembered for the host of `url`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidUrl`] if no host can be extracted.
    pub fn decision_for_url(&self, url: &str) -> Result<Decision> {
        Ok(self.get_decision(&extract_hostname(url)?))
    }

    /// Forget the decision for `hostname`.
    pub fn forget(&self, hostname: &str) {
        self.decisions.remove(&hostname.to_ascii_lowercase());
    }

    /// Forget all decisions.
    pub fn clear_decisions(&self) {
        self.decisions.clear();
    }

    /// Number of remembered decisions.
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
}
