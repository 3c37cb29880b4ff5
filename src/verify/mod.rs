//! Pin verification of peer certificate chains.
//!
//! [`PinVerifier`] ties the pieces together for a TLS verification callback: it extracts the
//! host from the request URL, consults the [`DecisionCache`], resolves the host's policy in a
//! [`PreloadedDatabase`], hashes the peer chain and matches it against the pinset. On a mismatch
//! it asks the configured [`ConsentPrompt`] and remembers the answer.
//!
//! [`Context`] is the per-connection state underneath, usable on its own when the caller already
//! has the public key hashes.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use pinscope::prelude::*;
//!
//! # fn chain() -> Vec<Vec<u8>> { Vec::new() }
//! let verifier = PinVerifier::default().with_consent(DenyAll);
//!
//! let status = verifier.verify_status("https://www.google.com/", &chain());
//! if !status.passed {
//!     println!("rejected with code {}", status.code.as_i32());
//! }
//! ```
//!
//! # Failure Handling
//!
//! [`PinVerifier::verify`] returns the precise [`Error`]. [`PinVerifier::verify_status`] is the
//! boundary for foreign callers: it never returns an error or unwinds, and reports the outcome
//! as a [`VerifyStatus`] carrying a stable [`ErrorCode`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use log::{debug, error, info, warn};

use crate::{
    cache::{Decision, DecisionCache},
    chain::{IssuerLookup, PubkeyHashExtractor},
    config::PinningConfig,
    consent::{ConsentPrompt, Response},
    pins::HashValue,
    preload::{PreloadResult, PreloadedDatabase},
    url::extract_hostname,
    Error, ErrorCode, Result,
};

/// Verification state of one connection.
#[derive(Debug, Clone)]
pub struct Context<'db> {
    hostname: String,
    preload: Option<PreloadResult>,
    hashes: Vec<HashValue>,
    database: &'db PreloadedDatabase,
}

impl<'db> Context<'db> {
    /// Resolve the policy of `hostname` in `database`.
    ///
    /// Damaged preload data resolves to "no policy".
    #[must_use]
    pub fn new(hostname: &str, database: &'db PreloadedDatabase) -> Self {
        let hostname = hostname.to_ascii_lowercase();
        let preload = database.resolve(&hostname);
        debug!(
            "Context for '{}' ready, pinned: {}",
            hostname,
            preload.is_some_and(|p| p.has_pins)
        );

        Context {
            hostname,
            preload,
            hashes: Vec::new(),
            database,
        }
    }

    /// Create a context for the host of `url`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidUrl`] if no host can be extracted.
    pub fn from_url(url: &str, database: &'db PreloadedDatabase) -> Result<Self> {
        Ok(Context::new(&extract_hostname(url)?, database))
    }

    /// The lowercase host.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The resolved policy, if any entry covers the host.
    #[must_use]
    pub fn preload(&self) -> Option<&PreloadResult> {
        self.preload.as_ref()
    }

    /// Returns `true` if the host is pinned.
    #[must_use]
    pub fn has_pins(&self) -> bool {
        self.preload.is_some_and(|p| p.has_pins)
    }

    /// Add the public key hash of one chain certificate.
    pub fn add_pubkey_hash(&mut self, hash: HashValue) {
        debug!("Adding public key hash {} for '{}'", hash, self.hostname);
        self.hashes.push(hash);
    }

    /// Add several public key hashes.
    pub fn add_pubkey_hashes(&mut self, hashes: impl IntoIterator<Item = HashValue>) {
        for hash in hashes {
            self.add_pubkey_hash(hash);
        }
    }

    /// The hashes added so far.
    #[must_use]
    pub fn hashes(&self) -> &[HashValue] {
        &self.hashes
    }

    /// Match the added hashes against the host's pinset. Unpinned hosts always match.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if a stored pin cannot be decoded, or
    /// [`Error::InternalError`] for SHA-256 hashes.
    pub fn check_pubkey_pins(&self) -> Result<bool> {
        match &self.preload {
            Some(preload) => self
                .database
                .matcher()
                .check_pubkey_pins(preload, &self.hashes),
            None => Ok(true),
        }
    }
}

/// Outcome of [`PinVerifier::verify_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyStatus {
    /// The connection may proceed
    pub passed: bool,
    /// [`ErrorCode::None`] on success, otherwise the failure's code
    pub code: ErrorCode,
}

impl VerifyStatus {
    fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => VerifyStatus {
                passed: true,
                code: ErrorCode::None,
            },
            Err(e) => VerifyStatus {
                passed: false,
                code: e.code(),
            },
        }
    }
}

/// Verifies peer chains against a pin database.
pub struct PinVerifier<'db> {
    database: &'db PreloadedDatabase,
    config: PinningConfig,
    extractor: PubkeyHashExtractor,
    consent: Option<Box<dyn ConsentPrompt>>,
    issuers: Option<Box<dyn IssuerLookup>>,
    cache: Arc<DecisionCache>,
}

impl Default for PinVerifier<'static> {
    fn default() -> Self {
        PinVerifier::new(PreloadedDatabase::builtin(), PinningConfig::default())
    }
}

impl<'db> PinVerifier<'db> {
    /// Create a verifier with its own decision cache and no consent prompt.
    #[must_use]
    pub fn new(database: &'db PreloadedDatabase, config: PinningConfig) -> Self {
        PinVerifier {
            database,
            config,
            extractor: PubkeyHashExtractor::default(),
            consent: None,
            issuers: None,
            cache: Arc::new(DecisionCache::new()),
        }
    }

    /// Ask `consent` when a chain does not match.
    #[must_use]
    pub fn with_consent(mut self, consent: impl ConsentPrompt + 'static) -> Self {
        self.consent = Some(Box::new(consent));
        self
    }

    /// Complete chains that stop short of a root using `issuers`.
    #[must_use]
    pub fn with_issuers(mut self, issuers: impl IssuerLookup + 'static) -> Self {
        self.issuers = Some(Box::new(issuers));
        self
    }

    /// Share `cache` with other verifiers.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DecisionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The decision cache, including the per-thread URL slots.
    #[must_use]
    pub fn cache(&self) -> &Arc<DecisionCache> {
        &self.cache
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PinningConfig {
        &self.config
    }

    /// The database.
    #[must_use]
    pub fn database(&self) -> &'db PreloadedDatabase {
        self.database
    }

    /// Verify `chain` (DER, leaf first) presented for `url`.
    ///
    /// # Errors
    /// - [`Error::InvalidUrl`] if `url` has no host
    /// - [`Error::InvalidPeerCertChain`] or [`Error::InvalidCertificate`] for an unusable chain
    ///   on a pinned host
    /// - [`Error::PubkeyMismatch`] if the host is denied, or the chain does not match and no
    ///   consent was given
    pub fn verify<C: AsRef<[u8]>>(&self, url: &str, chain: &[C]) -> Result<()> {
        let hostname = extract_hostname(url)?;
        self.verify_host(&hostname, chain)
    }

    /// [`PinVerifier::verify`] for a host name instead of a URL.
    ///
    /// # Errors
    /// As [`PinVerifier::verify`], without [`Error::InvalidUrl`].
    pub fn verify_host<C: AsRef<[u8]>>(&self, hostname: &str, chain: &[C]) -> Result<()> {
        match self.cache.get_decision(hostname) {
            Decision::Allowed => {
                debug!("'{hostname}' was allowed before");
                return Ok(());
            }
            Decision::Denied => {
                error!("'{hostname}' was denied before");
                return Err(Error::PubkeyMismatch(format!("{hostname} was denied")));
            }
            Decision::Unknown => {}
        }

        let mut context = Context::new(hostname, self.database);
        if !context.has_pins() {
            info!("No pins for '{}', skipping", context.hostname());
            return Ok(());
        }

        let hashes = match &self.issuers {
            Some(issuers) if self.config.max_chain_completion > 0 => self.extractor.extract_completed(
                chain,
                &**issuers,
                self.config.max_chain_completion,
            )?,
            _ => self.extractor.extract(chain)?,
        };
        context.add_pubkey_hashes(hashes);

        if context.check_pubkey_pins()? {
            debug!("Pins of '{}' matched", context.hostname());
            return Ok(());
        }

        error!("Public key pins of '{}' did not match", context.hostname());
        self.resolve_mismatch(context.hostname())
    }

    /// Verify `chain` for the URL stored in the calling thread's slot.
    ///
    /// # Errors
    /// [`Error::NoUrlData`] if the slot is empty, otherwise as [`PinVerifier::verify`].
    pub fn verify_current_thread<C: AsRef<[u8]>>(&self, chain: &[C]) -> Result<()> {
        let url = self.cache.url().ok_or(Error::NoUrlData)?;
        self.verify(&url, chain)
    }

    /// [`PinVerifier::verify`] reporting a [`VerifyStatus`]; panics become
    /// [`ErrorCode::Internal`].
    pub fn verify_status<C: AsRef<[u8]>>(&self, url: &str, chain: &[C]) -> VerifyStatus {
        guarded(|| self.verify(url, chain))
    }

    /// [`PinVerifier::verify_current_thread`] reporting a [`VerifyStatus`].
    pub fn verify_current_thread_status<C: AsRef<[u8]>>(&self, chain: &[C]) -> VerifyStatus {
        guarded(|| self.verify_current_thread(chain))
    }

    fn resolve_mismatch(&self, hostname: &str) -> Result<()> {
        let mismatch = || Error::PubkeyMismatch(hostname.to_string());

        let Some(consent) = self.consent.as_deref() else {
            return Err(mismatch());
        };
        if !self.config.interactive {
            return Err(mismatch());
        }

        match consent.ask_user(hostname, self.config.prompt_timeout) {
            Response::Allow => {
                info!("'{hostname}' allowed despite pin mismatch");
                self.remember(hostname, Decision::Allowed);
                Ok(())
            }
            Response::Deny => {
                self.remember(hostname, Decision::Denied);
                Err(mismatch())
            }
            Response::Error => {
                warn!("Consent prompt for '{hostname}' failed, denying");
                self.remember(hostname, Decision::Denied);
                Err(mismatch())
            }
        }
    }

    fn remember(&self, hostname: &str, decision: Decision) {
        if self.config.remember_decisions {
            self.cache.record_decision(hostname, decision);
        }
    }
}

fn guarded(verify: impl FnOnce() -> Result<()>) -> VerifyStatus {
    match panic::catch_unwind(AssertUnwindSafe(verify)) {
        Ok(result) => VerifyStatus::from_result(&result),
        Err(_) => {
            error!("Pin verification panicked");
            VerifyStatus {
                passed: false,
                code: ErrorCode::Internal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;
    use crate::{
        chain::TrustAnchors,
        consent::DenyAll,
        pins::{PinIdentifier, Pinset},
        preload::builder::{PinPolicy, PreloadBuilder, PreloadEntry},
        test::{pinned_database, CertFactory},
    };

    const URL: &str = "https://pinned.test/index.html";

    fn counting(response: Response) -> (Arc<AtomicUsize>, impl ConsentPrompt) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let prompt = move |_: &str, _: Duration| {
            counter.fetch_add(1, Ordering::SeqCst);
            response
        };
        (calls, prompt)
    }

    #[test]
    fn test_context_collects_hashes() {
        let ca = CertFactory::new("Context Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[]);

        let mut context = Context::from_url(URL, &db).unwrap();
        assert_eq!(context.hostname(), "pinned.test");
        assert!(context.has_pins());
        assert!(!context.check_pubkey_pins().unwrap());

        context.add_pubkey_hash(ca.hash());
        assert_eq!(context.hashes().len(), 1);
        assert!(context.check_pubkey_pins().unwrap());

        let context = Context::new("Elsewhere.Example", &db);
        assert_eq!(context.hostname(), "elsewhere.example");
        assert!(context.preload().is_none());
        assert!(context.check_pubkey_pins().unwrap());
    }

    #[test]
    fn test_matching_chain_passes() {
        let ca = CertFactory::new("Pinned Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());

        let chain = [ca.leaf("pinned.test"), ca.der()];
        verifier.verify(URL, &chain).unwrap();

        let chain = [ca.leaf("www.pinned.test"), ca.der()];
        verifier.verify("https://www.pinned.test", &chain).unwrap();
        assert_eq!(verifier.cache().decision_count(), 0);
    }

    #[test]
    fn test_mismatch_without_consent_fails() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());

        let chain = [other.leaf("pinned.test"), other.der()];
        assert!(matches!(
            verifier.verify(URL, &chain),
            Err(Error::PubkeyMismatch(_))
        ));
        assert_eq!(verifier.cache().get_decision("pinned.test"), Decision::Unknown);
    }

    #[test]
    fn test_rejected_pin_fails() {
        let ca = CertFactory::new("Revoked Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[ca.hash()]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());

        let chain = [ca.leaf("pinned.test"), ca.der()];
        assert!(verifier.verify(URL, &chain).is_err());
    }

    #[test]
    fn test_allowed_mismatch_is_remembered() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let (calls, prompt) = counting(Response::Allow);
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(prompt);

        let chain = [other.leaf("pinned.test"), other.der()];
        verifier.verify(URL, &chain).unwrap();
        verifier.verify(URL, &chain).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(verifier.cache().get_decision("pinned.test"), Decision::Allowed);
    }

    #[test]
    fn test_denied_host_stays_denied() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let (calls, prompt) = counting(Response::Deny);
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(prompt);

        let bad = [other.leaf("pinned.test"), other.der()];
        assert!(verifier.verify(URL, &bad).is_err());
        assert_eq!(verifier.cache().get_decision("pinned.test"), Decision::Denied);

        let good = [pinned.leaf("pinned.test"), pinned.der()];
        assert!(matches!(
            verifier.verify(URL, &good),
            Err(Error::PubkeyMismatch(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        verifier.cache().forget("pinned.test");
        verifier.verify(URL, &good).unwrap();
    }

    #[test]
    fn test_prompt_error_denies() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let (_, prompt) = counting(Response::Error);
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(prompt);

        let chain = [other.leaf("pinned.test"), other.der()];
        assert!(verifier.verify(URL, &chain).is_err());
        assert_eq!(verifier.cache().get_decision("pinned.test"), Decision::Denied);
    }

    #[test]
    fn test_strict_config_never_prompts() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let (calls, prompt) = counting(Response::Allow);
        let verifier = PinVerifier::new(&db, PinningConfig::strict()).with_consent(prompt);

        let chain = [other.leaf("pinned.test"), other.der()];
        assert!(verifier.verify(URL, &chain).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_forgetful_config_prompts_again() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let (calls, prompt) = counting(Response::Allow);
        let config = PinningConfig::default().with_remember_decisions(false);
        let verifier = PinVerifier::new(&db, config).with_consent(prompt);

        let chain = [other.leaf("pinned.test"), other.der()];
        verifier.verify(URL, &chain).unwrap();
        verifier.verify(URL, &chain).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(verifier.cache().decision_count(), 0);
    }

    #[test]
    fn test_unpinned_hosts_skip_chain() {
        let ca = CertFactory::new("Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(DenyAll);

        let garbage: [&[u8]; 1] = [b"not a certificate"];
        verifier.verify("https://unpinned.test/", &garbage).unwrap();
        verifier.verify("https://nowhere.example/", &garbage).unwrap();
    }

    #[test]
    fn test_unusable_chains() {
        let ca = CertFactory::new("Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());

        let empty: [Vec<u8>; 0] = [];
        assert!(matches!(
            verifier.verify(URL, &empty),
            Err(Error::InvalidPeerCertChain(_))
        ));

        let leaf_only = [ca.leaf("pinned.test")];
        assert!(matches!(
            verifier.verify(URL, &leaf_only),
            Err(Error::InvalidPeerCertChain(_))
        ));

        let garbage: [&[u8]; 1] = [b"not a certificate"];
        assert!(matches!(
            verifier.verify(URL, &garbage),
            Err(Error::InvalidCertificate(_))
        ));

        assert!(matches!(
            verifier.verify("https://", &empty),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_issuers_complete_chain() {
        let root = CertFactory::new("Anchor Root");
        let (intermediate, intermediate_der) = root.intermediate("Issuing CA");
        let db = pinned_database("pinned.test", &[root.hash()], &[]);
        let chain = [intermediate.leaf("pinned.test"), intermediate_der];

        let verifier = PinVerifier::new(&db, PinningConfig::default());
        assert!(verifier.verify(URL, &chain).is_err());

        let anchors = TrustAnchors::from_der([root.der()]).unwrap();
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_issuers(anchors);
        verifier.verify(URL, &chain).unwrap();

        let anchors = TrustAnchors::from_der([root.der()]).unwrap();
        let config = PinningConfig::default().with_max_chain_completion(0);
        let verifier = PinVerifier::new(&db, config).with_issuers(anchors);
        assert!(verifier.verify(URL, &chain).is_err());
    }

    #[test]
    fn test_current_thread_url() {
        let ca = CertFactory::new("Root");
        let db = pinned_database("pinned.test", &[ca.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());
        let chain = [ca.leaf("pinned.test"), ca.der()];

        assert!(matches!(
            verifier.verify_current_thread(&chain),
            Err(Error::NoUrlData)
        ));
        assert_eq!(
            verifier.verify_current_thread_status(&chain).code,
            ErrorCode::NoUrlData
        );

        verifier.cache().set_url(URL);
        verifier.verify_current_thread(&chain).unwrap();

        verifier.cache().erase_url();
        assert!(verifier.verify_current_thread(&chain).is_err());
    }

    #[test]
    fn test_status_reports_codes() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default());

        let good = [pinned.leaf("pinned.test"), pinned.der()];
        let status = verifier.verify_status(URL, &good);
        assert!(status.passed);
        assert_eq!(status.code, ErrorCode::None);

        let bad = [other.leaf("pinned.test"), other.der()];
        let status = verifier.verify_status(URL, &bad);
        assert!(!status.passed);
        assert_eq!(status.code, ErrorCode::PubkeyMismatch);

        assert_eq!(
            verifier.verify_status("::", &good).code,
            ErrorCode::InvalidUrl
        );
    }

    #[test]
    fn test_status_catches_panics() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let verifier = PinVerifier::new(&db, PinningConfig::default())
            .with_consent(|_: &str, _: Duration| -> Response { panic!("prompt crashed") });

        let chain = [other.leaf("pinned.test"), other.der()];
        let status = verifier.verify_status(URL, &chain);
        assert!(!status.passed);
        assert_eq!(status.code, ErrorCode::Internal);
    }

    #[test]
    fn test_sha256_pinned_host_fails_without_prompt() {
        let ca = CertFactory::new("Modern Root");
        let pin = PinIdentifier::parse("sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=").unwrap();
        let db = PreloadBuilder::new()
            .pinset(Pinset::new(0, "modern").accept(pin))
            .entry(PreloadEntry::new("pinned.test", true, true).with_pins(PinPolicy::new(0, 1, true)))
            .build()
            .unwrap();
        let (calls, prompt) = counting(Response::Allow);
        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(prompt);

        let chain = [ca.leaf("pinned.test"), ca.der()];
        assert!(matches!(
            verifier.verify(URL, &chain),
            Err(Error::InternalError(_))
        ));
        assert_eq!(verifier.verify_status(URL, &chain).code, ErrorCode::Internal);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(verifier.cache().decision_count(), 0);
    }

    #[test]
    fn test_shared_cache() {
        let pinned = CertFactory::new("Pinned Root");
        let other = CertFactory::new("Other Root");
        let db = pinned_database("pinned.test", &[pinned.hash()], &[]);
        let cache = Arc::new(DecisionCache::new());
        cache.record_decision("pinned.test", Decision::Allowed);

        let verifier = PinVerifier::new(&db, PinningConfig::default()).with_cache(cache.clone());
        let chain = [other.leaf("pinned.test"), other.der()];
        verifier.verify(URL, &chain).unwrap();
        assert!(Arc::ptr_eq(verifier.cache(), &cache));
    }
}
