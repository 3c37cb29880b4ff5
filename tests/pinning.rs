//! End-to-end verification of generated certificate chains.
//!
//! These tests build small pin databases with the public builder, issue real certificates with
//! rcgen and run them through [`PinVerifier`] the way a TLS callback would.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use pinscope::prelude::*;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, Issuer, KeyPair,
};

struct Ca {
    der: Vec<u8>,
    issuer: Issuer<'static, KeyPair>,
}

impl Ca {
    fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut name = DistinguishedName::new();
        name.push(DnType::CommonName, common_name);
        params.distinguished_name = name;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let der = params.self_signed(&key).unwrap().der().to_vec();

        Ca {
            der,
            issuer: Issuer::new(params, key),
        }
    }

    fn chain(&self, host: &str) -> Vec<Vec<u8>> {
        let key = KeyPair::generate().unwrap();
        let params = CertificateParams::new(vec![host.to_string()]).unwrap();
        let leaf = params.signed_by(&key, &self.issuer).unwrap().der().to_vec();
        vec![leaf, self.der.clone()]
    }

    fn pin(&self) -> Result<PinIdentifier> {
        let hashes = PubkeyHashExtractor::default().extract(&[&self.der])?;
        Ok(hashes[0].to_pin())
    }
}

fn database(ca: &Ca) -> Result<PreloadedDatabase> {
    PreloadBuilder::new()
        .pinset(Pinset::new(0, "bank").accept(ca.pin()?))
        .entry(PreloadEntry::new("bank.example", true, true).with_pins(PinPolicy::new(0, 1, true)))
        .entry(PreloadEntry::new("news.example", false, true))
        .build()
}

/// A correctly pinned chain passes, on the host and its subdomains.
#[test]
fn test_pinned_chain_passes() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let db = database(&ca)?;
    let verifier = PinVerifier::new(&db, PinningConfig::default());

    verifier.verify("https://bank.example/login", &ca.chain("bank.example"))?;
    verifier.verify("https://online.bank.example", &ca.chain("online.bank.example"))?;
    verifier.verify_host("BANK.example", &ca.chain("bank.example"))?;

    Ok(())
}

/// A chain from another CA is rejected unless the user allows it.
#[test]
fn test_foreign_chain_needs_consent() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let mitm = Ca::new("Intercepting Proxy");
    let db = database(&ca)?;

    let strict = PinVerifier::new(&db, PinningConfig::strict());
    let status = strict.verify_status("https://bank.example/", &mitm.chain("bank.example"));
    assert!(!status.passed);
    assert_eq!(status.code, ErrorCode::PubkeyMismatch);
    assert_eq!(status.code.as_i32(), -7);

    let asked = Arc::new(AtomicUsize::new(0));
    let counter = asked.clone();
    let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(
        move |host: &str, timeout: Duration| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(host, "bank.example");
            assert_eq!(timeout, Duration::from_secs(60));
            Response::Allow
        },
    );

    verifier.verify("https://bank.example/", &mitm.chain("bank.example"))?;
    verifier.verify("https://bank.example/again", &mitm.chain("bank.example"))?;
    assert_eq!(asked.load(Ordering::SeqCst), 1);
    assert_eq!(
        verifier.cache().decision_for_url("https://bank.example/")?,
        Decision::Allowed
    );

    Ok(())
}

/// Hosts without pins pass whatever chain they present.
#[test]
fn test_unpinned_hosts_pass() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let other = Ca::new("Other Root");
    let db = database(&ca)?;
    let verifier = PinVerifier::new(&db, PinningConfig::default()).with_consent(DenyAll);

    verifier.verify("https://news.example/", &other.chain("news.example"))?;
    verifier.verify("https://unknown.example/", &other.chain("unknown.example"))?;
    assert_eq!(verifier.cache().decision_count(), 0);

    Ok(())
}

/// A denial made on one thread is honoured on every other thread sharing the cache.
#[test]
fn test_denial_is_shared_between_threads() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let mitm = Ca::new("Intercepting Proxy");
    let db = database(&ca)?;
    let cache = Arc::new(DecisionCache::new());

    let denying = PinVerifier::new(&db, PinningConfig::default())
        .with_cache(cache.clone())
        .with_consent(DenyAll);
    assert!(denying
        .verify("https://bank.example/", &mitm.chain("bank.example"))
        .is_err());

    let good = ca.chain("bank.example");
    let verifier = PinVerifier::new(&db, PinningConfig::default()).with_cache(cache.clone());
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(matches!(
                    verifier.verify("https://bank.example/", &good),
                    Err(Error::PubkeyMismatch(_))
                ));
            });
        }
    });

    cache.record_decision("bank.example", Decision::Allowed);
    verifier.verify("https://bank.example/", &mitm.chain("bank.example"))?;

    Ok(())
}

/// Each thread verifies against the URL it registered itself.
#[test]
fn test_thread_url_slots() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let mitm = Ca::new("Intercepting Proxy");
    let db = database(&ca)?;
    let verifier = PinVerifier::new(&db, PinningConfig::strict());
    let chain = mitm.chain("bank.example");

    thread::scope(|scope| {
        let pinned = scope.spawn(|| {
            verifier.cache().set_url("https://bank.example/");
            let status = verifier.verify_current_thread_status(&chain);
            verifier.cache().erase_url();
            status
        });
        let unpinned = scope.spawn(|| {
            verifier.cache().set_url("https://news.example/");
            let status = verifier.verify_current_thread_status(&chain);
            verifier.cache().erase_url();
            status
        });

        assert_eq!(pinned.join().unwrap().code, ErrorCode::PubkeyMismatch);
        assert!(unpinned.join().unwrap().passed);
    });

    let status = verifier.verify_current_thread_status(&chain);
    assert_eq!(status.code, ErrorCode::NoUrlData);

    Ok(())
}

/// A database written to disk and mapped back verifies the same way.
#[test]
fn test_database_from_file() -> Result<()> {
    let ca = Ca::new("Bank Root");
    let db = database(&ca)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("pins.hpkp");
    std::fs::write(&path, db.to_bytes())?;

    let loaded = PreloadedDatabase::from_file(&path)?;
    assert_eq!(loaded.pinsets(), db.pinsets());

    let verifier = PinVerifier::new(&loaded, PinningConfig::strict());
    verifier.verify("https://bank.example/", &ca.chain("bank.example"))?;
    assert!(verifier
        .verify("https://bank.example/", &Ca::new("Other").chain("bank.example"))
        .is_err());

    Ok(())
}
