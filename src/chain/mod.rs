//! Public key hashes of a peer certificate chain.
//!
//! Pins may name any key on the path from the leaf to the root, so the extractor hashes every
//! certificate it is given and insists that the chain ends in a self-signed certificate. A chain
//! that stops at an intermediate would let a pin on the missing root go unchecked.
//!
//! TLS libraries differ in what they hand to a verify callback. OpenSSL-style callbacks see the
//! verified chain including the root and can use [`PubkeyHashExtractor::extract`] directly.
//! GnuTLS-style callbacks see only what the peer sent; they pass an [`IssuerLookup`] (for
//! example [`TrustAnchors`] loaded from the system store) to
//! [`PubkeyHashExtractor::extract_completed`], which appends the missing issuers.

use log::debug;
use sha1::{Digest, Sha1};
use x509_parser::{certificate::X509Certificate, parse_x509_certificate, x509::X509Name};

use crate::{
    pins::{HashAlgo, HashValue},
    Error, Result,
};

/// Finds the certificate that issued another one.
pub trait IssuerLookup: Send + Sync {
    /// Return the DER encoding of a certificate whose subject equals `issuer_name`, the raw DER
    /// of a certificate's issuer name.
    fn find_issuer(&self, issuer_name: &[u8]) -> Option<Vec<u8>>;
}

/// An in-memory set of trusted root and intermediate certificates.
#[derive(Debug, Default, Clone)]
pub struct TrustAnchors {
    anchors: Vec<(Vec<u8>, Vec<u8>)>,
}

impl TrustAnchors {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        TrustAnchors::default()
    }

    /// Build a set from DER certificates.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCertificate`] for the first entry that cannot be decoded.
    pub fn from_der<I, C>(certificates: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        let mut anchors = TrustAnchors::new();
        for der in certificates {
            anchors.add(der)?;
        }
        Ok(anchors)
    }

    /// Add a DER certificate.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCertificate`] if `der` cannot be decoded.
    pub fn add(&mut self, der: impl Into<Vec<u8>>) -> Result<()> {
        let der = der.into();
        let subject = parse(&der)?.subject().as_raw().to_vec();
        self.anchors.push((subject, der));
        Ok(())
    }

    /// Number of certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl IssuerLookup for TrustAnchors {
    fn find_issuer(&self, issuer_name: &[u8]) -> Option<Vec<u8>> {
        self.anchors
            .iter()
            .find(|(subject, _)| subject == issuer_name)
            .map(|(_, der)| der.clone())
    }
}

/// What the extractor needs from one certificate, detached from the DER borrow.
struct Inspected {
    hash: HashValue,
    self_signed: bool,
    issuer: Vec<u8>,
}

/// Hashes the SubjectPublicKeyInfo of each certificate in a chain.
#[derive(Debug, Clone, Copy)]
pub struct PubkeyHashExtractor {
    algo: HashAlgo,
}

impl Default for PubkeyHashExtractor {
    fn default() -> Self {
        PubkeyHashExtractor::new(HashAlgo::Sha1)
    }
}

impl PubkeyHashExtractor {
    /// Create an extractor producing `algo` digests.
    #[must_use]
    pub fn new(algo: HashAlgo) -> Self {
        PubkeyHashExtractor { algo }
    }

    /// Hash every certificate of `chain`, leaf first.
    ///
    /// # Errors
    /// - [`Error::InvalidPeerCertChain`] if `chain` is empty or its last certificate is not
    ///   self-signed
    /// - [`Error::InvalidCertificate`] if an entry is not a DER X.509 certificate
    /// - [`Error::InternalError`] if the extractor was created for SHA-256
    pub fn extract<C: AsRef<[u8]>>(&self, chain: &[C]) -> Result<Vec<HashValue>> {
        let inspected = self.inspect_chain(chain)?;
        match inspected.last() {
            Some(last) if last.self_signed => {}
            _ => {
                return Err(Error::InvalidPeerCertChain(
                    "chain does not end in a self-signed certificate".to_string(),
                ))
            }
        }

        Ok(inspected.into_iter().map(|cert| cert.hash).collect())
    }

    /// Hash `chain`, then follow issuers through `issuers` until a self-signed certificate is
    /// reached, hashing each one that was added. At most `max_depth` certificates are added.
    ///
    /// # Errors
    /// As [`PubkeyHashExtractor::extract`]; [`Error::InvalidPeerCertChain`] also if an issuer
    /// cannot be found within `max_depth` steps.
    pub fn extract_completed<C: AsRef<[u8]>>(
        &self,
        chain: &[C],
        issuers: &dyn IssuerLookup,
        max_depth: usize,
    ) -> Result<Vec<HashValue>> {
        let mut inspected = self.inspect_chain(chain)?;

        for _ in 0..max_depth {
            let Some(last) = inspected.last() else {
                break;
            };
            if last.self_signed {
                break;
            }
            let Some(issuer) = issuers.find_issuer(&last.issuer) else {
                break;
            };
            debug!("Completed peer chain with issuer from trust store");
            inspected.push(self.inspect(&issuer)?);
        }

        match inspected.last() {
            Some(last) if last.self_signed => {
                Ok(inspected.into_iter().map(|cert| cert.hash).collect())
            }
            _ => Err(Error::InvalidPeerCertChain(
                "no self-signed issuer found for chain".to_string(),
            )),
        }
    }

    fn inspect_chain<C: AsRef<[u8]>>(&self, chain: &[C]) -> Result<Vec<Inspected>> {
        self.algo.ensure_supported()?;
        if chain.is_empty() {
            return Err(Error::InvalidPeerCertChain("empty chain".to_string()));
        }

        chain.iter().map(|der| self.inspect(der.as_ref())).collect()
    }

    fn inspect(&self, der: &[u8]) -> Result<Inspected> {
        let cert = parse(der)?;
        let hash = HashValue::compute(self.algo, cert.public_key().raw)?;
        debug!("Public key hash {} of '{}'", hash, cert.subject());

        Ok(Inspected {
            hash,
            self_signed: name_hash(cert.subject()) == name_hash(cert.issuer()),
            issuer: cert.issuer().as_raw().to_vec(),
        })
    }
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>> {
    let (_, cert) =
        parse_x509_certificate(der).map_err(|e| Error::InvalidCertificate(e.to_string()))?;
    Ok(cert)
}

fn name_hash(name: &X509Name<'_>) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(name.as_raw());
    hasher.finalize().to_vec()
}
