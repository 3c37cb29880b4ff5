//! Shared helpers for unit tests: certificate factories and small pin databases.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, Issuer, KeyPair,
};
use x509_parser::parse_x509_certificate;

use crate::{
    pins::{HashValue, Pinset},
    preload::builder::{PinPolicy, PreloadBuilder, PreloadEntry},
    PreloadedDatabase,
};

/// A CA that can issue leaf and intermediate certificates.
pub struct CertFactory {
    der: Vec<u8>,
    issuer: Issuer<'static, KeyPair>,
}

fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

impl CertFactory {
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let params = ca_params(common_name);
        let root = params.self_signed(&key).unwrap();

        CertFactory {
            der: root.der().to_vec(),
            issuer: Issuer::new(params, key),
        }
    }

    /// DER encoding of the CA certificate.
    pub fn der(&self) -> Vec<u8> {
        self.der.clone()
    }

    /// SHA-1 pin hash of the CA's public key.
    pub fn hash(&self) -> HashValue {
        HashValue::sha1(&Self::spki(&self.der))
    }

    /// A leaf for `host` signed by this CA.
    pub fn leaf(&self, host: &str) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![host.to_string()]).unwrap();
        let mut name = DistinguishedName::new();
        name.push(DnType::CommonName, host);
        params.distinguished_name = name;

        params.signed_by(&key, &self.issuer).unwrap().der().to_vec()
    }

    /// An intermediate CA signed by this CA, with its DER encoding.
    pub fn intermediate(&self, common_name: &str) -> (CertFactory, Vec<u8>) {
        let key = KeyPair::generate().unwrap();
        let params = ca_params(common_name);
        let der = params.signed_by(&key, &self.issuer).unwrap().der().to_vec();

        (
            CertFactory {
                der: der.clone(),
                issuer: Issuer::new(params, key),
            },
            der,
        )
    }

    /// DER SubjectPublicKeyInfo of a certificate.
    pub fn spki(der: &[u8]) -> Vec<u8> {
        let (_, cert) = parse_x509_certificate(der).unwrap();
        cert.public_key().raw.to_vec()
    }
}

/// A database pinning `host` and its subdomains to the given hashes.
pub fn pinned_database(host: &str, accepted: &[HashValue], rejected: &[HashValue]) -> PreloadedDatabase {
    let mut pinset = Pinset::new(0, "test");
    pinset.accepted_pins = accepted.iter().map(HashValue::to_pin).collect();
    pinset.rejected_pins = rejected.iter().map(HashValue::to_pin).collect();

    PreloadBuilder::new()
        .pinset(pinset)
        .entry(PreloadEntry::new(host, true, true).with_pins(PinPolicy::new(0, 1, true)))
        .entry(PreloadEntry::new("unpinned.test", true, true))
        .build()
        .unwrap()
}
