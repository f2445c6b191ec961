//! Encodings of an issued certificate and its public key.

use base64::Engine;
use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::cert::Certificate;
use crate::error::Result;
use crate::key::PublicKey;

/// The certificate in every output form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedCertificate {
    pub pem: String,
    pub der_base64: String,
    pub sha1_fingerprint_hex: String,
    pub text: String,
}

/// The certified public key, as `SubjectPublicKeyInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedPublicKey {
    pub pem: String,
    pub der_base64: String,
    pub sha1_fingerprint_hex: String,
}

/// What one issuance run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuanceResult {
    pub certificate: EncodedCertificate,
    pub public_key: EncodedPublicKey,
}

impl EncodedCertificate {
    pub fn new(certificate: &Certificate) -> Result<Self> {
        Ok(Self {
            pem: certificate.to_pem()?,
            der_base64: certificate.to_der_base64()?,
            sha1_fingerprint_hex: certificate.sha1_fingerprint()?,
            text: certificate.to_text(),
        })
    }
}

impl EncodedPublicKey {
    pub fn new(public_key: &PublicKey) -> Result<Self> {
        let der = public_key.to_der()?;
        Ok(Self {
            pem: public_key.to_pem()?,
            der_base64: base64::engine::general_purpose::STANDARD.encode(&der),
            sha1_fingerprint_hex: hex::encode(Sha1::digest(&der)),
        })
    }
}

impl IssuanceResult {
    /// Encodes `certificate` and the public key it certifies.
    pub fn new(certificate: &Certificate, public_key: &PublicKey) -> Result<Self> {
        Ok(Self {
            certificate: EncodedCertificate::new(certificate)?,
            public_key: EncodedPublicKey::new(public_key)?,
        })
    }
}
