//! Signed public key proofs.
//!
//! A requester proves possession of a private key by sending a Netscape
//! `SignedPublicKeyAndChallenge` (SPKAC): the public key plus a challenge
//! string, signed with the matching private key.
//!
//! ```text
//! SignedPublicKeyAndChallenge ::= SEQUENCE {
//!     publicKeyAndChallenge PublicKeyAndChallenge,
//!     signatureAlgorithm    AlgorithmIdentifier,
//!     signature             BIT STRING
//! }
//!
//! PublicKeyAndChallenge ::= SEQUENCE {
//!     spki      SubjectPublicKeyInfo,
//!     challenge IA5String
//! }
//! ```
//!
//! Verification only establishes that the embedded key signed the
//! structure. It says nothing about who the requester is.

use base64::Engine;
use der::asn1::{BitString, Ia5String};
use der::{Decode, Encode, Sequence};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::cert::SignatureAlgorithm;
use crate::error::{CertifyError, Result};
use crate::key::{KeyPair, PublicKey};

/// The signed part of an SPKAC.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PublicKeyAndChallenge {
    pub spki: SubjectPublicKeyInfoOwned,
    pub challenge: Ia5String,
}

/// A Netscape SPKAC structure.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignedPublicKeyAndChallenge {
    pub public_key_and_challenge: PublicKeyAndChallenge,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature: BitString,
}

impl SignedPublicKeyAndChallenge {
    /// Parses the textual form: base64 DER, optionally prefixed with `SPKAC=`
    /// and wrapped over several lines.
    pub fn from_base64(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix("SPKAC=").unwrap_or(trimmed);
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        let der = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CertifyError::MalformedKeyProof(e.to_string()))?;
        Self::from_der(&der).map_err(|e| CertifyError::MalformedKeyProof(e.to_string()))
    }

    /// Encodes the structure as unwrapped base64 DER.
    pub fn to_base64(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_der()?))
    }

    /// Creates a proof for `key_pair` over `challenge`.
    ///
    /// RSA and ECDSA keys sign with SHA-256; Ed25519 keys sign directly.
    pub fn sign(key_pair: &KeyPair, challenge: &str) -> Result<Self> {
        let algorithm = match key_pair {
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
            other => other.sha256_signature_algorithm()?,
        };

        let public_key_and_challenge = PublicKeyAndChallenge {
            spki: key_pair.public_key().as_spki()?,
            challenge: Ia5String::new(challenge)
                .map_err(|e| CertifyError::Encoding(e.to_string()))?,
        };
        let signature = key_pair.sign_data(algorithm, &public_key_and_challenge.to_der()?)?;

        Ok(Self {
            public_key_and_challenge,
            signature_algorithm: algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        })
    }

    pub fn challenge(&self) -> String {
        self.public_key_and_challenge.challenge.to_string()
    }

    /// Checks the signature against the embedded key and returns that key.
    pub fn verify(&self) -> Result<PublicKey> {
        let public_key = PublicKey::from_x509spki(&self.public_key_and_challenge.spki)
            .map_err(|e| CertifyError::KeyProofVerificationFailed(e.to_string()))?;

        let algorithm = SignatureAlgorithm::from_oid(self.signature_algorithm.oid).ok_or_else(
            || {
                CertifyError::KeyProofVerificationFailed(format!(
                    "unsupported signature algorithm {}",
                    self.signature_algorithm.oid
                ))
            },
        )?;
        let signature = self.signature.as_bytes().ok_or_else(|| {
            CertifyError::KeyProofVerificationFailed("signature has unused bits".to_string())
        })?;
        let signed_data = self.public_key_and_challenge.to_der()?;

        public_key
            .verify(algorithm, &signed_data, signature)
            .map_err(|e| CertifyError::KeyProofVerificationFailed(e.to_string()))?;
        Ok(public_key)
    }
}
