use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ed25519_dalek::{
    Signature as Ed25519Signature, Signer as _, SigningKey as Ed25519SigningKey, Verifier as _,
    VerifyingKey as Ed25519VerifyingKey,
};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Digest;
use thiserror::Error;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CertifyError, Result};
use crate::pem_utils::{der_to_pem, pem_to_der};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ID_ED_25519: ObjectIdentifier = const_oid::db::rfc8410::ID_ED_25519;
pub(crate) const SECP_256_R_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub(crate) const SECP_384_R_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub(crate) const SECP_521_R_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// Message digests usable in signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Hashes `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => md5::Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            HashAlgorithm::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        }
    }
}

/// A signature did not verify against a public key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct VerificationError(pub String);

/// Private keys the crate can parse and sign with.
#[derive(Debug, Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        secret_key: p256::SecretKey,
    },
    EcdsaP384 {
        secret_key: p384::SecretKey,
    },
    EcdsaP521 {
        secret_key: p521::SecretKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl KeyPair {
    /// Wraps an RSA private key.
    pub fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    /// Imports a PKCS#8 `PrivateKeyInfo` (PEM label `PRIVATE KEY`).
    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::from_der(der).map_err(invalid_key)?;
        match info.algorithm.oid {
            RSA_ENCRYPTION => RsaPrivateKey::from_pkcs8_der(der)
                .map(Self::from_rsa)
                .map_err(invalid_key),
            ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid().map_err(invalid_key)? {
                SECP_256_R_1 => p256::SecretKey::from_pkcs8_der(der)
                    .map(|secret_key| KeyPair::EcdsaP256 { secret_key })
                    .map_err(invalid_key),
                SECP_384_R_1 => p384::SecretKey::from_pkcs8_der(der)
                    .map(|secret_key| KeyPair::EcdsaP384 { secret_key })
                    .map_err(invalid_key),
                SECP_521_R_1 => p521::SecretKey::from_pkcs8_der(der)
                    .map(|secret_key| KeyPair::EcdsaP521 { secret_key })
                    .map_err(invalid_key),
                curve => Err(CertifyError::InvalidKeyEncoding(format!(
                    "unsupported elliptic curve {curve}"
                ))),
            },
            ID_ED_25519 => Ed25519SigningKey::from_pkcs8_der(der)
                .map(|signing_key| KeyPair::Ed25519 { signing_key })
                .map_err(invalid_key),
            other => Err(CertifyError::InvalidKeyEncoding(format!(
                "unsupported key algorithm {other}"
            ))),
        }
    }

    /// Imports a PKCS#1 `RSAPrivateKey` (PEM label `RSA PRIVATE KEY`).
    pub fn import_from_pkcs1_der(der: &[u8]) -> Result<Self> {
        RsaPrivateKey::from_pkcs1_der(der)
            .map(Self::from_rsa)
            .map_err(invalid_key)
    }

    /// Imports a SEC1 `ECPrivateKey` (PEM label `EC PRIVATE KEY`).
    ///
    /// The curve is recognized by the private scalar length.
    pub fn import_from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret_key) = p256::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP256 { secret_key });
        }
        if let Ok(secret_key) = p384::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP384 { secret_key });
        }
        p521::SecretKey::from_sec1_der(der)
            .map(|secret_key| KeyPair::EcdsaP521 { secret_key })
            .map_err(|_| {
                CertifyError::InvalidKeyEncoding(
                    "EC private key is malformed or uses an unsupported curve".to_string(),
                )
            })
    }

    /// Returns the public half of the key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { secret_key } => PublicKey::EcdsaP256(secret_key.public_key()),
            KeyPair::EcdsaP384 { secret_key } => PublicKey::EcdsaP384(secret_key.public_key()),
            KeyPair::EcdsaP521 { secret_key } => PublicKey::EcdsaP521(secret_key.public_key()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Picks the SHA-256 based signature algorithm certificates are signed with.
    ///
    /// Ed25519 hashes internally with SHA-512, so it cannot sign a SHA-256
    /// digest.
    pub fn sha256_signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        match self {
            KeyPair::Rsa { .. } => Ok(SignatureAlgorithm::Sha256WithRSA),
            KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. } => {
                Ok(SignatureAlgorithm::Sha256WithECDSA)
            }
            KeyPair::Ed25519 { .. } => Err(CertifyError::SigningFailed(
                "Ed25519 keys cannot sign with an external SHA-256 digest".to_string(),
            )),
        }
    }

    /// Signs `data` with the given algorithm.
    ///
    /// ECDSA signatures are returned DER-encoded, as X.509 and SPKAC expect.
    /// MD5 is never used to sign.
    pub fn sign_data(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        match (self, algorithm.hash()) {
            (_, Some(HashAlgorithm::Md5)) => Err(CertifyError::SigningFailed(format!(
                "refusing to sign with {}",
                algorithm.name()
            ))),
            (KeyPair::Rsa { private, .. }, Some(hash)) if algorithm.is_rsa() => private
                .sign(hash.pkcs1v15(), &hash.digest(data))
                .map_err(signing_failed),
            (KeyPair::EcdsaP256 { secret_key }, Some(hash)) if algorithm.is_ecdsa() => {
                let signing_key = p256::ecdsa::SigningKey::from(secret_key);
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(&hash.digest(data))
                    .map_err(signing_failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (KeyPair::EcdsaP384 { secret_key }, Some(hash)) if algorithm.is_ecdsa() => {
                let signing_key = p384::ecdsa::SigningKey::from(secret_key);
                let signature: p384::ecdsa::Signature = signing_key
                    .sign_prehash(&hash.digest(data))
                    .map_err(signing_failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (KeyPair::EcdsaP521 { secret_key }, Some(hash)) if algorithm.is_ecdsa() => {
                let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
                    .map_err(signing_failed)?;
                let signature: p521::ecdsa::Signature = signing_key
                    .sign_prehash(&p521_prehash(hash.digest(data)))
                    .map_err(signing_failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (KeyPair::Ed25519 { signing_key }, None) => {
                Ok(signing_key.sign(data).to_bytes().to_vec())
            }
            _ => Err(CertifyError::SigningFailed(format!(
                "{} keys cannot produce {} signatures",
                self.public_key().algorithm_name(),
                algorithm.name()
            ))),
        }
    }
}

/// Public keys the crate can certify and verify with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Decodes a `SubjectPublicKeyInfo`.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        match spki.algorithm.oid {
            RSA_ENCRYPTION => RsaPublicKey::from_public_key_der(&der)
                .map(PublicKey::Rsa)
                .map_err(invalid_key),
            ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(|| {
                        CertifyError::InvalidKeyEncoding("EC key without curve".to_string())
                    })?
                    .decode_as::<ObjectIdentifier>()
                    .map_err(invalid_key)?;
                match curve {
                    SECP_256_R_1 => p256::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP256)
                        .map_err(invalid_key),
                    SECP_384_R_1 => p384::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP384)
                        .map_err(invalid_key),
                    SECP_521_R_1 => p521::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP521)
                        .map_err(invalid_key),
                    other => Err(CertifyError::InvalidKeyEncoding(format!(
                        "unsupported elliptic curve {other}"
                    ))),
                }
            }
            ID_ED_25519 => Ed25519VerifyingKey::from_public_key_der(&der)
                .map(PublicKey::Ed25519)
                .map_err(invalid_key),
            other => Err(CertifyError::InvalidKeyEncoding(format!(
                "unsupported key algorithm {other}"
            ))),
        }
    }

    /// Decodes a DER `SubjectPublicKeyInfo` (PEM label `PUBLIC KEY`).
    pub fn import_from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der).map_err(invalid_key)?;
        Self::from_x509spki(&spki)
    }

    /// Decodes a PKCS#1 `RSAPublicKey` (PEM label `RSA PUBLIC KEY`).
    pub fn import_from_pkcs1_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_pkcs1_der(der)
            .map(PublicKey::Rsa)
            .map_err(invalid_key)
    }

    /// Encodes the key as a `SubjectPublicKeyInfo` DER document.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP256(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP384(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP521(key) => key.to_public_key_der()?,
            PublicKey::Ed25519(key) => key.to_public_key_der()?,
        };
        Ok(document.as_bytes().to_vec())
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, "PUBLIC KEY"))
    }

    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_der(&self.to_der()?)?)
    }

    /// Key strength in bits: the modulus size for RSA, the field size otherwise.
    pub fn bits(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.size() * 8,
            PublicKey::EcdsaP256(_) => 256,
            PublicKey::EcdsaP384(_) => 384,
            PublicKey::EcdsaP521(_) => 521,
            PublicKey::Ed25519(_) => 256,
        }
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::EcdsaP256(_) => "ECDSA P-256",
            PublicKey::EcdsaP384(_) => "ECDSA P-384",
            PublicKey::EcdsaP521(_) => "ECDSA P-521",
            PublicKey::Ed25519(_) => "Ed25519",
        }
    }

    /// Verifies `signature` over `data` made with `algorithm`.
    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> std::result::Result<(), VerificationError> {
        match (self, algorithm.hash()) {
            (PublicKey::Rsa(key), Some(hash)) if algorithm.is_rsa() => key
                .verify(hash.pkcs1v15(), &hash.digest(data), signature)
                .map_err(verification_failed),
            (PublicKey::EcdsaP256(key), Some(hash)) if algorithm.is_ecdsa() => {
                let signature =
                    p256::ecdsa::Signature::from_der(signature).map_err(verification_failed)?;
                p256::ecdsa::VerifyingKey::from(key)
                    .verify_prehash(&hash.digest(data), &signature)
                    .map_err(verification_failed)
            }
            (PublicKey::EcdsaP384(key), Some(hash)) if algorithm.is_ecdsa() => {
                let signature =
                    p384::ecdsa::Signature::from_der(signature).map_err(verification_failed)?;
                p384::ecdsa::VerifyingKey::from(key)
                    .verify_prehash(&hash.digest(data), &signature)
                    .map_err(verification_failed)
            }
            (PublicKey::EcdsaP521(key), Some(hash)) if algorithm.is_ecdsa() => {
                let signature =
                    p521::ecdsa::Signature::from_der(signature).map_err(verification_failed)?;
                p521::ecdsa::VerifyingKey::from_affine(*key.as_affine())
                    .map_err(verification_failed)?
                    .verify_prehash(&p521_prehash(hash.digest(data)), &signature)
                    .map_err(verification_failed)
            }
            (PublicKey::Ed25519(key), None) => {
                let signature = Ed25519Signature::from_slice(signature).map_err(verification_failed)?;
                key.verify(data, &signature).map_err(verification_failed)
            }
            _ => Err(VerificationError(format!(
                "{} keys cannot verify {} signatures",
                self.algorithm_name(),
                algorithm.name()
            ))),
        }
    }
}

/// Key material parsed from a PEM document: either a full key pair or only
/// a public key.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Private(KeyPair),
    Public(PublicKey),
}

impl KeyMaterial {
    /// Parses a PEM key, dispatching on the PEM label.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let (label, der) = pem_to_der(pem_str).map_err(invalid_key)?;
        match label.as_str() {
            "PRIVATE KEY" => KeyPair::import_from_pkcs8_der(&der).map(KeyMaterial::Private),
            "RSA PRIVATE KEY" => KeyPair::import_from_pkcs1_der(&der).map(KeyMaterial::Private),
            "EC PRIVATE KEY" => KeyPair::import_from_sec1_der(&der).map(KeyMaterial::Private),
            "PUBLIC KEY" => PublicKey::import_from_spki_der(&der).map(KeyMaterial::Public),
            "RSA PUBLIC KEY" => PublicKey::import_from_pkcs1_der(&der).map(KeyMaterial::Public),
            other => Err(CertifyError::InvalidKeyEncoding(format!(
                "unsupported PEM label {other:?}"
            ))),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Private(key_pair) => key_pair.public_key(),
            KeyMaterial::Public(public_key) => public_key.clone(),
        }
    }

    /// Splits the material into its public key and, when present, the key pair.
    pub fn into_parts(self) -> (PublicKey, Option<KeyPair>) {
        match self {
            KeyMaterial::Private(key_pair) => (key_pair.public_key(), Some(key_pair)),
            KeyMaterial::Public(public_key) => (public_key, None),
        }
    }
}

/// Left-pads a digest with zeros to the P-521 field size.
///
/// The digest's integer value, and so the signature, is unchanged; the
/// P-521 backend only rejects digests shorter than half the field.
fn p521_prehash(digest: Vec<u8>) -> Vec<u8> {
    const FIELD_BYTES: usize = 66;
    if digest.len() >= FIELD_BYTES {
        return digest;
    }
    let mut padded = vec![0u8; FIELD_BYTES - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

fn invalid_key(err: impl std::fmt::Display) -> CertifyError {
    CertifyError::InvalidKeyEncoding(err.to_string())
}

fn signing_failed(err: impl std::fmt::Display) -> CertifyError {
    CertifyError::SigningFailed(err.to_string())
}

fn verification_failed(err: impl std::fmt::Display) -> VerificationError {
    VerificationError(err.to_string())
}
