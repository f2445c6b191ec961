pub mod extensions;
pub mod params;
pub mod text;

use crate::error::CertifyError;
pub type Result<T> = std::result::Result<T, CertifyError>;
use base64::Engine;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, AnyRef};
use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use x509_cert::certificate::CertificateInner;
use x509_cert::ext::Extension;
use x509_cert::name::Name;

use crate::key::{HashAlgorithm, PublicKey};
use crate::pem_utils::{der_to_pem, pem_to_der};

const MD_5_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
const SHA_1_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const SHA_384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA_512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
const ECDSA_WITH_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");

/// Represents the signature algorithms the crate can produce or check.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// MD5 with RSA encryption. Only accepted on key proofs, never produced.
    Md5WithRSA,
    /// SHA-1 with RSA encryption. Only accepted on key proofs.
    Sha1WithRSA,
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
    /// SHA-1 with ECDSA. Only accepted on key proofs.
    Sha1WithECDSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Pure Ed25519.
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        match oid {
            MD_5_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Md5WithRSA),
            SHA_1_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha1WithRSA),
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Some(SignatureAlgorithm::Sha256WithRSA)
            }
            SHA_384_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha384WithRSA),
            SHA_512_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha512WithRSA),
            ECDSA_WITH_SHA_1 => Some(SignatureAlgorithm::Sha1WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Some(SignatureAlgorithm::Sha256WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Some(SignatureAlgorithm::Sha384WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => Some(SignatureAlgorithm::Sha512WithECDSA),
            const_oid::db::rfc8410::ID_ED_25519 => Some(SignatureAlgorithm::Ed25519),
            _ => None,
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Md5WithRSA => MD_5_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha1WithRSA => SHA_1_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithRSA => {
                const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
            }
            SignatureAlgorithm::Sha384WithRSA => SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha1WithECDSA => ECDSA_WITH_SHA_1,
            SignatureAlgorithm::Sha256WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => const_oid::db::rfc8410::ID_ED_25519,
        }
    }

    /// The message digest applied before signing; `None` for Ed25519.
    pub fn hash(self) -> Option<HashAlgorithm> {
        match self {
            SignatureAlgorithm::Md5WithRSA => Some(HashAlgorithm::Md5),
            SignatureAlgorithm::Sha1WithRSA | SignatureAlgorithm::Sha1WithECDSA => {
                Some(HashAlgorithm::Sha1)
            }
            SignatureAlgorithm::Sha256WithRSA | SignatureAlgorithm::Sha256WithECDSA => {
                Some(HashAlgorithm::Sha256)
            }
            SignatureAlgorithm::Sha384WithRSA | SignatureAlgorithm::Sha384WithECDSA => {
                Some(HashAlgorithm::Sha384)
            }
            SignatureAlgorithm::Sha512WithRSA | SignatureAlgorithm::Sha512WithECDSA => {
                Some(HashAlgorithm::Sha512)
            }
            SignatureAlgorithm::Ed25519 => None,
        }
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Md5WithRSA
                | SignatureAlgorithm::Sha1WithRSA
                | SignatureAlgorithm::Sha256WithRSA
                | SignatureAlgorithm::Sha384WithRSA
                | SignatureAlgorithm::Sha512WithRSA
        )
    }

    pub fn is_ecdsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Sha1WithECDSA
                | SignatureAlgorithm::Sha256WithECDSA
                | SignatureAlgorithm::Sha384WithECDSA
                | SignatureAlgorithm::Sha512WithECDSA
        )
    }

    /// The conventional OpenSSL name, as shown in text dumps.
    pub fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::Md5WithRSA => "md5WithRSAEncryption",
            SignatureAlgorithm::Sha1WithRSA => "sha1WithRSAEncryption",
            SignatureAlgorithm::Sha256WithRSA => "sha256WithRSAEncryption",
            SignatureAlgorithm::Sha384WithRSA => "sha384WithRSAEncryption",
            SignatureAlgorithm::Sha512WithRSA => "sha512WithRSAEncryption",
            SignatureAlgorithm::Sha1WithECDSA => "ecdsa-with-SHA1",
            SignatureAlgorithm::Sha256WithECDSA => "ecdsa-with-SHA256",
            SignatureAlgorithm::Sha384WithECDSA => "ecdsa-with-SHA384",
            SignatureAlgorithm::Sha512WithECDSA => "ecdsa-with-SHA512",
            SignatureAlgorithm::Ed25519 => "ED25519",
        }
    }
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA algorithms carry explicit NULL parameters; ECDSA and Ed25519 carry none.
    fn from(value: SignatureAlgorithm) -> Self {
        let parameters = value.is_rsa().then(|| Any::from(AnyRef::NULL));
        x509_cert::spki::AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters,
        }
    }
}

/// Represents a signed X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER, PEM and
/// text forms.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Parses a PEM encoded certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (label, der) =
            pem_to_der(pem).map_err(|e| CertifyError::InvalidIssuerCertificate(e.to_string()))?;
        if label != "CERTIFICATE" && label != "X509 CERTIFICATE" {
            return Err(CertifyError::InvalidIssuerCertificate(format!(
                "expected a CERTIFICATE PEM block, found {label:?}"
            )));
        }
        Self::from_der(&der)
    }

    /// Parses a DER encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertifyError::InvalidIssuerCertificate(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertifyError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, "CERTIFICATE"))
    }

    /// Base64 (standard alphabet, unwrapped) of the DER encoding.
    pub fn to_der_base64(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_der()?))
    }

    /// Lowercase hex SHA-1 digest of the DER encoding.
    pub fn sha1_fingerprint(&self) -> Result<String> {
        Ok(hex::encode(Sha1::digest(self.to_der()?)))
    }

    /// Renders all certificate fields as multi-line text.
    pub fn to_text(&self) -> String {
        text::render_certificate(&self.inner)
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn extensions(&self) -> &[Extension] {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
    }

    /// Decodes the certified public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Checks the certificate signature against `public_key`.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<()> {
        let algorithm = SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
            .ok_or_else(|| {
                CertifyError::SigningFailed(format!(
                    "unsupported signature algorithm {}",
                    self.inner.signature_algorithm.oid
                ))
            })?;
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertifyError::SigningFailed("signature has unused bits".to_string())
        })?;
        public_key
            .verify(algorithm, &tbs, signature)
            .map_err(|e| CertifyError::SigningFailed(e.to_string()))
    }
}
