//! use certify::error::CertifyError;

use thiserror::Error;

/// Represents the ways an issuance run can fail.
///
/// Every variant is fatal to the run: the pipeline stops at the first error
/// and produces no partial output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertifyError {
    /// A required request field is missing or has the wrong type.
    #[error("Invalid request: {0}")]
    InvalidRequestShape(String),

    /// A subject attribute type is unknown or its value cannot be encoded.
    #[error("Invalid subject attribute {attribute}: {reason}")]
    InvalidSubjectAttribute { attribute: String, reason: String },

    #[error("Subject's public key information wasn't supplied")]
    MissingSubjectKey,

    /// Key material could not be parsed.
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("Subject's signed public key wasn't a valid structure: {0}")]
    MalformedKeyProof(String),

    #[error("Subject's signed public key didn't pass verification: {0}")]
    KeyProofVerificationFailed(String),

    /// No private key is available to sign the certificate.
    #[error("Missing signing key: {0}")]
    MissingSigningKey(String),

    #[error("Invalid issuer certificate: {0}")]
    InvalidIssuerCertificate(String),

    #[error("Invalid serial number {serial:?}: {reason}")]
    InvalidSerialNumber { serial: String, reason: String },

    #[error("Invalid timestamp {timestamp:?}: {reason}")]
    InvalidTimestamp { timestamp: String, reason: String },

    /// The extension name is unknown or its value does not follow the
    /// extension's value grammar.
    #[error("Invalid extension {name}: {reason}")]
    InvalidExtension { name: String, reason: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Error while DER-encoding an otherwise valid structure.
    #[error("Failed to encode data: {0}")]
    Encoding(String),
}

impl CertifyError {
    pub(crate) fn extension(name: &str, reason: impl Into<String>) -> Self {
        CertifyError::InvalidExtension {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<der::Error> for CertifyError {
    /// Converts a `der::Error` into a `CertifyError`.
    fn from(err: der::Error) -> Self {
        CertifyError::Encoding(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertifyError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertifyError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CertifyError>;
