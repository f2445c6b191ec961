//! The issuance request, as read from JSON or built in code.

use bon::Builder;
use serde::Deserialize;

use crate::cert::params::DistinguishedName;
use crate::error::{CertifyError, Result};

/// One requested extension.
///
/// `value` uses the OpenSSL configuration syntax of the named extension,
/// e.g. `CA:TRUE,pathlen:0` for `basicConstraints`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionRequest {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub critical: bool,
}

impl ExtensionRequest {
    pub fn new(name: impl Into<String>, value: impl Into<String>, critical: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            critical,
        }
    }
}

/// Everything needed to issue one certificate.
///
/// Exactly one of `subject_key_pem` and `subject_signed_public_key` is used;
/// the direct key wins when both are present. Key and certificate fields
/// also accept the shorter names `subject_key`, `signing_key` and
/// `signing_certificate`.
///
/// ```
/// use certify::cert::params::DistinguishedName;
/// use certify::request::{ExtensionRequest, IssuanceRequest};
///
/// let request = IssuanceRequest::builder()
///     .subject(DistinguishedName::new().with("CN", "example.com"))
///     .subject_signed_public_key("SPKAC=...".to_string())
///     .serial_number("1A")
///     .started_at("2024-01-01 00:00:00")
///     .expires_at("2025-01-01 00:00:00")
///     .extensions(vec![ExtensionRequest::new("basicConstraints", "CA:FALSE", true)])
///     .build();
/// assert_eq!(request.extensions.len(), 1);
/// ```
#[derive(Debug, Clone, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct IssuanceRequest {
    /// Subject attributes, in encoding order.
    pub subject: DistinguishedName,
    #[serde(default, alias = "subject_key")]
    pub subject_key_pem: Option<String>,
    /// A base64 `SignedPublicKeyAndChallenge`.
    #[serde(default)]
    pub subject_signed_public_key: Option<String>,
    #[serde(default, alias = "signing_key")]
    pub signing_key_pem: Option<String>,
    #[serde(default, alias = "signing_certificate")]
    pub signing_certificate_pem: Option<String>,
    /// Hexadecimal serial number.
    pub serial_number: String,
    pub started_at: String,
    pub expires_at: String,
    #[serde(default)]
    #[builder(default)]
    pub extensions: Vec<ExtensionRequest>,
}

impl IssuanceRequest {
    /// Parses a JSON request.
    ///
    /// Malformed JSON and missing or mistyped fields fail with
    /// `InvalidRequestShape`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CertifyError::InvalidRequestShape(e.to_string()))
    }
}
