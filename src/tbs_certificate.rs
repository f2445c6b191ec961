use der::Encode;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{ExtensionContext, create_extension};
use crate::cert::params::Validity;
use crate::error::Result;
use crate::key::PublicKey;
use crate::request::ExtensionRequest;

/// Everything about a certificate that the issuer does not decide.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `public_key` - The public key being certified.
/// * `serial_number` - The unique identifier for the certificate.
/// * `validity` - The validity window.
/// * `extensions` - Requested extensions, applied in order.
#[derive(Debug, Clone)]
pub struct CertificateTemplate {
    pub subject: Name,
    pub public_key: PublicKey,
    pub serial_number: SerialNumber,
    pub validity: Validity,
    pub extensions: Vec<ExtensionRequest>,
}

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// This is the unsigned shell: subject, issuer, public key, serial and
/// validity are fixed at construction, extensions are appended afterwards.
/// The version is always v3.
#[derive(Debug, Clone)]
pub struct TbsCertificate {
    inner: TbsCertificateInner,
}

impl TbsCertificate {
    /// Creates the shell for `template`, to be signed with `signature_algorithm`.
    ///
    /// # Arguments
    /// * `template` - Subject, key, serial and validity of the new certificate.
    /// * `issuer` - The distinguished name of the certificate issuer.
    /// * `signature_algorithm` - The algorithm the issuer will sign with.
    pub fn new(
        template: &CertificateTemplate,
        issuer: Name,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<Self> {
        Ok(Self {
            inner: TbsCertificateInner {
                version: Version::V3,
                serial_number: template.serial_number.clone(),
                signature: signature_algorithm.into(),
                issuer,
                validity: template.validity.to_x509_validity()?,
                subject: template.subject.clone(),
                subject_public_key_info: template.public_key.as_spki()?,
                issuer_unique_id: None,
                subject_unique_id: None,
                extensions: None,
            },
        })
    }

    /// Appends one extension per request, in order.
    ///
    /// Each extension sees the shell as it stands after the previous ones
    /// were applied. `issuer` is the issuing certificate, or `None` when the
    /// certificate is self-issued.
    pub fn apply_extensions(
        &mut self,
        requests: &[ExtensionRequest],
        issuer: Option<&TbsCertificateInner>,
    ) -> Result<()> {
        for request in requests {
            let Some(extension) =
                create_extension(&ExtensionContext::new(&self.inner, issuer), request)?
            else {
                log::debug!("extension {} omitted", request.name);
                continue;
            };
            log::debug!(
                "applied extension {} ({}){}",
                request.name,
                extension.extn_id,
                if extension.critical { ", critical" } else { "" }
            );
            self.inner
                .extensions
                .get_or_insert_with(Vec::new)
                .push(extension);
        }
        Ok(())
    }

    pub fn inner(&self) -> &TbsCertificateInner {
        &self.inner
    }

    pub fn into_inner(self) -> TbsCertificateInner {
        self.inner
    }

    /// Encodes the `TbsCertificate` into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate body.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }
}
