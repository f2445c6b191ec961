use der::asn1::BitString;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::CertifyOptions;
use crate::cert::Certificate;
use crate::error::{CertifyError, Result};
use crate::key::{KeyMaterial, KeyPair};
use crate::tbs_certificate::{CertificateTemplate, TbsCertificate};

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name placed in the issued certificate's issuer field.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the issuer's own certificate, or `None` when the issued
    /// certificate is self-issued.
    fn issuer_certificate(&self) -> Option<&Certificate>;

    /// Issues a certificate for `template`.
    ///
    /// Builds the unsigned shell, applies the requested extensions, signs it
    /// with SHA-256 and checks the signature before returning.
    ///
    /// # Arguments
    /// * `template` - Subject, key, serial, validity and extensions of the new certificate.
    ///
    /// # Returns
    /// The signed `Certificate`.
    fn issue(&self, template: &CertificateTemplate) -> Result<Certificate> {
        let signing_key = self.signing_key();
        let algorithm = signing_key.sha256_signature_algorithm()?;

        let mut tbs = TbsCertificate::new(template, self.issuer_name().clone(), algorithm)?;
        let issuer_tbs = self
            .issuer_certificate()
            .map(|certificate| &certificate.inner.tbs_certificate);
        tbs.apply_extensions(&template.extensions, issuer_tbs)?;

        let signature = signing_key.sign_data(algorithm, &tbs.to_der()?)?;
        log::debug!("signed certificate with {}", algorithm.name());

        let certificate = Certificate {
            inner: CertificateInner {
                tbs_certificate: tbs.into_inner(),
                signature_algorithm: algorithm.into(),
                signature: BitString::from_bytes(&signature)?,
            },
        };
        certificate.verify_signature(&signing_key.public_key())?;
        Ok(certificate)
    }
}

/// Issues certificates whose issuer is their own subject.
#[derive(Debug, Clone)]
pub struct SelfIssuer {
    pub name: Name,
    pub key: KeyPair,
}

impl Issuer for SelfIssuer {
    fn issuer_name(&self) -> &Name {
        &self.name
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn issuer_certificate(&self) -> Option<&Certificate> {
        None
    }
}

/// An issuing certificate together with the key that signs on its behalf.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> &Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn issuer_certificate(&self) -> Option<&Certificate> {
        Some(&self.cert)
    }
}

/// The issuer chosen for one run.
#[derive(Debug, Clone)]
pub enum ResolvedIssuer {
    SelfIssued(SelfIssuer),
    Chained(CertificateWithPrivateKey),
}

impl Issuer for ResolvedIssuer {
    fn issuer_name(&self) -> &Name {
        match self {
            ResolvedIssuer::SelfIssued(issuer) => issuer.issuer_name(),
            ResolvedIssuer::Chained(issuer) => issuer.issuer_name(),
        }
    }

    fn signing_key(&self) -> &KeyPair {
        match self {
            ResolvedIssuer::SelfIssued(issuer) => issuer.signing_key(),
            ResolvedIssuer::Chained(issuer) => issuer.signing_key(),
        }
    }

    fn issuer_certificate(&self) -> Option<&Certificate> {
        match self {
            ResolvedIssuer::SelfIssued(issuer) => issuer.issuer_certificate(),
            ResolvedIssuer::Chained(issuer) => issuer.issuer_certificate(),
        }
    }
}

/// Picks the signing key: `signing_key_pem` when given, else the subject's
/// own private key.
///
/// A public key never stands in for a signer; both a public-only
/// `signing_key_pem` and a subject without a private key fail with
/// `MissingSigningKey`.
pub fn resolve_signing_key(
    signing_key_pem: Option<&str>,
    subject_key: Option<KeyPair>,
) -> Result<KeyPair> {
    match signing_key_pem {
        Some(pem) => match KeyMaterial::from_pem(pem)? {
            KeyMaterial::Private(key_pair) => Ok(key_pair),
            KeyMaterial::Public(_) => Err(CertifyError::MissingSigningKey(
                "signing key is a public key".to_string(),
            )),
        },
        None => subject_key.ok_or_else(|| {
            CertifyError::MissingSigningKey(
                "no signing key given and the subject key is not a private key".to_string(),
            )
        }),
    }
}

/// Resolves who issues the certificate for `subject`.
///
/// With a signing certificate the issuer name is that certificate's subject;
/// without one the certificate is self-issued. A signing certificate whose
/// key does not match the signing key is only warned about.
///
/// # Arguments
/// * `subject` - The subject name, used as issuer name when self-issued.
/// * `signing_key_pem` - Optional PEM private key to sign with.
/// * `signing_certificate_pem` - Optional PEM issuer certificate.
/// * `subject_key` - The subject's private key, when the request carried one.
/// * `options` - Signing policy.
pub fn resolve_issuer(
    subject: &Name,
    signing_key_pem: Option<&str>,
    signing_certificate_pem: Option<&str>,
    subject_key: Option<KeyPair>,
    options: &CertifyOptions,
) -> Result<ResolvedIssuer> {
    let key = resolve_signing_key(signing_key_pem, subject_key)?;
    check_key_strength(&key, options)?;

    let Some(pem) = signing_certificate_pem else {
        log::debug!("certificate is self-issued");
        return Ok(ResolvedIssuer::SelfIssued(SelfIssuer {
            name: subject.clone(),
            key,
        }));
    };

    let cert = Certificate::from_pem(pem)?;
    match cert.public_key() {
        Ok(issuer_key) if issuer_key == key.public_key() => {}
        Ok(_) => log::warn!("signing key does not match the signing certificate's public key"),
        Err(e) => log::warn!("cannot read the signing certificate's public key: {e}"),
    }
    Ok(ResolvedIssuer::Chained(CertificateWithPrivateKey { cert, key }))
}

fn check_key_strength(key: &KeyPair, options: &CertifyOptions) -> Result<()> {
    if let KeyPair::Rsa { .. } = key {
        let bits = key.public_key().bits();
        if bits < options.min_rsa_bits {
            return Err(CertifyError::SigningFailed(format!(
                "RSA signing key has {bits} bits, at least {} are required",
                options.min_rsa_bits
            )));
        }
    }
    Ok(())
}
