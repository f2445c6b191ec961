//! Resolution of the subject's public key and of the issuer.

use x509_cert::name::Name;

use crate::CertifyOptions;
use crate::error::{CertifyError, Result};
use crate::issuer::{ResolvedIssuer, resolve_issuer};
use crate::key::{KeyMaterial, KeyPair, PublicKey};
use crate::proof::SignedPublicKeyAndChallenge;
use crate::request::IssuanceRequest;

/// Where the subject's public key comes from.
#[derive(Debug, Clone)]
pub enum SubjectKeySource {
    /// A PEM key, private or public.
    DirectKey(KeyMaterial),
    /// A signed proof of possession carrying the public key.
    ProofStructure(SignedPublicKeyAndChallenge),
}

impl SubjectKeySource {
    /// Parses whichever key source the request carries.
    ///
    /// The direct key takes precedence; the proof is not parsed when a
    /// direct key is present.
    pub fn from_request(request: &IssuanceRequest) -> Result<Self> {
        match (
            request.subject_key_pem.as_deref(),
            request.subject_signed_public_key.as_deref(),
        ) {
            (Some(pem), _) => KeyMaterial::from_pem(pem).map(SubjectKeySource::DirectKey),
            (None, Some(proof)) => {
                SignedPublicKeyAndChallenge::from_base64(proof).map(SubjectKeySource::ProofStructure)
            }
            (None, None) => Err(CertifyError::MissingSubjectKey),
        }
    }
}

/// Returns the public key to certify and, for a direct private key, the key
/// pair that may sign.
pub fn resolve_public_key(source: SubjectKeySource) -> Result<(PublicKey, Option<KeyPair>)> {
    match source {
        SubjectKeySource::DirectKey(material) => {
            log::debug!("subject key supplied directly");
            Ok(material.into_parts())
        }
        SubjectKeySource::ProofStructure(proof) => {
            let public_key = proof.verify()?;
            log::debug!(
                "subject key proof verified, challenge {:?}",
                proof.challenge()
            );
            Ok((public_key, None))
        }
    }
}

/// Subject, certified key and issuer for one run.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub subject: Name,
    pub public_key: PublicKey,
    pub issuer: ResolvedIssuer,
}

/// Runs the subject, key and issuer resolution stages for `request`.
pub fn resolve_identity(
    request: &IssuanceRequest,
    options: &CertifyOptions,
) -> Result<ResolvedIdentity> {
    let subject = request.subject.as_x509_name()?;
    let (public_key, subject_key) = resolve_public_key(SubjectKeySource::from_request(request)?)?;
    log::debug!("certifying {} key", public_key.algorithm_name());

    let issuer = resolve_issuer(
        &subject,
        request.signing_key_pem.as_deref(),
        request.signing_certificate_pem.as_deref(),
        subject_key,
        options,
    )?;

    Ok(ResolvedIdentity {
        subject,
        public_key,
        issuer,
    })
}
