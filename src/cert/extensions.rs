//! X.509 v3 extensions built from OpenSSL-style configuration values.
//!
//! Every extension is created by a pure factory, [`create_extension`], from
//! its requested name and value plus an [`ExtensionContext`] describing the
//! certificate built so far and its issuer.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use const_oid::AssociatedOid;
use der::asn1::{BitString, Ia5String, OctetString};
use der::oid::ObjectIdentifier;
use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::certpolicy::PolicyInformation;
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::AccessDescription;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use super::Result;
use super::params::attribute_value_to_string;
use super::text::{format_hex, format_name};
use crate::error::CertifyError;
use crate::request::ExtensionRequest;

const NETSCAPE_CERT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.113730.1.1");
const NETSCAPE_COMMENT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.113730.1.13");
const ANY_EXTENDED_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37.0");
const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// What an extension factory may look at.
///
/// `subject` is the unsigned certificate as assembled so far, including the
/// extensions already applied. `issuer` is the issuing certificate; for a
/// self-issued certificate it is the subject shell itself.
#[derive(Clone, Copy, Debug)]
pub struct ExtensionContext<'a> {
    subject: &'a TbsCertificateInner,
    issuer: Option<&'a TbsCertificateInner>,
}

impl<'a> ExtensionContext<'a> {
    /// Creates a context. Pass `None` as `issuer` for self-issued certificates.
    pub fn new(subject: &'a TbsCertificateInner, issuer: Option<&'a TbsCertificateInner>) -> Self {
        Self { subject, issuer }
    }

    pub fn subject(&self) -> &'a TbsCertificateInner {
        self.subject
    }

    pub fn issuer(&self) -> &'a TbsCertificateInner {
        self.issuer.unwrap_or(self.subject)
    }
}

/// Trait for converting to and from X.509 extensions.
///
/// Implementors parse the OpenSSL configuration syntax, encode to and decode
/// from the DER extension value, and render the decoded value as text.
///
/// # Example
/// ```
/// use certify::cert::extensions::{BasicConstraints, ToAndFromX509Extension};
/// let bc = BasicConstraints { is_ca: true, max_path_length: Some(0) };
/// let encoded = bc.to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(decoded.to_text(), "CA:TRUE, pathlen:0");
/// ```
pub trait ToAndFromX509Extension: Sized {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;
    /// OpenSSL short name, as used in requests.
    const NAME: &'static str;
    /// OpenSSL long name, as shown in text dumps.
    const LONG_NAME: &'static str;
    /// Value that asks for the extension to be left out.
    const OMIT_VALUE: Option<&'static str> = None;

    /// Parses a configuration value such as `CA:TRUE,pathlen:0`.
    ///
    /// Errors carry a reason only; the caller attaches the extension name.
    fn from_config_value(
        value: &str,
        context: &ExtensionContext<'_>,
    ) -> std::result::Result<Self, String>;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>;

    /// Renders the value the way `openssl x509 -text` does.
    fn to_text(&self) -> String;
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;
    const NAME: &'static str = "basicConstraints";
    const LONG_NAME: &'static str = "X509v3 Basic Constraints";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let mut constraints = Self::default();
        for item in split_list(value) {
            let (key, val) = split_pair(item)?;
            if key.eq_ignore_ascii_case("CA") {
                constraints.is_ca = parse_bool(val)?;
            } else if key.eq_ignore_ascii_case("pathlen") {
                let length = val
                    .parse::<u8>()
                    .map_err(|_| format!("invalid path length {val:?}"))?;
                constraints.max_path_length = Some(length);
            } else {
                return Err(format!("unknown option {key:?}"));
            }
        }
        Ok(constraints)
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }

    fn to_text(&self) -> String {
        let mut text = if self.is_ca { "CA:TRUE" } else { "CA:FALSE" }.to_string();
        if let Some(length) = self.max_path_length {
            text.push_str(&format!(", pathlen:{length}"));
        }
        text
    }
}

const KEY_USAGES: &[(&str, &str, KeyUsages)] = &[
    ("digitalSignature", "Digital Signature", KeyUsages::DigitalSignature),
    ("nonRepudiation", "Non Repudiation", KeyUsages::NonRepudiation),
    ("keyEncipherment", "Key Encipherment", KeyUsages::KeyEncipherment),
    ("dataEncipherment", "Data Encipherment", KeyUsages::DataEncipherment),
    ("keyAgreement", "Key Agreement", KeyUsages::KeyAgreement),
    ("keyCertSign", "Certificate Sign", KeyUsages::KeyCertSign),
    ("cRLSign", "CRL Sign", KeyUsages::CRLSign),
    ("encipherOnly", "Encipher Only", KeyUsages::EncipherOnly),
    ("decipherOnly", "Decipher Only", KeyUsages::DecipherOnly),
];

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;
    const NAME: &'static str = "keyUsage";
    const LONG_NAME: &'static str = "X509v3 Key Usage";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let mut flags = FlagSet::<KeyUsages>::default();
        for item in split_list(value) {
            let (_, _, usage) = KEY_USAGES
                .iter()
                .find(|(name, _, _)| *name == item)
                .ok_or_else(|| format!("unknown key usage {item:?}"))?;
            flags |= *usage;
        }
        if flags.is_empty() {
            return Err("no key usages given".to_string());
        }
        Ok(Self(flags))
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(X509KeyUsage(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }

    fn to_text(&self) -> String {
        KEY_USAGES
            .iter()
            .filter(|(_, _, usage)| self.0.contains(*usage))
            .map(|(_, text, _)| *text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const EXTENDED_KEY_USAGES: &[(&str, &str, ObjectIdentifier)] = &[
    ("serverAuth", "TLS Web Server Authentication", const_oid::db::rfc5912::ID_KP_SERVER_AUTH),
    ("clientAuth", "TLS Web Client Authentication", const_oid::db::rfc5912::ID_KP_CLIENT_AUTH),
    ("codeSigning", "Code Signing", const_oid::db::rfc5912::ID_KP_CODE_SIGNING),
    ("emailProtection", "E-mail Protection", const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION),
    ("timeStamping", "Time Stamping", const_oid::db::rfc5912::ID_KP_TIME_STAMPING),
    ("OCSPSigning", "OCSP Signing", const_oid::db::rfc5912::ID_KP_OCSP_SIGNING),
    ("anyExtendedKeyUsage", "Any Extended Key Usage", ANY_EXTENDED_KEY_USAGE),
];

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ObjectIdentifier>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;
    const NAME: &'static str = "extendedKeyUsage";
    const LONG_NAME: &'static str = "X509v3 Extended Key Usage";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let usage = split_list(value)
            .map(|item| {
                EXTENDED_KEY_USAGES
                    .iter()
                    .find(|(name, _, _)| *name == item)
                    .map(|(_, _, oid)| *oid)
                    .or_else(|| ObjectIdentifier::new(item).ok())
                    .ok_or_else(|| format!("unknown extended key usage {item:?}"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if usage.is_empty() {
            return Err("no extended key usages given".to_string());
        }
        Ok(Self { usage })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(self.usage.clone());
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        Ok(Self { usage: eku.0 })
    }

    fn to_text(&self) -> String {
        self.usage
            .iter()
            .map(|oid| {
                EXTENDED_KEY_USAGES
                    .iter()
                    .find(|(_, _, known)| known == oid)
                    .map_or_else(|| oid.to_string(), |(_, text, _)| text.to_string())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;
    const NAME: &'static str = "subjectKeyIdentifier";
    const LONG_NAME: &'static str = "X509v3 Subject Key Identifier";
    const OMIT_VALUE: Option<&'static str> = Some("none");

    /// `hash` derives the identifier from the subject key; anything else is
    /// read as hex.
    fn from_config_value(
        value: &str,
        context: &ExtensionContext<'_>,
    ) -> std::result::Result<Self, String> {
        if value == "hash" {
            return Ok(Self(key_identifier(context.subject())));
        }
        let bytes = parse_hex(value)?;
        if bytes.is_empty() {
            return Err("empty key identifier".to_string());
        }
        Ok(Self(bytes))
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }

    fn to_text(&self) -> String {
        format_hex(&self.0)
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// This extension identifies the public key corresponding to the private key used to sign the certificate.
///
/// # Fields
/// * `key_identifier` - The key identifier.
/// * `authority_cert_issuer` - The issuer's issuer name.
/// * `authority_cert_serial_number` - The issuer's certificate serial number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<Name>,
    pub authority_cert_serial_number: Option<SerialNumber>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;
    const NAME: &'static str = "authorityKeyIdentifier";
    const LONG_NAME: &'static str = "X509v3 Authority Key Identifier";
    const OMIT_VALUE: Option<&'static str> = Some("none");

    /// Accepts `keyid`, `keyid:always`, `issuer` and `issuer:always`.
    ///
    /// The key identifier is the issuer's subject key identifier when it has
    /// one, otherwise the SHA-1 of the issuer key, so it is always available.
    /// The issuer name and serial are added with `issuer:always`, or with
    /// `issuer` when no key identifier was requested.
    fn from_config_value(
        value: &str,
        context: &ExtensionContext<'_>,
    ) -> std::result::Result<Self, String> {
        let mut want_keyid = false;
        let mut want_issuer = false;
        let mut issuer_always = false;
        for item in split_list(value) {
            match item {
                "keyid" | "keyid:always" => want_keyid = true,
                "issuer" => want_issuer = true,
                "issuer:always" => {
                    want_issuer = true;
                    issuer_always = true;
                }
                other => return Err(format!("unknown option {other:?}")),
            }
        }
        if !want_keyid && !want_issuer {
            return Err("expected keyid or issuer".to_string());
        }

        let issuer = context.issuer();
        let key_identifier = want_keyid.then(|| {
            find_extension(issuer, SubjectKeyIdentifier::OID)
                .and_then(|ext| SubjectKeyIdentifier::from_x509_extension_value(ext.extn_value.as_bytes()).ok())
                .map_or_else(|| key_identifier(issuer), |ski| ski.0)
        });

        let mut aki = Self {
            key_identifier,
            ..Self::default()
        };
        if want_issuer && (issuer_always || aki.key_identifier.is_none()) {
            aki.authority_cert_issuer = Some(issuer.issuer.clone());
            aki.authority_cert_serial_number = Some(issuer.serial_number.clone());
        }
        Ok(aki)
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: self
                .key_identifier
                .as_deref()
                .map(OctetString::new)
                .transpose()?,
            authority_cert_issuer: self
                .authority_cert_issuer
                .clone()
                .map(|name| vec![GeneralName::DirectoryName(name)]),
            authority_cert_serial_number: self.authority_cert_serial_number.clone(),
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        let authority_cert_issuer = aki.authority_cert_issuer.as_ref().and_then(|names| {
            names.iter().find_map(|name| match name {
                GeneralName::DirectoryName(dn) => Some(dn.clone()),
                _ => None,
            })
        });

        Ok(Self {
            key_identifier: aki.key_identifier.map(|id| id.as_bytes().to_vec()),
            authority_cert_issuer,
            authority_cert_serial_number: aki.authority_cert_serial_number,
        })
    }

    fn to_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(id) = &self.key_identifier {
            lines.push(format!("keyid:{}", format_hex(id)));
        }
        if let Some(name) = &self.authority_cert_issuer {
            lines.push(format!("DirName:{}", format_name(name)));
        }
        if let Some(serial) = &self.authority_cert_serial_number {
            lines.push(format!("serial:{}", format_hex(serial.as_bytes())));
        }
        lines.join("\n")
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
///
/// # Fields
/// * `names` - The alternative names, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<GeneralName>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;
    const NAME: &'static str = "subjectAltName";
    const LONG_NAME: &'static str = "X509v3 Subject Alternative Name";

    /// `email:copy` copies the subject's `emailAddress` attributes.
    fn from_config_value(
        value: &str,
        context: &ExtensionContext<'_>,
    ) -> std::result::Result<Self, String> {
        let mut names = Vec::new();
        for item in split_list(value) {
            if item == "email:copy" {
                names.extend(email_addresses(&context.subject().subject)?);
            } else {
                names.push(parse_general_name(item)?);
            }
        }
        if names.is_empty() {
            return Err("no names given".to_string());
        }
        Ok(Self { names })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(self.names.clone());
        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        Ok(Self { names: san.0 })
    }

    fn to_text(&self) -> String {
        general_names_to_text(&self.names)
    }
}

/// Represents the Issuer Alternative Name extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerAltName {
    pub names: Vec<GeneralName>,
}

impl ToAndFromX509Extension for IssuerAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::IssuerAltName::OID;
    const NAME: &'static str = "issuerAltName";
    const LONG_NAME: &'static str = "X509v3 Issuer Alternative Name";

    /// `issuer:copy` copies the subject alternative names of the issuer.
    fn from_config_value(
        value: &str,
        context: &ExtensionContext<'_>,
    ) -> std::result::Result<Self, String> {
        let mut names = Vec::new();
        for item in split_list(value) {
            if item == "issuer:copy" {
                if let Some(ext) = find_extension(context.issuer(), SubjectAltName::OID) {
                    let san = SubjectAltName::from_x509_extension_value(ext.extn_value.as_bytes())
                        .map_err(|e| format!("issuer subjectAltName is unreadable: {e}"))?;
                    names.extend(san.names);
                }
            } else {
                names.push(parse_general_name(item)?);
            }
        }
        if names.is_empty() {
            return Err("no names given".to_string());
        }
        Ok(Self { names })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ian = x509_cert::ext::pkix::IssuerAltName(self.names.clone());
        Ok(ian.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ian = x509_cert::ext::pkix::IssuerAltName::from_der(extension)?;
        Ok(Self { names: ian.0 })
    }

    fn to_text(&self) -> String {
        general_names_to_text(&self.names)
    }
}

/// Represents the CRL Distribution Points extension.
///
/// Each name becomes its own distribution point with a full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlDistributionPoints {
    pub points: Vec<GeneralName>,
}

impl ToAndFromX509Extension for CrlDistributionPoints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlDistributionPoints::OID;
    const NAME: &'static str = "crlDistributionPoints";
    const LONG_NAME: &'static str = "X509v3 CRL Distribution Points";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let points = split_list(value)
            .map(parse_general_name)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if points.is_empty() {
            return Err("no distribution points given".to_string());
        }
        Ok(Self { points })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let points = self
            .points
            .iter()
            .map(|name| DistributionPoint {
                distribution_point: Some(DistributionPointName::FullName(vec![name.clone()])),
                reasons: None,
                crl_issuer: None,
            })
            .collect();
        Ok(x509_cert::ext::pkix::CrlDistributionPoints(points).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let cdp = x509_cert::ext::pkix::CrlDistributionPoints::from_der(extension)?;
        let points = cdp
            .0
            .into_iter()
            .filter_map(|point| match point.distribution_point {
                Some(DistributionPointName::FullName(names)) => Some(names),
                _ => None,
            })
            .flatten()
            .collect();
        Ok(Self { points })
    }

    fn to_text(&self) -> String {
        self.points
            .iter()
            .map(|name| format!("Full Name:\n  {}", general_name_to_text(name)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Represents the Authority Information Access extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityInfoAccess {
    pub descriptions: Vec<(ObjectIdentifier, GeneralName)>,
}

impl ToAndFromX509Extension for AuthorityInfoAccess {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityInfoAccessSyntax::OID;
    const NAME: &'static str = "authorityInfoAccess";
    const LONG_NAME: &'static str = "Authority Information Access";

    /// Items look like `OCSP;URI:http://ocsp.example.com`.
    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let descriptions = split_list(value)
            .map(|item| {
                let (method, location) = item
                    .split_once(';')
                    .ok_or_else(|| format!("expected method;location, found {item:?}"))?;
                let method = match method.trim() {
                    "OCSP" => ID_AD_OCSP,
                    "caIssuers" => ID_AD_CA_ISSUERS,
                    other => ObjectIdentifier::new(other)
                        .map_err(|_| format!("unknown access method {other:?}"))?,
                };
                Ok((method, parse_general_name(location.trim())?))
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;
        if descriptions.is_empty() {
            return Err("no access descriptions given".to_string());
        }
        Ok(Self { descriptions })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let aia = x509_cert::ext::pkix::AuthorityInfoAccessSyntax(
            self.descriptions
                .iter()
                .map(|(method, location)| AccessDescription {
                    access_method: *method,
                    access_location: location.clone(),
                })
                .collect(),
        );
        Ok(aia.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aia = x509_cert::ext::pkix::AuthorityInfoAccessSyntax::from_der(extension)?;
        Ok(Self {
            descriptions: aia
                .0
                .into_iter()
                .map(|d| (d.access_method, d.access_location))
                .collect(),
        })
    }

    fn to_text(&self) -> String {
        self.descriptions
            .iter()
            .map(|(method, location)| {
                let method = match *method {
                    ID_AD_OCSP => "OCSP".to_string(),
                    ID_AD_CA_ISSUERS => "CA Issuers".to_string(),
                    other => other.to_string(),
                };
                format!("{method} - {}", general_name_to_text(location))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Represents the Certificate Policies extension, without qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePolicies {
    pub policies: Vec<ObjectIdentifier>,
}

impl ToAndFromX509Extension for CertificatePolicies {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CertificatePolicies::OID;
    const NAME: &'static str = "certificatePolicies";
    const LONG_NAME: &'static str = "X509v3 Certificate Policies";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let policies = split_list(value)
            .map(|item| {
                ObjectIdentifier::new(item).map_err(|_| format!("invalid policy OID {item:?}"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if policies.is_empty() {
            return Err("no policies given".to_string());
        }
        Ok(Self { policies })
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let policies = x509_cert::ext::pkix::CertificatePolicies(
            self.policies
                .iter()
                .map(|oid| PolicyInformation {
                    policy_identifier: *oid,
                    policy_qualifiers: None,
                })
                .collect(),
        );
        Ok(policies.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let policies = x509_cert::ext::pkix::CertificatePolicies::from_der(extension)?;
        Ok(Self {
            policies: policies.0.into_iter().map(|p| p.policy_identifier).collect(),
        })
    }

    fn to_text(&self) -> String {
        self.policies
            .iter()
            .map(|oid| format!("Policy: {oid}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Represents the Netscape Comment extension: a free-text IA5String.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetscapeComment(pub String);

impl ToAndFromX509Extension for NetscapeComment {
    const OID: ObjectIdentifier = NETSCAPE_COMMENT;
    const NAME: &'static str = "nsComment";
    const LONG_NAME: &'static str = "Netscape Comment";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        ia5(value)?;
        Ok(Self(value.to_string()))
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(Ia5String::new(&self.0)?.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self(Ia5String::from_der(extension)?.to_string()))
    }

    fn to_text(&self) -> String {
        self.0.clone()
    }
}

const NETSCAPE_CERT_TYPES: &[(&str, &str)] = &[
    ("client", "SSL Client"),
    ("server", "SSL Server"),
    ("email", "S/MIME"),
    ("objsign", "Object Signing"),
    ("reserved", "Unused"),
    ("sslCA", "SSL CA"),
    ("emailCA", "S/MIME CA"),
    ("objCA", "Object Signing CA"),
];

/// Represents the Netscape Cert Type extension.
///
/// Bit `i` of the named bit string is `0x80 >> i` in the stored byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetscapeCertType(pub u8);

impl ToAndFromX509Extension for NetscapeCertType {
    const OID: ObjectIdentifier = NETSCAPE_CERT_TYPE;
    const NAME: &'static str = "nsCertType";
    const LONG_NAME: &'static str = "Netscape Cert Type";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let mut bits = 0u8;
        for item in split_list(value) {
            let position = NETSCAPE_CERT_TYPES
                .iter()
                .position(|(name, _)| *name == item)
                .ok_or_else(|| format!("unknown certificate type {item:?}"))?;
            bits |= 0x80 >> position;
        }
        if bits == 0 {
            return Err("no certificate types given".to_string());
        }
        Ok(Self(bits))
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        // DER drops trailing zero bits of a named bit string
        let unused_bits = if self.0 == 0 { 0 } else { self.0.trailing_zeros() as u8 };
        Ok(BitString::new(unused_bits, vec![self.0])?.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let bits = BitString::from_der(extension)?;
        Ok(Self(bits.raw_bytes().first().copied().unwrap_or(0)))
    }

    fn to_text(&self) -> String {
        NETSCAPE_CERT_TYPES
            .iter()
            .enumerate()
            .filter(|(position, _)| (self.0 & (0x80 >> position)) != 0)
            .map(|(_, (_, text))| *text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Represents the Name Constraints extension.
///
/// IP bases carry the address followed by the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConstraints {
    pub permitted: Vec<GeneralName>,
    pub excluded: Vec<GeneralName>,
}

impl ToAndFromX509Extension for NameConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::NameConstraints::OID;
    const NAME: &'static str = "nameConstraints";
    const LONG_NAME: &'static str = "X509v3 Name Constraints";

    /// Items are `permitted;<name>` or `excluded;<name>`. IP names take the
    /// form `IP:<address>/<mask>`.
    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let mut constraints = Self {
            permitted: Vec::new(),
            excluded: Vec::new(),
        };
        for item in split_list(value) {
            let (kind, name) = item
                .split_once(';')
                .ok_or_else(|| format!("expected permitted;name or excluded;name, found {item:?}"))?;
            let name = parse_subtree_base(name.trim())?;
            match kind.trim() {
                "permitted" => constraints.permitted.push(name),
                "excluded" => constraints.excluded.push(name),
                other => return Err(format!("unknown subtree kind {other:?}")),
            }
        }
        if constraints.permitted.is_empty() && constraints.excluded.is_empty() {
            return Err("no subtrees given".to_string());
        }
        Ok(constraints)
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let subtrees = |names: &[GeneralName]| {
            (!names.is_empty()).then(|| {
                names
                    .iter()
                    .map(|name| GeneralSubtree {
                        base: name.clone(),
                        minimum: 0,
                        maximum: None,
                    })
                    .collect::<Vec<_>>()
            })
        };
        let nc = x509_cert::ext::pkix::NameConstraints {
            permitted_subtrees: subtrees(&self.permitted),
            excluded_subtrees: subtrees(&self.excluded),
        };
        Ok(nc.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let nc = x509_cert::ext::pkix::NameConstraints::from_der(extension)?;
        let bases = |subtrees: Option<Vec<GeneralSubtree>>| {
            subtrees
                .unwrap_or_default()
                .into_iter()
                .map(|subtree| subtree.base)
                .collect()
        };
        Ok(Self {
            permitted: bases(nc.permitted_subtrees),
            excluded: bases(nc.excluded_subtrees),
        })
    }

    fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for (label, names) in [("Permitted", &self.permitted), ("Excluded", &self.excluded)] {
            if names.is_empty() {
                continue;
            }
            lines.push(format!("{label}:"));
            lines.extend(names.iter().map(|name| format!("  {}", subtree_base_to_text(name))));
        }
        lines.join("\n")
    }
}

/// Represents the Policy Constraints extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConstraints {
    pub require_explicit_policy: Option<u32>,
    pub inhibit_policy_mapping: Option<u32>,
}

impl ToAndFromX509Extension for PolicyConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::PolicyConstraints::OID;
    const NAME: &'static str = "policyConstraints";
    const LONG_NAME: &'static str = "X509v3 Policy Constraints";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        let mut constraints = Self::default();
        for item in split_list(value) {
            let (key, val) = split_pair(item)?;
            let skip = val
                .parse::<u32>()
                .map_err(|_| format!("invalid skip count {val:?}"))?;
            match key {
                "requireExplicitPolicy" => constraints.require_explicit_policy = Some(skip),
                "inhibitPolicyMapping" => constraints.inhibit_policy_mapping = Some(skip),
                other => return Err(format!("unknown option {other:?}")),
            }
        }
        if constraints == Self::default() {
            return Err("expected requireExplicitPolicy or inhibitPolicyMapping".to_string());
        }
        Ok(constraints)
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let pc = x509_cert::ext::pkix::PolicyConstraints {
            require_explicit_policy: self.require_explicit_policy,
            inhibit_policy_mapping: self.inhibit_policy_mapping,
        };
        Ok(pc.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let pc = x509_cert::ext::pkix::PolicyConstraints::from_der(extension)?;
        Ok(Self {
            require_explicit_policy: pc.require_explicit_policy,
            inhibit_policy_mapping: pc.inhibit_policy_mapping,
        })
    }

    fn to_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(skip) = self.require_explicit_policy {
            parts.push(format!("Require Explicit Policy:{skip}"));
        }
        if let Some(skip) = self.inhibit_policy_mapping {
            parts.push(format!("Inhibit Policy Mapping:{skip}"));
        }
        parts.join(", ")
    }
}

/// Represents the Inhibit anyPolicy extension: a skip count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InhibitAnyPolicy(pub u32);

impl ToAndFromX509Extension for InhibitAnyPolicy {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::InhibitAnyPolicy::OID;
    const NAME: &'static str = "inhibitAnyPolicy";
    const LONG_NAME: &'static str = "X509v3 Inhibit Any Policy";

    fn from_config_value(value: &str, _: &ExtensionContext<'_>) -> std::result::Result<Self, String> {
        value
            .parse::<u32>()
            .map(Self)
            .map_err(|_| format!("invalid skip count {value:?}"))
    }

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(x509_cert::ext::pkix::InhibitAnyPolicy(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self(x509_cert::ext::pkix::InhibitAnyPolicy::from_der(extension)?.0))
    }

    fn to_text(&self) -> String {
        self.0.to_string()
    }
}

type CreateFn = fn(&str, &ExtensionContext<'_>) -> std::result::Result<Vec<u8>, String>;
type DescribeFn = fn(&[u8]) -> Result<String>;

struct Registration {
    name: &'static str,
    long_name: &'static str,
    oid: ObjectIdentifier,
    omit_value: Option<&'static str>,
    create: CreateFn,
    describe: DescribeFn,
}

impl Registration {
    fn of<E: ToAndFromX509Extension>() -> Self {
        Self {
            name: E::NAME,
            long_name: E::LONG_NAME,
            oid: E::OID,
            omit_value: E::OMIT_VALUE,
            create: create_value::<E>,
            describe: describe_value::<E>,
        }
    }
}

fn create_value<E: ToAndFromX509Extension>(
    value: &str,
    context: &ExtensionContext<'_>,
) -> std::result::Result<Vec<u8>, String> {
    E::from_config_value(value, context)?
        .to_x509_extension_value()
        .map_err(|e| e.to_string())
}

fn describe_value<E: ToAndFromX509Extension>(der: &[u8]) -> Result<String> {
    Ok(E::from_x509_extension_value(der)?.to_text())
}

fn registry() -> [Registration; 15] {
    [
        Registration::of::<BasicConstraints>(),
        Registration::of::<KeyUsage>(),
        Registration::of::<ExtendedKeyUsage>(),
        Registration::of::<SubjectKeyIdentifier>(),
        Registration::of::<AuthorityKeyIdentifier>(),
        Registration::of::<SubjectAltName>(),
        Registration::of::<IssuerAltName>(),
        Registration::of::<CrlDistributionPoints>(),
        Registration::of::<AuthorityInfoAccess>(),
        Registration::of::<CertificatePolicies>(),
        Registration::of::<NetscapeComment>(),
        Registration::of::<NetscapeCertType>(),
        Registration::of::<NameConstraints>(),
        Registration::of::<PolicyConstraints>(),
        Registration::of::<InhibitAnyPolicy>(),
    ]
}

/// Finds a known extension by short name, long name or dotted OID.
fn lookup(name: &str) -> Option<Registration> {
    let oid = ObjectIdentifier::new(name).ok();
    registry()
        .into_iter()
        .find(|r| r.name == name || r.long_name == name || Some(r.oid) == oid)
}

/// Creates one extension for the certificate described by `context`.
///
/// A value starting with `critical,` marks the extension critical in
/// addition to the request flag. A value of the form `DER:<hex>` is taken
/// as the raw extension value; that is the only form accepted for OIDs
/// without a known grammar. Key identifiers given as `none` produce no
/// extension.
pub fn create_extension(
    context: &ExtensionContext<'_>,
    request: &ExtensionRequest,
) -> Result<Option<Extension>> {
    let name = request.name.trim();
    let mut value = request.value.trim();
    let mut critical = request.critical;
    if let Some(rest) = value.strip_prefix("critical,") {
        critical = true;
        value = rest.trim_start();
    }

    let invalid = |reason: String| CertifyError::extension(name, reason);
    let registration = lookup(name);
    if registration
        .as_ref()
        .is_some_and(|r| r.omit_value == Some(value))
    {
        return Ok(None);
    }
    let (oid, der) = match (registration, value.strip_prefix("DER:")) {
        (Some(registration), Some(hex)) => (registration.oid, parse_hex(hex).map_err(invalid)?),
        (Some(registration), None) => (
            registration.oid,
            (registration.create)(value, context).map_err(invalid)?,
        ),
        (None, raw) => {
            let oid = ObjectIdentifier::new(name)
                .map_err(|_| CertifyError::extension(name, "unknown extension"))?;
            let hex = raw.ok_or_else(|| {
                CertifyError::extension(name, "value must be given as DER:<hex>")
            })?;
            (oid, parse_hex(hex).map_err(invalid)?)
        }
    };

    Ok(Some(Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(der)?,
    }))
}

/// Name and text body of an extension, as shown in certificate dumps.
///
/// Unknown or undecodable values are shown as hex.
pub fn describe_extension(extension: &Extension) -> (String, String) {
    let bytes = extension.extn_value.as_bytes();
    match registry().into_iter().find(|r| r.oid == extension.extn_id) {
        Some(registration) => (
            registration.long_name.to_string(),
            (registration.describe)(bytes).unwrap_or_else(|_| format_hex(bytes)),
        ),
        None => (extension.extn_id.to_string(), format_hex(bytes)),
    }
}

/// SHA-1 over the subject public key bits, as used for key identifiers.
fn key_identifier(tbs: &TbsCertificateInner) -> Vec<u8> {
    Sha1::digest(tbs.subject_public_key_info.subject_public_key.raw_bytes()).to_vec()
}

fn find_extension(tbs: &TbsCertificateInner, oid: ObjectIdentifier) -> Option<&Extension> {
    tbs.extensions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|ext| ext.extn_id == oid)
}

fn email_addresses(name: &Name) -> std::result::Result<Vec<GeneralName>, String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == EMAIL_ADDRESS)
        .map(|atv| ia5(&attribute_value_to_string(&atv.value)).map(GeneralName::Rfc822Name))
        .collect()
}

fn parse_general_name(item: &str) -> std::result::Result<GeneralName, String> {
    let (kind, value) = item
        .split_once(':')
        .ok_or_else(|| format!("expected type:value, found {item:?}"))?;
    let value = value.trim();
    match kind.trim() {
        "DNS" => Ok(GeneralName::DnsName(ia5(value)?)),
        "email" => Ok(GeneralName::Rfc822Name(ia5(value)?)),
        "URI" => Ok(GeneralName::UniformResourceIdentifier(ia5(value)?)),
        "IP" => {
            let address: IpAddr = value
                .parse()
                .map_err(|_| format!("invalid IP address {value:?}"))?;
            let octets = match address {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            OctetString::new(octets)
                .map(GeneralName::IpAddress)
                .map_err(|e| e.to_string())
        }
        "RID" => ObjectIdentifier::new(value)
            .map(GeneralName::RegisteredId)
            .map_err(|_| format!("invalid OID {value:?}")),
        other => Err(format!("unsupported name type {other:?}")),
    }
}

/// A name constraint base. Only IP bases differ from ordinary names: they
/// carry a mask after the address.
fn parse_subtree_base(item: &str) -> std::result::Result<GeneralName, String> {
    let Some(range) = item.strip_prefix("IP:") else {
        return parse_general_name(item);
    };
    let (address, mask) = range
        .trim()
        .split_once('/')
        .ok_or_else(|| format!("expected address/mask, found {range:?}"))?;
    let parse = |text: &str| {
        text.trim()
            .parse::<IpAddr>()
            .map_err(|_| format!("invalid IP address {text:?}"))
    };
    let octets = match (parse(address)?, parse(mask)?) {
        (IpAddr::V4(address), IpAddr::V4(mask)) => [address.octets(), mask.octets()].concat(),
        (IpAddr::V6(address), IpAddr::V6(mask)) => [address.octets(), mask.octets()].concat(),
        _ => return Err(format!("address and mask differ in family in {range:?}")),
    };
    OctetString::new(octets)
        .map(GeneralName::IpAddress)
        .map_err(|e| e.to_string())
}

fn subtree_base_to_text(name: &GeneralName) -> String {
    let GeneralName::IpAddress(octets) = name else {
        return general_name_to_text(name);
    };
    let bytes = octets.as_bytes();
    match bytes.len() {
        8 => {
            let (address, mask) = bytes.split_at(4);
            let v4 = |b: &[u8]| Ipv4Addr::new(b[0], b[1], b[2], b[3]);
            format!("IP:{}/{}", v4(address), v4(mask))
        }
        32 => {
            let (address, mask) = bytes.split_at(16);
            let v6 = |b: &[u8]| {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(b);
                Ipv6Addr::from(octets)
            };
            format!("IP:{}/{}", v6(address), v6(mask))
        }
        _ => format!("IP:<invalid {}>", format_hex(bytes)),
    }
}

fn general_name_to_text(name: &GeneralName) -> String {
    match name {
        GeneralName::DnsName(dns) => format!("DNS:{dns}"),
        GeneralName::Rfc822Name(email) => format!("email:{email}"),
        GeneralName::UniformResourceIdentifier(uri) => format!("URI:{uri}"),
        GeneralName::IpAddress(octets) => {
            let bytes = octets.as_bytes();
            match bytes.len() {
                4 => {
                    let mut v4 = [0u8; 4];
                    v4.copy_from_slice(bytes);
                    format!("IP Address:{}", Ipv4Addr::from(v4))
                }
                16 => {
                    let mut v6 = [0u8; 16];
                    v6.copy_from_slice(bytes);
                    format!("IP Address:{}", Ipv6Addr::from(v6))
                }
                _ => format!("IP Address:<invalid {}>", format_hex(bytes)),
            }
        }
        GeneralName::RegisteredId(oid) => format!("Registered ID:{oid}"),
        GeneralName::DirectoryName(dn) => format!("DirName:{}", format_name(dn)),
        _ => "othername:<unsupported>".to_string(),
    }
}

fn general_names_to_text(names: &[GeneralName]) -> String {
    names
        .iter()
        .map(general_name_to_text)
        .collect::<Vec<_>>()
        .join(", ")
}

fn ia5(value: &str) -> std::result::Result<Ia5String, String> {
    Ia5String::new(value).map_err(|_| format!("{value:?} is not an IA5 string"))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn split_pair(item: &str) -> std::result::Result<(&str, &str), String> {
    item.split_once(':')
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| format!("expected name:value, found {item:?}"))
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Ok(true),
        "false" | "no" | "n" => Ok(false),
        _ => Err(format!("invalid boolean {value:?}")),
    }
}

/// Hex with optional `:` separators, as in `AB:CD:EF`.
fn parse_hex(value: &str) -> std::result::Result<Vec<u8>, String> {
    let digits: String = value.chars().filter(|c| *c != ':' && !c.is_whitespace()).collect();
    hex::decode(&digits).map_err(|_| format!("invalid hex {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::SignatureAlgorithm;
    use crate::cert::params::{DistinguishedName, Validity, parse_serial_number};
    use crate::key::KeyPair;
    use rand_core::OsRng;
    use x509_cert::certificate::Version;

    fn shell(subject: &DistinguishedName, serial: &str) -> TbsCertificateInner {
        let key_pair = KeyPair::EcdsaP256 {
            secret_key: p256::SecretKey::random(&mut OsRng),
        };
        let name = subject.as_x509_name().unwrap();
        TbsCertificateInner {
            version: Version::V3,
            serial_number: parse_serial_number(serial).unwrap(),
            signature: SignatureAlgorithm::Sha256WithECDSA.into(),
            issuer: name.clone(),
            validity: Validity::parse("2024-01-01", "2025-01-01")
                .unwrap()
                .to_x509_validity()
                .unwrap(),
            subject: name,
            subject_public_key_info: key_pair.public_key().as_spki().unwrap(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        }
    }

    fn request(name: &str, value: &str) -> ExtensionRequest {
        ExtensionRequest {
            name: name.to_string(),
            value: value.to_string(),
            critical: false,
        }
    }

    fn create(tbs: &TbsCertificateInner, name: &str, value: &str) -> Result<Extension> {
        create_extension(&ExtensionContext::new(tbs, None), &request(name, value))
            .map(|ext| ext.expect("extension was omitted"))
    }

    #[test]
    fn test_basic_constraints_with_critical_prefix() {
        let tbs = shell(&DistinguishedName::new().with("CN", "ca"), "1");
        let ext = create(&tbs, "basicConstraints", "critical,CA:TRUE, pathlen:0").unwrap();

        assert!(ext.critical);
        let bc = BasicConstraints::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(
            bc,
            BasicConstraints {
                is_ca: true,
                max_path_length: Some(0)
            }
        );
    }

    #[test]
    fn test_request_flag_marks_critical() {
        let tbs = shell(&DistinguishedName::new().with("CN", "ca"), "1");
        let mut req = request("keyUsage", "keyCertSign,cRLSign");
        req.critical = true;

        let ext = create_extension(&ExtensionContext::new(&tbs, None), &req)
            .unwrap()
            .unwrap();
        assert!(ext.critical);
        let ku = KeyUsage::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(ku, KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign));
        assert_eq!(ku.to_text(), "Certificate Sign, CRL Sign");
    }

    #[test]
    fn test_long_names_and_oids_are_accepted() {
        let tbs = shell(&DistinguishedName::new().with("CN", "ca"), "1");
        for name in ["basicConstraints", "X509v3 Basic Constraints", "2.5.29.19"] {
            let ext = create(&tbs, name, "CA:FALSE").unwrap();
            assert_eq!(ext.extn_id, BasicConstraints::OID);
        }
    }

    #[test]
    fn test_extended_key_usage_with_oid() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        let ext = create(&tbs, "extendedKeyUsage", "serverAuth,1.3.6.1.4.1.311.10.3.4").unwrap();

        let eku = ExtendedKeyUsage::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(eku.usage.len(), 2);
        assert_eq!(
            eku.to_text(),
            "TLS Web Server Authentication, 1.3.6.1.4.1.311.10.3.4"
        );
    }

    #[test]
    fn test_self_issued_key_identifiers_match() {
        let mut tbs = shell(&DistinguishedName::new().with("CN", "root"), "1");
        let ski = create(&tbs, "subjectKeyIdentifier", "hash").unwrap();
        tbs.extensions = Some(vec![ski.clone()]);
        let aki = create(&tbs, "authorityKeyIdentifier", "keyid:always,issuer").unwrap();

        let ski = SubjectKeyIdentifier::from_x509_extension_value(ski.extn_value.as_bytes()).unwrap();
        let aki =
            AuthorityKeyIdentifier::from_x509_extension_value(aki.extn_value.as_bytes()).unwrap();
        assert_eq!(aki.key_identifier, Some(ski.0));
        assert_eq!(aki.authority_cert_issuer, None);
    }

    #[test]
    fn test_authority_key_identifier_uses_issuer() {
        let mut issuer = shell(&DistinguishedName::new().with("CN", "issuer"), "ab");
        issuer.extensions = Some(vec![create(&issuer, "subjectKeyIdentifier", "01:02:03").unwrap()]);
        let subject = shell(&DistinguishedName::new().with("CN", "leaf"), "1");

        let ext = create_extension(
            &ExtensionContext::new(&subject, Some(&issuer)),
            &request("authorityKeyIdentifier", "keyid,issuer:always"),
        )
        .unwrap()
        .unwrap();
        let aki =
            AuthorityKeyIdentifier::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(aki.key_identifier, Some(vec![1, 2, 3]));
        assert_eq!(aki.authority_cert_issuer, Some(issuer.issuer.clone()));
        assert_eq!(aki.authority_cert_serial_number, Some(issuer.serial_number.clone()));
    }

    #[test]
    fn test_subject_alt_name_forms() {
        let subject = DistinguishedName::new()
            .with("CN", "leaf")
            .with("emailAddress", "leaf@example.com");
        let tbs = shell(&subject, "1");
        let ext = create(
            &tbs,
            "subjectAltName",
            "DNS:example.com, IP:192.0.2.1, IP:2001:db8::1, email:copy, URI:https://example.com/",
        )
        .unwrap();

        let san = SubjectAltName::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(
            san.to_text(),
            "DNS:example.com, IP Address:192.0.2.1, IP Address:2001:db8::1, \
             email:leaf@example.com, URI:https://example.com/"
        );
    }

    #[test]
    fn test_issuer_alt_name_copies_issuer_names() {
        let mut issuer = shell(&DistinguishedName::new().with("CN", "issuer"), "2");
        issuer.extensions = Some(vec![create(&issuer, "subjectAltName", "DNS:ca.example.com").unwrap()]);
        let subject = shell(&DistinguishedName::new().with("CN", "leaf"), "1");

        let ext = create_extension(
            &ExtensionContext::new(&subject, Some(&issuer)),
            &request("issuerAltName", "issuer:copy"),
        )
        .unwrap()
        .unwrap();
        let ian = IssuerAltName::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(ian.to_text(), "DNS:ca.example.com");
    }

    #[test]
    fn test_access_and_distribution_points() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        let aia = create(
            &tbs,
            "authorityInfoAccess",
            "OCSP;URI:http://ocsp.example.com,caIssuers;URI:http://ca.example.com/ca.crt",
        )
        .unwrap();
        assert_eq!(
            describe_extension(&aia).1,
            "OCSP - URI:http://ocsp.example.com\nCA Issuers - URI:http://ca.example.com/ca.crt"
        );

        let cdp = create(&tbs, "crlDistributionPoints", "URI:http://crl.example.com/ca.crl").unwrap();
        assert_eq!(
            describe_extension(&cdp),
            (
                "X509v3 CRL Distribution Points".to_string(),
                "Full Name:\n  URI:http://crl.example.com/ca.crl".to_string()
            )
        );
    }

    #[test]
    fn test_comment_and_policies() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        let comment = create(&tbs, "nsComment", "Issued for testing").unwrap();
        assert_eq!(
            describe_extension(&comment),
            ("Netscape Comment".to_string(), "Issued for testing".to_string())
        );

        let policies = create(&tbs, "certificatePolicies", "2.23.140.1.2.1").unwrap();
        assert_eq!(describe_extension(&policies).1, "Policy: 2.23.140.1.2.1");
    }

    #[test]
    fn test_netscape_cert_type() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        let ext = create(&tbs, "nsCertType", "client, email").unwrap();
        // bits 0 and 2 set, five unused bits
        assert_eq!(ext.extn_value.as_bytes(), &[0x03, 0x02, 0x05, 0xa0]);
        assert_eq!(
            describe_extension(&ext),
            ("Netscape Cert Type".to_string(), "SSL Client, S/MIME".to_string())
        );

        let ext = create(&tbs, "nsCertType", "objCA").unwrap();
        assert_eq!(ext.extn_value.as_bytes(), &[0x03, 0x02, 0x00, 0x01]);
        assert_eq!(describe_extension(&ext).1, "Object Signing CA");
    }

    #[test]
    fn test_name_constraints() {
        let tbs = shell(&DistinguishedName::new().with("CN", "ca"), "1");
        let ext = create(
            &tbs,
            "nameConstraints",
            "critical,permitted;DNS:example.com,permitted;IP:192.168.0.0/255.255.0.0,excluded;email:.example.org",
        )
        .unwrap();
        assert!(ext.critical);

        let nc = NameConstraints::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(nc.permitted.len(), 2);
        assert_eq!(
            nc.permitted[1],
            GeneralName::IpAddress(OctetString::new([192, 168, 0, 0, 255, 255, 0, 0]).unwrap())
        );
        assert_eq!(
            nc.to_text(),
            "Permitted:\n  DNS:example.com\n  IP:192.168.0.0/255.255.0.0\nExcluded:\n  email:.example.org"
        );
    }

    #[test]
    fn test_policy_constraints_and_inhibit_any_policy() {
        let tbs = shell(&DistinguishedName::new().with("CN", "ca"), "1");
        let pc = create(&tbs, "policyConstraints", "requireExplicitPolicy:0,inhibitPolicyMapping:2")
            .unwrap();
        assert_eq!(
            describe_extension(&pc),
            (
                "X509v3 Policy Constraints".to_string(),
                "Require Explicit Policy:0, Inhibit Policy Mapping:2".to_string()
            )
        );
        // [0] IMPLICIT 0, [1] IMPLICIT 2
        assert_eq!(
            pc.extn_value.as_bytes(),
            &[0x30, 0x06, 0x80, 0x01, 0x00, 0x81, 0x01, 0x02]
        );

        let iap = create(&tbs, "inhibitAnyPolicy", "1").unwrap();
        assert_eq!(iap.extn_value.as_bytes(), &[0x02, 0x01, 0x01]);
        assert_eq!(
            describe_extension(&iap),
            ("X509v3 Inhibit Any Policy".to_string(), "1".to_string())
        );
    }

    #[test]
    fn test_key_identifiers_can_be_omitted() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        for name in ["subjectKeyIdentifier", "authorityKeyIdentifier"] {
            let ext = create_extension(&ExtensionContext::new(&tbs, None), &request(name, "none"))
                .unwrap();
            assert_eq!(ext, None);
        }
    }

    #[test]
    fn test_raw_der_for_unknown_oid() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        let ext = create(&tbs, "1.3.6.1.4.1.99999.1", "DER:05:00").unwrap();
        assert_eq!(ext.extn_value.as_bytes(), &[0x05, 0x00]);
        assert_eq!(
            describe_extension(&ext),
            ("1.3.6.1.4.1.99999.1".to_string(), "05:00".to_string())
        );

        let err = create(&tbs, "1.3.6.1.4.1.99999.1", "hello").unwrap_err();
        assert!(matches!(err, CertifyError::InvalidExtension { .. }));
    }

    #[test]
    fn test_invalid_extensions() {
        let tbs = shell(&DistinguishedName::new().with("CN", "leaf"), "1");
        for (name, value) in [
            ("noSuchExtension", "x"),
            ("basicConstraints", "CA:maybe"),
            ("basicConstraints", "pathlen:-1"),
            ("keyUsage", "flying"),
            ("keyUsage", ""),
            ("subjectAltName", "DNS"),
            ("subjectAltName", "IP:300.1.1.1"),
            ("subjectAltName", "email:copy"),
            ("authorityKeyIdentifier", "sometimes"),
            ("subjectKeyIdentifier", "zz"),
            ("nsCertType", "webServer"),
            ("nsCertType", ""),
            ("nameConstraints", "DNS:example.com"),
            ("nameConstraints", "allowed;DNS:example.com"),
            ("nameConstraints", "permitted;IP:10.0.0.0"),
            ("nameConstraints", "permitted;IP:10.0.0.0/ffff::"),
            ("policyConstraints", ""),
            ("policyConstraints", "requireExplicitPolicy:-1"),
            ("inhibitAnyPolicy", "x"),
        ] {
            let err = create(&tbs, name, value).unwrap_err();
            assert!(
                matches!(&err, CertifyError::InvalidExtension { name: n, .. } if n == name),
                "{name}={value} gave {err:?}"
            );
        }
    }
}
