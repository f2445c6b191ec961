use std::fmt;

use const_oid::ObjectIdentifier;
use der::asn1::{
    Any, GeneralizedTime, Ia5StringRef, PrintableStringRef, SetOfVec, UtcTime, Utf8StringRef,
};
use der::{Tag, Tagged};
use num_bigint::BigUint;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;

use crate::error::{CertifyError, Result};

/// ASN.1 string type an attribute value is encoded as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StringKind {
    Utf8,
    Printable,
    Ia5,
}

struct AttributeType {
    short_name: &'static str,
    long_name: &'static str,
    oid: &'static str,
    kind: StringKind,
}

const fn attribute(
    short_name: &'static str,
    long_name: &'static str,
    oid: &'static str,
    kind: StringKind,
) -> AttributeType {
    AttributeType {
        short_name,
        long_name,
        oid,
        kind,
    }
}

const ATTRIBUTE_TYPES: &[AttributeType] = &[
    attribute("C", "countryName", "2.5.4.6", StringKind::Printable),
    attribute("ST", "stateOrProvinceName", "2.5.4.8", StringKind::Utf8),
    attribute("L", "localityName", "2.5.4.7", StringKind::Utf8),
    attribute("O", "organizationName", "2.5.4.10", StringKind::Utf8),
    attribute("OU", "organizationalUnitName", "2.5.4.11", StringKind::Utf8),
    attribute("CN", "commonName", "2.5.4.3", StringKind::Utf8),
    attribute("street", "streetAddress", "2.5.4.9", StringKind::Utf8),
    attribute("serialNumber", "serialNumber", "2.5.4.5", StringKind::Printable),
    attribute("title", "title", "2.5.4.12", StringKind::Utf8),
    attribute("SN", "surname", "2.5.4.4", StringKind::Utf8),
    attribute("GN", "givenName", "2.5.4.42", StringKind::Utf8),
    attribute("initials", "initials", "2.5.4.43", StringKind::Utf8),
    attribute("generationQualifier", "generationQualifier", "2.5.4.44", StringKind::Utf8),
    attribute("dnQualifier", "dnQualifier", "2.5.4.46", StringKind::Printable),
    attribute("pseudonym", "pseudonym", "2.5.4.65", StringKind::Utf8),
    attribute("postalCode", "postalCode", "2.5.4.17", StringKind::Utf8),
    attribute("name", "name", "2.5.4.41", StringKind::Utf8),
    attribute("businessCategory", "businessCategory", "2.5.4.15", StringKind::Utf8),
    attribute("emailAddress", "emailAddress", "1.2.840.113549.1.9.1", StringKind::Ia5),
    attribute("DC", "domainComponent", "0.9.2342.19200300.100.1.25", StringKind::Ia5),
    attribute("UID", "userId", "0.9.2342.19200300.100.1.1", StringKind::Utf8),
];

/// Resolves an attribute type given as short name, long name or dotted OID.
/// Names match case-sensitively, as in OpenSSL.
fn lookup_attribute(name: &str) -> Option<(ObjectIdentifier, StringKind)> {
    if let Some(known) = ATTRIBUTE_TYPES
        .iter()
        .find(|a| a.short_name == name || a.long_name == name)
    {
        return Some((ObjectIdentifier::new_unwrap(known.oid), known.kind));
    }

    let oid = ObjectIdentifier::new(name).ok()?;
    let kind = ATTRIBUTE_TYPES
        .iter()
        .find(|a| a.oid == name)
        .map_or(StringKind::Utf8, |a| a.kind);
    Some((oid, kind))
}

/// Short name for an attribute OID, for rendering names.
pub fn attribute_short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    let dotted = oid.to_string();
    ATTRIBUTE_TYPES
        .iter()
        .find(|a| a.oid == dotted)
        .map(|a| a.short_name)
}

/// An ordered list of distinguished name attributes.
///
/// Each `(type, value)` pair becomes its own relative distinguished name, in
/// the order given. Types may be OpenSSL short names (`CN`), long names
/// (`commonName`) or dotted OIDs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub attributes: Vec<(String, String)>,
}

impl DistinguishedName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute; the builder form of [`DistinguishedName::push`].
    pub fn with(mut self, attribute_type: &str, value: &str) -> Self {
        self.push(attribute_type, value);
        self
    }

    pub fn push(&mut self, attribute_type: &str, value: &str) {
        self.attributes
            .push((attribute_type.to_string(), value.to_string()));
    }

    /// Converts the distinguished name to an X.509 name.
    ///
    /// An empty attribute list yields an empty `RDNSequence`.
    pub fn as_x509_name(&self) -> Result<Name> {
        let rdns = self
            .attributes
            .iter()
            .map(|(attribute_type, value)| {
                let atv = encode_attribute(attribute_type, value)?;
                let set = SetOfVec::try_from(vec![atv]).map_err(|e| {
                    invalid_attribute(attribute_type, e.to_string())
                })?;
                Ok(RelativeDistinguishedName(set))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RdnSequence(rdns))
    }
}

impl<'de> Deserialize<'de> for DistinguishedName {
    /// Reads a map of attribute types to values, keeping document order and
    /// repeated keys.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = DistinguishedName;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of attribute types to string values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut attributes = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    attributes.push(entry);
                }
                Ok(DistinguishedName { attributes })
            }
        }

        deserializer.deserialize_map(AttributesVisitor)
    }
}

fn encode_attribute(attribute_type: &str, value: &str) -> Result<AttributeTypeAndValue> {
    let (oid, kind) = lookup_attribute(attribute_type)
        .ok_or_else(|| invalid_attribute(attribute_type, "unknown attribute type"))?;

    let encoded = match kind {
        StringKind::Utf8 => Utf8StringRef::new(value).and_then(|s| Any::encode_from(&s)),
        StringKind::Printable => {
            if oid == ObjectIdentifier::new_unwrap("2.5.4.6") && value.chars().count() != 2 {
                return Err(invalid_attribute(
                    attribute_type,
                    "country code must be two characters",
                ));
            }
            PrintableStringRef::new(value).and_then(|s| Any::encode_from(&s))
        }
        StringKind::Ia5 => Ia5StringRef::new(value).and_then(|s| Any::encode_from(&s)),
    };
    let value = encoded.map_err(|e| {
        invalid_attribute(attribute_type, format!("value {value:?} cannot be encoded: {e}"))
    })?;

    Ok(AttributeTypeAndValue { oid, value })
}

fn invalid_attribute(attribute_type: &str, reason: impl Into<String>) -> CertifyError {
    CertifyError::InvalidSubjectAttribute {
        attribute: attribute_type.to_string(),
        reason: reason.into(),
    }
}

/// Decodes an attribute or general string value for display.
pub fn attribute_value_to_string(value: &Any) -> String {
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::TeletexString
        | Tag::VisibleString => String::from_utf8_lossy(value.value()).into_owned(),
        Tag::BmpString => {
            let units: Vec<u16> = value
                .value()
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => hex::encode(value.value()),
    }
}

/// Parses a hexadecimal serial number, with or without a `0x` prefix.
///
/// Zero is accepted. The value must fit the 20 octets RFC 5280 allows.
pub fn parse_serial_number(serial: &str) -> Result<SerialNumber> {
    let invalid = |reason: &str| CertifyError::InvalidSerialNumber {
        serial: serial.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = serial.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("not a hexadecimal number"));
    }

    let value = BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| invalid("not a hexadecimal number"))?;
    SerialNumber::new(&value.to_bytes_be()).map_err(|_| invalid("longer than 20 octets"))
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
/// The order of the two instants is not checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Parses both ends of the window from request timestamps.
    pub fn parse(started_at: &str, expires_at: &str) -> Result<Self> {
        Ok(Self {
            not_before: parse_timestamp(started_at)?,
            not_after: parse_timestamp(expires_at)?,
        })
    }

    /// Encodes the window, as UTCTime before 2050 and GeneralizedTime after.
    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

/// Parses a timestamp into an absolute instant.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` with an optional zone
/// (`UTC`, `GMT`, `Z`, `±HH:MM`, `±HHMM`) and bare dates. A missing zone
/// means UTC.
pub fn parse_timestamp(timestamp: &str) -> Result<OffsetDateTime> {
    let invalid = |reason: &str| CertifyError::InvalidTimestamp {
        timestamp: timestamp.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = timestamp.trim();
    let parsed = OffsetDateTime::parse(trimmed, &Rfc3339)
        .ok()
        .or_else(|| parse_with_offset(trimmed))
        .or_else(|| parse_utc(trimmed))
        .ok_or_else(|| invalid("unrecognized date format"))?;

    let parsed = parsed.to_offset(UtcOffset::UTC);
    if !(1970..=9999).contains(&parsed.year()) {
        return Err(invalid("year must be between 1970 and 9999"));
    }
    Ok(parsed)
}

fn parse_with_offset(input: &str) -> Option<OffsetDateTime> {
    let with_colon = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]] [offset_hour sign:mandatory]:[offset_minute]"
    );
    let without_colon = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]] [offset_hour sign:mandatory][offset_minute]"
    );
    OffsetDateTime::parse(input, with_colon)
        .or_else(|_| OffsetDateTime::parse(input, without_colon))
        .ok()
}

fn parse_utc(input: &str) -> Option<OffsetDateTime> {
    let bare = ["UTC", "GMT", "Z"]
        .iter()
        .find_map(|zone| input.strip_suffix(zone))
        .unwrap_or(input)
        .trim_end();

    let spaced = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
    let separated = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    let date_only = format_description!("[year]-[month]-[day]");

    PrimitiveDateTime::parse(bare, spaced)
        .or_else(|_| PrimitiveDateTime::parse(bare, separated))
        .or_else(|_| Date::parse(bare, date_only).map(|date| date.midnight()))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn to_x509_time(instant: OffsetDateTime) -> Result<Time> {
    let instant = instant.to_offset(UtcOffset::UTC);
    let year = u16::try_from(instant.year()).map_err(|_| CertifyError::InvalidTimestamp {
        timestamp: instant.to_string(),
        reason: "year out of range".to_string(),
    })?;
    let date_time = der::DateTime::new(
        year,
        u8::from(instant.month()),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second(),
    )
    .map_err(|e| CertifyError::InvalidTimestamp {
        timestamp: instant.to_string(),
        reason: e.to_string(),
    })?;

    if year < 2050 {
        Ok(Time::UtcTime(UtcTime::from_date_time(date_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}
