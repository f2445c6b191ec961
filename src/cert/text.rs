//! Human-readable certificate dumps in the layout of `openssl x509 -text`.

use std::fmt::Write;

use num_bigint::BigUint;
use rsa::traits::PublicKeyParts;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

use super::SignatureAlgorithm;
use super::extensions::describe_extension;
use super::params::{attribute_short_name, attribute_value_to_string};
use crate::key::PublicKey;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Renders every field of `certificate` as indented text.
pub fn render_certificate(certificate: &CertificateInner) -> String {
    let tbs = &certificate.tbs_certificate;
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Certificate:");
    let _ = writeln!(out, "    Data:");
    let version = tbs.version as u8;
    let _ = writeln!(out, "        Version: {} (0x{:x})", version + 1, version);
    out.push_str(&render_serial(tbs.serial_number.as_bytes()));
    let _ = writeln!(
        out,
        "        Signature Algorithm: {}",
        algorithm_name(&tbs.signature.oid)
    );
    let _ = writeln!(out, "        Issuer: {}", format_name(&tbs.issuer));
    let _ = writeln!(out, "        Validity");
    let _ = writeln!(out, "            Not Before: {}", format_time(&tbs.validity.not_before));
    let _ = writeln!(out, "            Not After : {}", format_time(&tbs.validity.not_after));
    let _ = writeln!(out, "        Subject: {}", format_name(&tbs.subject));
    let _ = writeln!(out, "        Subject Public Key Info:");
    out.push_str(&render_public_key(&tbs.subject_public_key_info));

    let extensions = tbs.extensions.as_deref().unwrap_or_default();
    if !extensions.is_empty() {
        let _ = writeln!(out, "        X509v3 extensions:");
        for extension in extensions {
            let (name, body) = describe_extension(extension);
            let critical = if extension.critical { " critical" } else { "" };
            let _ = writeln!(out, "            {name}:{critical}");
            for line in body.lines() {
                let _ = writeln!(out, "                {line}");
            }
        }
    }

    let _ = writeln!(
        out,
        "    Signature Algorithm: {}",
        algorithm_name(&certificate.signature_algorithm.oid)
    );
    let _ = writeln!(out, "    Signature Value:");
    out.push_str(&hex_block(certificate.signature.raw_bytes(), 18, 8));
    out
}

/// Formats a name as `CN=example, O=Example`, multi-valued RDNs joined by `+`.
pub fn format_name(name: &Name) -> String {
    name.0
        .iter()
        .map(|rdn| {
            rdn.0
                .iter()
                .map(|atv| {
                    let label = attribute_short_name(&atv.oid)
                        .map_or_else(|| atv.oid.to_string(), str::to_string);
                    format!("{label}={}", attribute_value_to_string(&atv.value))
                })
                .collect::<Vec<_>>()
                .join(" + ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Uppercase hex octets separated by `:`.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Formats a time like `Jan  1 00:00:00 2024 GMT`.
fn format_time(time: &Time) -> String {
    let dt = time.to_date_time();
    let month = MONTHS
        .get(usize::from(dt.month()).saturating_sub(1))
        .copied()
        .unwrap_or("???");
    format!(
        "{month} {:>2} {:02}:{:02}:{:02} {} GMT",
        dt.day(),
        dt.hour(),
        dt.minutes(),
        dt.seconds(),
        dt.year()
    )
}

/// Small serials print as decimal plus hex, large ones as an octet string.
fn render_serial(bytes: &[u8]) -> String {
    let value = BigUint::from_bytes_be(bytes);
    if value.bits() <= 63 {
        format!("        Serial Number: {value} (0x{value:x})\n")
    } else {
        format!(
            "        Serial Number:\n            {}\n",
            hex_lower(&value.to_bytes_be())
        )
    }
}

fn algorithm_name(oid: &const_oid::ObjectIdentifier) -> String {
    SignatureAlgorithm::from_oid(*oid).map_or_else(|| oid.to_string(), |a| a.name().to_string())
}

fn render_public_key(spki: &SubjectPublicKeyInfoOwned) -> String {
    let mut out = String::new();
    let indent = "                ";
    match PublicKey::from_x509spki(spki) {
        Ok(PublicKey::Rsa(key)) => {
            let _ = writeln!(out, "            Public Key Algorithm: rsaEncryption");
            let _ = writeln!(out, "{indent}Public-Key: ({} bit)", key.size() * 8);
            let _ = writeln!(out, "{indent}Modulus:");
            let mut modulus = key.n().to_bytes_be();
            if modulus.first().is_some_and(|b| b & 0x80 != 0) {
                modulus.insert(0, 0);
            }
            out.push_str(&hex_block(&modulus, 15, 20));
            let exponent = BigUint::from_bytes_be(&key.e().to_bytes_be());
            let _ = writeln!(out, "{indent}Exponent: {exponent} (0x{exponent:x})");
        }
        Ok(PublicKey::Ed25519(_)) => {
            let _ = writeln!(out, "            Public Key Algorithm: ED25519");
            let _ = writeln!(out, "{indent}ED25519 Public-Key:");
            let _ = writeln!(out, "{indent}pub:");
            out.push_str(&hex_block(spki.subject_public_key.raw_bytes(), 15, 20));
        }
        Ok(key) => {
            let (oid_name, nist_name) = match key {
                PublicKey::EcdsaP384(_) => ("secp384r1", "P-384"),
                PublicKey::EcdsaP521(_) => ("secp521r1", "P-521"),
                _ => ("prime256v1", "P-256"),
            };
            let _ = writeln!(out, "            Public Key Algorithm: id-ecPublicKey");
            let _ = writeln!(out, "{indent}Public-Key: ({} bit)", key.bits());
            let _ = writeln!(out, "{indent}pub:");
            out.push_str(&hex_block(spki.subject_public_key.raw_bytes(), 15, 20));
            let _ = writeln!(out, "{indent}ASN1 OID: {oid_name}");
            let _ = writeln!(out, "{indent}NIST CURVE: {nist_name}");
        }
        Err(_) => {
            let _ = writeln!(out, "            Public Key Algorithm: {}", spki.algorithm.oid);
            out.push_str(&hex_block(spki.subject_public_key.raw_bytes(), 15, 20));
        }
    }
    out
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Lowercase colon-separated hex, `per_line` octets per line, every line but
/// the last ending in `:`.
fn hex_block(bytes: &[u8], per_line: usize, indent: usize) -> String {
    let lines: Vec<String> = bytes.chunks(per_line).map(hex_lower).collect();
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let separator = if i + 1 < lines.len() { ":" } else { "" };
        let _ = writeln!(out, "{pad}{line}{separator}");
    }
    out
}
