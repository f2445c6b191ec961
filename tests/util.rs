#![allow(dead_code)]

use certify::cert::params::DistinguishedName;
use certify::key::{KeyMaterial, KeyPair};
use certify::proof::SignedPublicKeyAndChallenge;
use certify::request::{ExtensionRequest, IssuanceRequest};
use pkcs8::{EncodePrivateKey, LineEnding};
use rand_core::OsRng;

pub const STARTED_AT: &str = "2024-01-01 00:00:00 UTC";
pub const EXPIRES_AT: &str = "2049-12-31 23:59:59 UTC";

pub fn p256_key_pem() -> String {
    p256::SecretKey::random(&mut OsRng)
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string()
}

pub fn p384_key_pem() -> String {
    p384::SecretKey::random(&mut OsRng)
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string()
}

pub fn p521_key_pem() -> String {
    p521::SecretKey::random(&mut OsRng)
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string()
}

pub fn ed25519_key_pem() -> String {
    ed25519_dalek::SigningKey::generate(&mut OsRng)
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string()
}

/// PKCS#8 RSA key, generated with OpenSSL for speed.
pub fn rsa_key_pem(bits: u32) -> String {
    let rsa = openssl::rsa::Rsa::generate(bits).unwrap();
    let pkey = openssl::pkey::PKey::from_rsa(rsa).unwrap();
    String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap()
}

/// PKCS#1 (`RSA PRIVATE KEY`) RSA key.
pub fn rsa_pkcs1_key_pem(bits: u32) -> String {
    let rsa = openssl::rsa::Rsa::generate(bits).unwrap();
    String::from_utf8(rsa.private_key_to_pem().unwrap()).unwrap()
}

/// SEC1 (`EC PRIVATE KEY`) P-256 key.
pub fn sec1_key_pem() -> String {
    let group = openssl::ec::EcGroup::from_curve_name(openssl::nid::Nid::X9_62_PRIME256V1).unwrap();
    let key = openssl::ec::EcKey::generate(&group).unwrap();
    String::from_utf8(key.private_key_to_pem().unwrap()).unwrap()
}

pub fn public_key_pem(private_key_pem: &str) -> String {
    KeyMaterial::from_pem(private_key_pem)
        .unwrap()
        .public_key()
        .to_pem()
        .unwrap()
}

pub fn key_pair(private_key_pem: &str) -> KeyPair {
    match KeyMaterial::from_pem(private_key_pem).unwrap() {
        KeyMaterial::Private(key_pair) => key_pair,
        KeyMaterial::Public(_) => panic!("expected a private key"),
    }
}

/// Base64 SPKAC proving possession of `private_key_pem`.
pub fn spkac(private_key_pem: &str, challenge: &str) -> String {
    SignedPublicKeyAndChallenge::sign(&key_pair(private_key_pem), challenge)
        .unwrap()
        .to_base64()
        .unwrap()
}

/// A self-signed request for `CN=leaf.example.com` with the given key.
pub fn leaf_request(subject_key_pem: &str) -> IssuanceRequest {
    IssuanceRequest::builder()
        .subject(
            DistinguishedName::new()
                .with("C", "US")
                .with("O", "Example")
                .with("CN", "leaf.example.com"),
        )
        .subject_key_pem(subject_key_pem.to_string())
        .serial_number("1A")
        .started_at(STARTED_AT)
        .expires_at(EXPIRES_AT)
        .build()
}

pub struct Ca {
    pub cert_pem: String,
    pub key_pem: String,
}

/// A self-signed P-256 CA with key identifiers.
pub fn generate_ca() -> Ca {
    let key_pem = p256_key_pem();
    let request = IssuanceRequest::builder()
        .subject(
            DistinguishedName::new()
                .with("O", "Example")
                .with("CN", "Example Root CA"),
        )
        .subject_key_pem(key_pem.clone())
        .serial_number("01")
        .started_at(STARTED_AT)
        .expires_at(EXPIRES_AT)
        .extensions(vec![
            ExtensionRequest::new("basicConstraints", "CA:TRUE", true),
            ExtensionRequest::new("keyUsage", "keyCertSign,cRLSign", true),
            ExtensionRequest::new("subjectKeyIdentifier", "hash", false),
            ExtensionRequest::new("authorityKeyIdentifier", "keyid:always", false),
        ])
        .build();

    let result = certify::certify(&request).unwrap();
    Ca {
        cert_pem: result.certificate.pem,
        key_pem,
    }
}

/// A request for `CN=server.example.com` issued by `ca`.
pub fn server_request(ca: &Ca, subject_key_pem: &str) -> IssuanceRequest {
    IssuanceRequest::builder()
        .subject(DistinguishedName::new().with("CN", "server.example.com"))
        .subject_key_pem(subject_key_pem.to_string())
        .signing_key_pem(ca.key_pem.clone())
        .signing_certificate_pem(ca.cert_pem.clone())
        .serial_number("0x1000")
        .started_at(STARTED_AT)
        .expires_at(EXPIRES_AT)
        .extensions(vec![
            ExtensionRequest::new("basicConstraints", "CA:FALSE", true),
            ExtensionRequest::new("keyUsage", "digitalSignature,keyEncipherment", true),
            ExtensionRequest::new("extendedKeyUsage", "serverAuth", false),
            ExtensionRequest::new("subjectAltName", "DNS:server.example.com,IP:192.0.2.10", false),
            ExtensionRequest::new("subjectKeyIdentifier", "hash", false),
            ExtensionRequest::new("authorityKeyIdentifier", "keyid", false),
        ])
        .build()
}

/// RSA public key whose proofs below were made with `openssl spkac`.
pub const OPENSSL_RSA_PUBLIC_KEY_PEM: &str = "\
-----BEGIN PUBLIC KEY-----\n\
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAtc67l9dacVtu/+nkOITJ\n\
zX2jEuMeJ31vLTNeUogUFPZkjak/ZYNhuAyN6Rt8ZluckAL0lN8mp15j/LCeiMy2\n\
SmXh+qU7km6R8oZM2FUNkEZbLzaOrZxnnoiYRYEm3P43DcHt5EupZQtH6OvIzuyl\n\
rYMw4gOy5vKaGIZpjGVRS0pyG61s8DUy0ZfpU5pTnqxld+U8+ORaBlsL9cDUA/uh\n\
7TnoS6Jo7yURwPTuF2GehIpxtyvwDb5iwFKX8lRjP1UDd2vUCkkepO1GzP3xxzxO\n\
guG/PKUzVw670UmMz7gcEkx1eP5pXiD5k8/Glr0LLTckmDuYDuU+ZEY6A6FFp/xg\n\
PQIDAQAB\n\
-----END PUBLIC KEY-----\n\
";

/// `openssl spkac -key rsa.pem -challenge hello` (MD5, the tool's default digest).
pub const OPENSSL_SPKAC_MD5: &str = "SPKAC=MIICRTCCAS0wggEiMA0GCSqGSIb3DQEBAQUAA4IBDwAwggEKAoIBAQC1zruX11pxW27/6eQ4hMnNfaMS4x4nfW8tM15SiBQU9mSNqT9lg2G4DI3pG3xmW5yQAvSU3yanXmP8sJ6IzLZKZeH6pTuSbpHyhkzYVQ2QRlsvNo6tnGeeiJhFgSbc/jcNwe3kS6llC0fo68jO7KWtgzDiA7Lm8poYhmmMZVFLSnIbrWzwNTLRl+lTmlOerGV35Tz45FoGWwv1wNQD+6HtOehLomjvJRHA9O4XYZ6EinG3K/ANvmLAUpfyVGM/VQN3a9QKSR6k7UbM/fHHPE6C4b88pTNXDrvRSYzPuBwSTHV4/mleIPmTz8aWvQstNySYO5gO5T5kRjoDoUWn/GA9AgMBAAEWBWhlbGxvMA0GCSqGSIb3DQEBBAUAA4IBAQAR5MlysV28NJ8Aqh9atXF9mY6YEIaaDQefsOYqPagt1v9rJYVfbDNxPhZa+8thP+bRp1cwbdRSY85TWBaE4sjMFypd9NrWgOjMd9lssgBwiSVwNro6gF2xQURyY/6AwmNQPPc0+tx95T6wzUJo3AcdUM23F+lpYe3PeddymeDeI6WLE3BIcXS4BzAEv7PKfyyEcZssBMmJ4/7wV+oy9dwzmP3yzAx8ksVxjxC2TsyRoQg6fGKu5WzQCvGsD8AtBedv5qg5WqSvS/UDrW85kuyCAVYyY4rCPuUNrc81V4yunMhG5zmiNXr0hlxDW2+1DjZDRNZiRPK++1a5fHhvhwVH";

/// `openssl spkac -key rsa.pem -challenge hello -digest sha256`.
pub const OPENSSL_SPKAC_SHA256: &str = "SPKAC=MIICRTCCAS0wggEiMA0GCSqGSIb3DQEBAQUAA4IBDwAwggEKAoIBAQC1zruX11pxW27/6eQ4hMnNfaMS4x4nfW8tM15SiBQU9mSNqT9lg2G4DI3pG3xmW5yQAvSU3yanXmP8sJ6IzLZKZeH6pTuSbpHyhkzYVQ2QRlsvNo6tnGeeiJhFgSbc/jcNwe3kS6llC0fo68jO7KWtgzDiA7Lm8poYhmmMZVFLSnIbrWzwNTLRl+lTmlOerGV35Tz45FoGWwv1wNQD+6HtOehLomjvJRHA9O4XYZ6EinG3K/ANvmLAUpfyVGM/VQN3a9QKSR6k7UbM/fHHPE6C4b88pTNXDrvRSYzPuBwSTHV4/mleIPmTz8aWvQstNySYO5gO5T5kRjoDoUWn/GA9AgMBAAEWBWhlbGxvMA0GCSqGSIb3DQEBCwUAA4IBAQAd3CKMtWujUsoafECPe2rgDlZ2rgFT+SgyOnMtP4t6JVGSMCkuI2FvT1kRg14EKWpMfiniNDY1I5S2iaL8JOFfQUaM7QbCDBOaX5gPsz1gjsPVvAIGux0gzTX7nLORw7hcbnwUKm4b6Q7z7tWHaVK+/TwcNcsCKlqTkQ+rFKhQL5b5v8+WFfoJM8t4VhLiNgC40K12OJ/GdqGEZZuHzE7WE6PG8Naye9vBVQnLXHHSUfZMXvaUzP1Acjoria9vn6eXAzljf9EWqi4AaSW4fWFI+hk7eBHE9V7riS1yfukb/ZF9bQx9uIvDJEgbPjs03A3bd5PbRDdcXeaQrxcQK/Zs";

/// P-521 public key of the proof below.
pub const OPENSSL_P521_PUBLIC_KEY_PEM: &str = "\
-----BEGIN PUBLIC KEY-----\n\
MIGbMBAGByqGSM49AgEGBSuBBAAjA4GGAAQAEtSaWlxceSxJZ8u/u8nAwHNsGMIs\n\
2iSP9CI9PU+ysAQzNWIawXQgI5rU52Yg7oq3s4XP52Q3tDg0BvsLVR2Gjn0A9vnC\n\
J8aoHYMkr/a7lSi2YxnQE+FAcwscVon1WJTSX3jgX/RZJHOKy7Xr6G6ZA09RHotR\n\
wT9H7sSSmUu7+3nMczY=\n\
-----END PUBLIC KEY-----\n\
";

/// `openssl spkac -key p521.pem -challenge hello -digest sha256`.
pub const OPENSSL_SPKAC_P521_SHA256: &str = "SPKAC=MIIBQzCBpTCBmzAQBgcqhkjOPQIBBgUrgQQAIwOBhgAEABLUmlpcXHksSWfLv7vJwMBzbBjCLNokj/QiPT1PsrAEMzViGsF0ICOa1OdmIO6Kt7OFz+dkN7Q4NAb7C1Udho59APb5wifGqB2DJK/2u5UotmMZ0BPhQHMLHFaJ9ViU0l944F/0WSRzisu16+humQNPUR6LUcE/R+7EkplLu/t5zHM2FgVoZWxsbzAKBggqhkjOPQQDAgOBjAAwgYgCQgDIo8edzMbXW6FVNxIFUyWE1+vA7bss4cRicAg8eebF/4ghBH8u6GgTq3+Nx/tdfIghlwR//dM8ahvTe01zh/SMwAJCAItQ8zqCzSHCwRcCV0erJp3fsjW2lJnzfJWxe6mGBCAkObD8ljvdKw1KkBKKgq2i1pYY2ns/Rff2dR35+q1eXqZX";
