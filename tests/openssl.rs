mod util;

use certify::certify;
use certify::request::ExtensionRequest;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509StoreContext};
use regex::Regex;

fn common_name(name: &openssl::x509::X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_reads_self_signed_cert() {
    let key_pem = util::rsa_key_pem(2048);
    let result = certify(&util::leaf_request(&key_pem)).unwrap();

    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    let key = PKey::public_key_from_pem(result.public_key.pem.as_bytes()).unwrap();
    assert!(cert.verify(&key).unwrap());

    assert_eq!(cert.version(), 2);
    assert_eq!(cert.serial_number().to_bn().unwrap().to_dec_str().unwrap().to_string(), "26");
    assert_eq!(common_name(cert.subject_name()), "leaf.example.com");
    assert_eq!(common_name(cert.issuer_name()), "leaf.example.com");
    assert_eq!(
        cert.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    // OpenSSL sees the same bytes and the same key
    let der = cert.to_der().unwrap();
    assert_eq!(
        result.certificate.der_base64,
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &der)
    );
    let digest = cert.digest(MessageDigest::sha1()).unwrap();
    assert_eq!(result.certificate.sha1_fingerprint_hex, hex::encode(&*digest));
    assert_eq!(
        cert.public_key().unwrap().public_key_to_der().unwrap(),
        key.public_key_to_der().unwrap()
    );
}

#[test]
fn test_openssl_validate_chain() {
    let ca = util::generate_ca();
    let result = certify(&util::server_request(&ca, &util::p256_key_pem())).unwrap();

    let ca_cert = X509::from_pem(ca.cert_pem.as_bytes()).unwrap();
    let server_cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();

    assert!(server_cert.verify(&ca_cert.public_key().unwrap()).unwrap());
    assert_eq!(
        server_cert.signature_algorithm().object().nid(),
        Nid::ECDSA_WITH_SHA256
    );
    assert_eq!(common_name(server_cert.issuer_name()), "Example Root CA");
    assert_eq!(common_name(server_cert.subject_name()), "server.example.com");

    let mut store = X509StoreBuilder::new().unwrap();
    store.add_cert(ca_cert.clone()).unwrap();
    let store = store.build();
    let chain = Stack::new().unwrap();
    let mut context = X509StoreContext::new().unwrap();
    let verified = context
        .init(&store, &server_cert, &chain, |c| c.verify_cert())
        .unwrap();
    assert!(verified, "chain verification failed");

    // Key identifiers link the two certificates
    let ca_ski = ca_cert.subject_key_id().unwrap().as_slice().to_vec();
    assert_eq!(ca_cert.authority_key_id().unwrap().as_slice(), ca_ski.as_slice());
    assert_eq!(server_cert.authority_key_id().unwrap().as_slice(), ca_ski.as_slice());

    let names = server_cert.subject_alt_names().unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(names.get(0).unwrap().dnsname(), Some("server.example.com"));
    assert_eq!(names.get(1).unwrap().ipaddress(), Some(&[192, 0, 2, 10][..]));
}

#[test]
fn test_openssl_agrees_with_text_dump() {
    let ca = util::generate_ca();
    let result = certify(&util::server_request(&ca, &util::p384_key_pem())).unwrap();
    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    let text = &result.certificate.text;

    assert!(text.contains("Version: 3 (0x2)"));
    assert!(text.contains("Serial Number: 4096 (0x1000)"));
    assert!(text.contains(&format!("Not Before: {}", cert.not_before())));
    assert!(text.contains(&format!("Not After : {}", cert.not_after())));
    assert!(text.contains("Issuer: O=Example, CN=Example Root CA"));
    assert!(text.contains("Subject: CN=server.example.com"));

    let patterns = [
        r"Signature Algorithm: ecdsa-with-SHA256",
        r"Not Before: (Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) [ \d]\d \d{2}:\d{2}:\d{2} \d{4} GMT",
        r"Public Key Algorithm: id-ecPublicKey",
        r"NIST CURVE: P-384",
        r"X509v3 Basic Constraints: critical\n\s+CA:FALSE",
        r"X509v3 Key Usage: critical\n\s+Digital Signature, Key Encipherment",
        r"X509v3 Extended Key Usage:\n\s+TLS Web Server Authentication",
        r"X509v3 Subject Alternative Name:\n\s+DNS:server.example.com, IP Address:192.0.2.10",
        r"X509v3 Subject Key Identifier:\n\s+([0-9A-F]{2}:){19}[0-9A-F]{2}",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(text), "{pattern:?} not found in\n{text}");
    }
}

#[test]
fn test_openssl_legacy_key_encodings() {
    for key_pem in [util::rsa_pkcs1_key_pem(2048), util::sec1_key_pem()] {
        let expected = PKey::private_key_from_pem(key_pem.as_bytes()).unwrap();
        let result = certify(&util::leaf_request(&key_pem)).unwrap();

        let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
        assert!(cert.verify(&expected).unwrap());
        assert_eq!(
            cert.public_key().unwrap().public_key_to_der().unwrap(),
            expected.public_key_to_der().unwrap()
        );
    }
}

#[test]
fn test_openssl_reads_proof_issued_cert() {
    let ca = util::generate_ca();
    let subject_key = util::rsa_key_pem(2048);
    let mut request = util::server_request(&ca, &subject_key);
    request.subject_key_pem = None;
    request.subject_signed_public_key = Some(util::spkac(&subject_key, "challenge"));
    request.extensions.push(ExtensionRequest::new(
        "authorityInfoAccess",
        "OCSP;URI:http://ocsp.example.com/",
        false,
    ));

    let result = certify(&request).unwrap();
    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    let ca_cert = X509::from_pem(ca.cert_pem.as_bytes()).unwrap();
    assert!(cert.verify(&ca_cert.public_key().unwrap()).unwrap());

    let expected = PKey::private_key_from_pem(subject_key.as_bytes()).unwrap();
    assert_eq!(
        cert.public_key().unwrap().public_key_to_der().unwrap(),
        expected.public_key_to_der().unwrap()
    );
    let ocsp = cert.ocsp_responders().unwrap();
    assert_eq!(ocsp.get(0).map(|r| r.to_string()), Some("http://ocsp.example.com/".to_string()));
}

#[test]
fn test_openssl_verifies_p521_signer() {
    let ca_key_pem = util::p521_key_pem();
    let mut ca_request = util::leaf_request(&ca_key_pem);
    ca_request.extensions = vec![ExtensionRequest::new("basicConstraints", "CA:TRUE", true)];
    let ca_result = certify(&ca_request).unwrap();
    let ca_cert = X509::from_pem(ca_result.certificate.pem.as_bytes()).unwrap();
    assert_eq!(ca_cert.signature_algorithm().object().nid(), Nid::ECDSA_WITH_SHA256);
    assert!(ca_cert.verify(&ca_cert.public_key().unwrap()).unwrap());

    let mut request = util::leaf_request(&util::public_key_pem(&util::p256_key_pem()));
    request.signing_certificate_pem = Some(ca_result.certificate.pem.clone());
    request.signing_key_pem = Some(ca_key_pem);
    let result = certify(&request).unwrap();

    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    assert!(cert.verify(&ca_cert.public_key().unwrap()).unwrap());
}

#[test]
fn test_openssl_generated_proof_key_is_certified() {
    let ca = util::generate_ca();
    let mut request = util::server_request(&ca, "");
    request.subject_key_pem = None;
    request.subject_signed_public_key = Some(util::OPENSSL_SPKAC_MD5.to_string());

    let result = certify(&request).unwrap();
    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    let expected = PKey::public_key_from_pem(util::OPENSSL_RSA_PUBLIC_KEY_PEM.as_bytes()).unwrap();
    assert_eq!(
        cert.public_key().unwrap().public_key_to_der().unwrap(),
        expected.public_key_to_der().unwrap()
    );
}

#[test]
fn test_openssl_reads_constraint_extensions() {
    let key_pem = util::p256_key_pem();
    let mut request = util::leaf_request(&key_pem);
    request.extensions = vec![
        ExtensionRequest::new("basicConstraints", "CA:TRUE", true),
        ExtensionRequest::new("subjectKeyIdentifier", "none", false),
        ExtensionRequest::new("nsCertType", "sslCA, emailCA", false),
        ExtensionRequest::new(
            "nameConstraints",
            "permitted;DNS:example.com,excluded;IP:10.0.0.0/255.0.0.0",
            true,
        ),
        ExtensionRequest::new("policyConstraints", "requireExplicitPolicy:1", true),
        ExtensionRequest::new("inhibitAnyPolicy", "0", true),
    ];
    let result = certify(&request).unwrap();

    let cert = X509::from_pem(result.certificate.pem.as_bytes()).unwrap();
    assert!(cert.subject_key_id().is_none());
    let text = String::from_utf8(cert.to_text().unwrap()).unwrap();
    let patterns = [
        r"Netscape Cert Type:\s*\n\s+SSL CA, S/MIME CA",
        r"X509v3 Name Constraints: critical\n\s+Permitted:\n\s+DNS:example.com\n\s+Excluded:\n\s+IP:10.0.0.0/255.0.0.0",
        r"X509v3 Policy Constraints: critical\n\s+Require Explicit Policy:1",
        r"X509v3 Inhibit Any Policy: critical\n\s+0",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(&text), "{pattern:?} not found in\n{text}");
    }
}
