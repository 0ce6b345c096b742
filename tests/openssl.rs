mod util;

use std::fs;
use std::process::Command;

use certmint::identity::Identity;
use certmint::mint::{MintRequest, mint};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509, X509VerifyResult};
use regex::Regex;

fn openssl_available() -> bool {
    Command::new("openssl").arg("version").output().is_ok()
}

#[test]
fn test_openssl_parses_and_verifies_leaf() {
    let ca = util::rsa_ca();
    let identity = Identity::new("server.myca.local", Some("Crab widgits SE"), None).unwrap();
    let result = mint(&MintRequest::from_identity(ca.credential.clone(), &identity)).unwrap();

    let leaf = X509::from_pem(result.certificate_pem.as_bytes()).unwrap();
    let ca_cert = X509::from_pem(ca.credential.certificate_pem.as_bytes()).unwrap();

    let cn = leaf
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(cn.to_string(), "server.myca.local");

    assert_eq!(ca_cert.issued(&leaf), X509VerifyResult::OK);
    assert!(leaf.verify(&ca_cert.public_key().unwrap()).unwrap());

    let san = leaf.subject_alt_names().unwrap();
    assert_eq!(san.len(), 1);
    assert_eq!(san.get(0).unwrap().dnsname(), Some("server.myca.local"));

    assert_eq!(
        leaf.authority_key_id().unwrap().as_slice(),
        util::CA_SKI.as_slice()
    );

    let serial = leaf.serial_number().to_bn().unwrap();
    assert!(!serial.is_negative());

    // The minted private key belongs to the certificate.
    let key = PKey::private_key_from_pem(result.private_key_pem.as_bytes()).unwrap();
    assert!(leaf.public_key().unwrap().public_eq(&key));
    assert_eq!(key.bits(), 2048);
}

#[test]
fn test_openssl_reads_client_email_san() {
    let ca = util::rsa_ca();
    let identity = Identity::new("client:user@example.test", None, None).unwrap();
    let result = mint(&MintRequest::from_identity(ca.credential.clone(), &identity)).unwrap();

    let leaf = X509::from_pem(result.certificate_pem.as_bytes()).unwrap();
    let san = leaf.subject_alt_names().unwrap();
    assert_eq!(san.get(0).unwrap().email(), Some("user@example.test"));
}

#[test]
fn test_openssl_cli_text_output() {
    if !openssl_available() {
        eprintln!("openssl binary not found, skipping");
        return;
    }

    let ca = util::rsa_ca();
    let identity = Identity::new("192.168.1.5", Some("Crab widgits SE"), Some("Edge")).unwrap();
    let request = MintRequest::builder()
        .ca_credential(ca.credential.clone())
        .subject(identity.subject.clone())
        .extensions(identity.extensions())
        .serial_number("01".to_string())
        .build();
    let result = mint(&request).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("192.168.1.5.crt");
    let ca_path = dir.path().join("rootCA.pem.crt");
    fs::write(&cert_path, &result.certificate_pem).unwrap();
    fs::write(&ca_path, &ca.credential.certificate_pem).unwrap();

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_text = String::from_utf8_lossy(&output.stdout);

    assert!(output_text.contains("Version: 3 (0x2)"));
    assert!(output_text.contains("Serial Number: 1 (0x1)"));
    assert!(output_text.contains("sha256WithRSAEncryption"));
    assert!(output_text.contains("Public-Key: (2048 bit)"));
    assert!(output_text.contains("IP Address:192.168.1.5"));
    assert!(output_text.contains("TLS Web Server Authentication"));
    assert!(output_text.contains("CA:FALSE"));

    let issuer_regex = Regex::new(r"Issuer: C\s?=\s?NZ, O\s?=\s?Crab widgits SE, CN\s?=\s?myca.local").unwrap();
    assert!(issuer_regex.is_match(&output_text), "Issuer field is incorrect");
    let subject_regex =
        Regex::new(r"Subject: CN\s?=\s?192.168.1.5, O\s?=\s?Crab widgits SE, OU\s?=\s?Edge").unwrap();
    assert!(subject_regex.is_match(&output_text), "Subject field is incorrect");
    let not_after_regex = Regex::new(r"Not After : .+ GMT").unwrap();
    assert!(not_after_regex.is_match(&output_text), "Not After field is missing");
    let aki_regex = Regex::new(r"X509v3 Authority Key Identifier:\s*\n\s*(keyid:)?AB:CD:EF").unwrap();
    assert!(aki_regex.is_match(&output_text), "Authority Key Identifier is incorrect");

    let verify = Command::new("openssl")
        .arg("verify")
        .arg("-CAfile")
        .arg(&ca_path)
        .arg(&cert_path)
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        verify.status.success(),
        "OpenSSL verify failed: {}{}",
        String::from_utf8_lossy(&verify.stdout),
        String::from_utf8_lossy(&verify.stderr)
    );
}
