#![allow(dead_code)]

use std::sync::OnceLock;

use certmint::cert::Certificate;
use certmint::cert::extensions::{
    BasicConstraints, KeyIdentifier, KeyUsage, KeyUsages, SubjectKeyIdentifier,
};
use certmint::cert::params::{
    AttributeKind, DistinguishedName, ExtensionParam, SubjectAttribute, Validity,
};
use certmint::issuer::CaCredential;
use certmint::key::KeyPair;
use certmint::tbs_certificate::TbsCertificate;
use der::Encode;
use time::{Duration, OffsetDateTime};
use x509_cert::certificate::CertificateInner;

/// The SKI every test CA carries unless asked otherwise.
pub const CA_SKI: [u8; 3] = [0xab, 0xcd, 0xef];

pub struct TestCa {
    pub cert: Certificate,
    pub key: KeyPair,
    pub credential: CaCredential,
}

pub fn ca_subject() -> DistinguishedName {
    DistinguishedName::new(vec![
        SubjectAttribute::new(AttributeKind::CountryName, "NZ"),
        SubjectAttribute::new(AttributeKind::OrganizationName, "Crab widgits SE"),
        SubjectAttribute::new(AttributeKind::CommonName, "myca.local"),
    ])
}

/// Builds a self-signed CA around `key`, with an SKI when `ski` is given.
pub fn generate_ca_cert(key: KeyPair, ski: Option<&[u8]>) -> TestCa {
    let subject = ca_subject();

    let mut extensions = vec![
        ExtensionParam::from_extension(
            &BasicConstraints {
                is_ca: true,
                max_path_length: None,
            },
            true,
        )
        .unwrap(),
        ExtensionParam::from_extension(
            &KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
            true,
        )
        .unwrap(),
    ];
    if let Some(ski) = ski {
        let ski = SubjectKeyIdentifier {
            key_identifier: KeyIdentifier(ski.to_vec()),
        };
        extensions.push(ExtensionParam::from_extension(&ski, false).unwrap());
    }

    let tbs = TbsCertificate {
        serial_number: vec![0x01],
        signature_algorithm: key.signature_algorithm(),
        issuer: subject.as_x509_name().unwrap(),
        validity: Validity::for_years(OffsetDateTime::now_utc() - Duration::days(1), 10).unwrap(),
        subject,
        subject_public_key: key.public_key(),
        extensions,
    };
    let tbs_inner = tbs.to_tbs_certificate_inner().unwrap();
    let signature = key.sign_data(&tbs.to_der().unwrap()).unwrap();
    let cert = Certificate {
        inner: CertificateInner {
            tbs_certificate: tbs_inner,
            signature_algorithm: key.signature_algorithm().into(),
            signature: der::asn1::BitString::from_bytes(&signature).unwrap(),
        },
    };

    let credential = CaCredential::new(cert.to_pem().unwrap(), key.to_pem().unwrap());
    TestCa {
        cert,
        key,
        credential,
    }
}

/// A shared RSA CA with [`CA_SKI`], generated once per test binary.
pub fn rsa_ca() -> &'static TestCa {
    static CA: OnceLock<TestCa> = OnceLock::new();
    CA.get_or_init(|| generate_ca_cert(KeyPair::generate_rsa(2048).unwrap(), Some(&CA_SKI)))
}

/// A P-256 CA without a subject key identifier.
pub fn p256_ca_without_ski() -> TestCa {
    generate_ca_cert(KeyPair::generate_ecdsa_p256(), None)
}

pub fn common_name(cn: &str) -> DistinguishedName {
    DistinguishedName::new(vec![SubjectAttribute::new(AttributeKind::CommonName, cn)])
}

/// The content octets of the certificate's DER serial INTEGER.
pub fn serial_integer_octets(cert: &Certificate) -> Vec<u8> {
    let der = cert.inner.tbs_certificate.serial_number.to_der().unwrap();
    assert_eq!(der[0], 0x02, "serial must be an INTEGER");
    der[2..].to_vec()
}
