//! # certmint - Leaf Certificates From a Local CA
//!
//! certmint mints short-lived leaf X.509 certificates for TLS servers and
//! clients, signed by a Certificate Authority you already have. It is built
//! entirely on rustcrypto libraries; OpenSSL is only used to cross-check
//! output in tests.
//!
//! Each mint generates a fresh RSA key pair, derives a serial number, sets a
//! validity window of whole calendar years, copies the issuer name from the
//! CA certificate, and links the leaf to the CA through an Authority Key
//! Identifier derived from the CA's Subject Key Identifier.
//!
//! ## Supported CA Keys
//!
//! - **RSA** (PKCS#1 or PKCS#8 PEM), signing with sha256WithRSAEncryption
//! - **ECDSA P-256** (SEC1 or PKCS#8 PEM), signing with ecdsa-with-SHA256
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certmint::{identity::Identity, issuer::CaCredential, mint::{MintRequest, mint}};
//!
//! # fn main() -> Result<(), certmint::error::MintError> {
//! let ca = CaCredential::new(
//!     std::fs::read_to_string("rootCA.pem.crt")?,
//!     std::fs::read_to_string("rootCA.pem.key")?,
//! );
//!
//! // "192.168.1.5" gets an IP SAN, "client:user@example.test" a client
//! // certificate with an email SAN.
//! let identity = Identity::new("example.test", Some("Example Org"), None)?;
//!
//! let result = mint(&MintRequest::from_identity(ca, &identity))?;
//! println!("{}", result.certificate_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom Extensions and Options
//!
//! ```rust,no_run
//! use certmint::{
//!     cert::extensions::{ExtendedKeyUsageOption, ExtensionRequest, SubjectAltNameEntry},
//!     cert::params::{AttributeKind, DistinguishedName, SubjectAttribute},
//!     issuer::CaCredential,
//!     mint::{MintRequest, mint},
//! };
//!
//! # fn main() -> Result<(), certmint::error::MintError> {
//! # let ca = CaCredential::new("", "");
//! let request = MintRequest::builder()
//!     .ca_credential(ca)
//!     .subject(DistinguishedName::new(vec![
//!         SubjectAttribute::new(AttributeKind::CommonName, "api.example.test"),
//!     ]))
//!     .extensions(vec![
//!         ExtensionRequest::ExtendedKeyUsage {
//!             usages: vec![ExtendedKeyUsageOption::ServerAuth],
//!             critical: false,
//!         },
//!         ExtensionRequest::SubjectAltName {
//!             entries: vec![
//!                 SubjectAltNameEntry::DnsName("api.example.test".to_string()),
//!                 SubjectAltNameEntry::IpAddress("10.0.0.7".parse().unwrap()),
//!             ],
//!         },
//!     ])
//!     .key_length_bits(3072)
//!     .validity_years(2)
//!     .serial_number("01f4".to_string())
//!     .build();
//!
//! let result = mint(&request)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`error::MintError`] naming what went wrong:
//!
//! ```rust
//! use certmint::{error::MintError, issuer::{CaCredential, CertificateWithPrivateKey}};
//!
//! let credential = CaCredential::new("not a certificate", "not a key");
//! match CertificateWithPrivateKey::from_credential(&credential) {
//!     Ok(_) => println!("CA loaded"),
//!     Err(MintError::InvalidCaCredential(msg)) => println!("Bad CA material: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`identity`]: Common name classification into subject, SAN and key usage
//! - [`mint`]: The minting engine and its request/result types
//! - [`issuer`]: CA credentials, extension assembly and signing
//! - [`key`]: Key generation, import/export, and signatures
//! - [`cert`]: Certificate, name and extension types
//! - [`serial`]: Serial number derivation and parsing
//! - [`persist`]: Reading CA files and writing output files
//! - [`cli`]: The `certmint` command line
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure assembly

pub mod cert;
pub mod cli;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod key;
pub mod mint;
pub mod pem_utils;
pub mod persist;
pub mod serial;
pub mod tbs_certificate;
