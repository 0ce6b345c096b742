//! The minting engine: one request in, one key pair and signed certificate out.

use bon::Builder;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::cert::extensions::ExtensionRequest;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use crate::error::Result;
use crate::identity::Identity;
use crate::issuer::{CaCredential, CertificateWithPrivateKey, Issuer};
use crate::key::KeyPair;
use crate::serial::{derive_serial_number, parse_serial_number};

pub const DEFAULT_KEY_LENGTH: usize = 2048;
pub const DEFAULT_EXPIRY_YEARS: u32 = 1;

/// Fully determines one minting operation.
///
/// Defaults are resolved when the request is built: a 2048-bit key, one
/// year of validity, a derived serial and the current time as `notBefore`.
#[derive(Clone, Debug, Builder)]
pub struct MintRequest {
    pub ca_credential: CaCredential,
    pub subject: DistinguishedName,
    #[builder(default)]
    pub extensions: Vec<ExtensionRequest>,
    #[builder(default = DEFAULT_KEY_LENGTH)]
    pub key_length_bits: usize,
    #[builder(default = DEFAULT_EXPIRY_YEARS)]
    pub validity_years: u32,
    /// Hex serial number; derived from the subject when absent.
    pub serial_number: Option<String>,
    /// Pins `notBefore`; the current UTC time when absent.
    pub issued_at: Option<OffsetDateTime>,
}

impl MintRequest {
    /// A request carrying the subject and extensions of `identity`.
    pub fn from_identity(ca_credential: CaCredential, identity: &Identity) -> Self {
        MintRequest::builder()
            .ca_credential(ca_credential)
            .subject(identity.subject.clone())
            .extensions(identity.extensions())
            .build()
    }
}

/// A freshly generated private key and the certificate issued for it, both PEM.
#[derive(Clone, PartialEq, Eq)]
pub struct MintResult {
    pub private_key_pem: String,
    pub certificate_pem: String,
}

impl std::fmt::Debug for MintResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintResult")
            .field("private_key_pem", &"<redacted>")
            .field("certificate_pem", &self.certificate_pem)
            .finish()
    }
}

/// Mint a leaf certificate signed by the request's CA.
///
/// Everything that can be checked cheaply (subject, CA credential, serial,
/// validity) is checked before the key pair is generated. On failure no PEM
/// is returned and the generated key is dropped.
///
/// # Errors
/// `InvalidSubject`, `InvalidCaCredential`, `InvalidInput`,
/// `KeyGenerationFailed`, `EncodingFailed` or `SigningFailed`, each carrying
/// the underlying cause.
pub fn mint(request: &MintRequest) -> Result<MintResult> {
    request.subject.validate()?;
    info!("Minting certificate for {}", request.subject);

    let ca = CertificateWithPrivateKey::from_credential(&request.ca_credential)?;

    let serial_number = match &request.serial_number {
        Some(serial) => parse_serial_number(serial)?,
        None => derive_serial_number(&request.subject.to_string()),
    };
    debug!("serial number {}", hex::encode_upper(&serial_number));

    let issued_at = request.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
    let validity = Validity::for_years(issued_at, request.validity_years)?;

    let key_pair = KeyPair::generate_rsa(request.key_length_bits)?;

    let cert_info = CertificationRequestInfo::builder()
        .subject(request.subject.clone())
        .subject_public_key(key_pair.public_key())
        .serial_number(serial_number)
        .validity(validity)
        .extensions(request.extensions.clone())
        .build();
    let certificate = ca.issue(&cert_info)?;

    let result = MintResult {
        private_key_pem: key_pair.to_pem()?,
        certificate_pem: certificate.to_pem()?,
    };
    debug!("Certificate minted for {}", request.subject);
    Ok(result)
}
