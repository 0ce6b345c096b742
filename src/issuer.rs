use std::collections::HashSet;

use der::Encode;
use tracing::debug;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, ExtensionRequest, KeyIdentifier, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam};
use crate::error::{MintError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// PEM material of the issuing CA, as handed in by the caller.
///
/// Read-only: nothing in this crate mutates or persists it.
#[derive(Clone)]
pub struct CaCredential {
    pub certificate_pem: String,
    pub private_key_pem: String,
}

impl CaCredential {
    pub fn new(certificate_pem: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            certificate_pem: certificate_pem.into(),
            private_key_pem: private_key_pem.into(),
        }
    }
}

impl std::fmt::Debug for CaCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaCredential")
            .field("certificate_pem", &self.certificate_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// A parsed CA certificate together with its private key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Parses both halves of a [`CaCredential`] and checks that the key
    /// belongs to the certificate.
    ///
    /// # Errors
    /// `InvalidCaCredential` on any parse failure or key mismatch.
    pub fn from_credential(credential: &CaCredential) -> Result<Self> {
        let cert = Certificate::from_pem(&credential.certificate_pem)
            .map_err(|e| MintError::InvalidCaCredential(format!("CA certificate: {e}")))?;
        let key = KeyPair::from_pem(&credential.private_key_pem)
            .map_err(|e| MintError::InvalidCaCredential(format!("CA private key: {e}")))?;

        let key_spki = key
            .as_spki()
            .map_err(|e| MintError::InvalidCaCredential(format!("CA private key: {e}")))?;
        let cert_spki = &cert.inner.tbs_certificate.subject_public_key_info;
        if key_spki.algorithm.oid != cert_spki.algorithm.oid
            || key_spki.subject_public_key.raw_bytes() != cert_spki.subject_public_key.raw_bytes()
        {
            return Err(MintError::InvalidCaCredential(
                "CA private key does not match the CA certificate".to_string(),
            ));
        }

        Ok(Self { cert, key })
    }
}

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the issuer name, exactly as it should appear in issued certificates.
    fn issuer_name(&self) -> x509_cert::name::Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the issuer's own subject key identifier, if it has one.
    fn subject_key_identifier(&self) -> Result<Option<KeyIdentifier>>;

    /// The AKI to add to an issued certificate, if any.
    ///
    /// Nothing is derived when `requested` already carries an AKI, typed or
    /// passed through as raw DER, or the issuer has no SKI.
    fn authority_key_identifier(
        &self,
        requested: &[ExtensionRequest],
    ) -> Result<Option<ExtensionRequest>> {
        let explicit = requested
            .iter()
            .any(|ext| ext.oid() == AuthorityKeyIdentifier::OID);
        if explicit {
            return Ok(None);
        }
        Ok(self.subject_key_identifier()?.map(|key_id| {
            debug!("derived authority key identifier {}", key_id);
            ExtensionRequest::AuthorityKeyIdentifier { key_id }
        }))
    }

    /// Encodes `requested` in order and appends the derived AKI.
    ///
    /// # Errors
    /// `EncodingFailed` if an extension cannot be encoded or the same
    /// extension OID appears twice.
    fn assemble_extensions(&self, requested: &[ExtensionRequest]) -> Result<Vec<ExtensionParam>> {
        let derived = self.authority_key_identifier(requested)?;

        let mut seen = HashSet::new();
        requested
            .iter()
            .chain(derived.as_ref())
            .map(|request| {
                let param = request.to_param()?;
                if !seen.insert(param.oid) {
                    return Err(MintError::EncodingFailed(format!(
                        "duplicate extension {}",
                        param.oid
                    )));
                }
                Ok(param)
            })
            .collect()
    }

    /// Issues a certificate based on the provided certification request information.
    ///
    /// # Arguments
    /// * `cert_request` - Subject, public key, serial, validity and requested extensions.
    ///
    /// # Returns
    /// The signed `Certificate`.
    fn issue(&self, cert_request: &CertificationRequestInfo) -> Result<Certificate> {
        let signature_algo = self.signing_key().signature_algorithm();
        let extensions = self.assemble_extensions(&cert_request.extensions)?;

        let tbs_cert = TbsCertificate {
            serial_number: cert_request.serial_number.clone(),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name(),
            validity: cert_request.validity.clone(),
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> x509_cert::name::Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject_name().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn subject_key_identifier(&self) -> Result<Option<KeyIdentifier>> {
        let ski = self
            .cert
            .extension::<SubjectKeyIdentifier>()
            .map_err(|e| MintError::InvalidCaCredential(format!("CA subject key identifier: {e}")))?;
        Ok(ski.map(|ski| ski.key_identifier))
    }
}
