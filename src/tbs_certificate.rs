use std::time::SystemTime;

use der::Encode;
use der::DateTime;
use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::error::{MintError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The issuer name, copied verbatim from the CA certificate.
/// * `validity` - The `notBefore`/`notAfter` window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    /// Certificate serial number, big-endian
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer name
    pub issuer: x509_cert::name::Name,
    /// Validity window
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    ///
    /// # Errors
    /// `EncodingFailed` when a field cannot be represented, e.g. an oversize
    /// serial number or a subject value outside its string type.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let algorithm_id: x509_cert::spki::AlgorithmIdentifierOwned =
            self.signature_algorithm.into();

        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // UTCTime before 2050, GeneralizedTime from then on
        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| MintError::EncodingFailed(format!("serial number: {e}")))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: algorithm_id,
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}

fn to_x509_time(instant: time::OffsetDateTime) -> Result<x509_cert::time::Time> {
    let date_time = DateTime::from_system_time(SystemTime::from(instant))
        .map_err(|e| MintError::EncodingFailed(format!("validity time {instant}: {e}")))?;
    if date_time.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(UtcTime::from_date_time(
            date_time,
        )?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_date_time(date_time),
        ))
    }
}

pub(crate) fn from_x509_time(x509_time: &x509_cert::time::Time) -> time::OffsetDateTime {
    match x509_time {
        x509_cert::time::Time::UtcTime(ut) => time::OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => time::OffsetDateTime::from(gt.to_system_time()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::{AttributeKind, SubjectAttribute};
    use crate::key::KeyPair;
    use time::macros::datetime;

    fn tbs(serial_number: Vec<u8>) -> TbsCertificate {
        let subject = DistinguishedName::new(vec![SubjectAttribute::new(
            AttributeKind::CommonName,
            "example.test",
        )]);
        TbsCertificate {
            serial_number,
            signature_algorithm: SignatureAlgorithm::Sha256WithECDSA,
            issuer: subject.as_x509_name().unwrap(),
            validity: Validity::for_years(datetime!(2048-06-01 00:00 UTC), 3).unwrap(),
            subject,
            subject_public_key: KeyPair::generate_ecdsa_p256().public_key(),
            extensions: vec![],
        }
    }

    #[test]
    fn test_times_switch_to_generalized_after_2049() {
        let inner = tbs(vec![0x01]).to_tbs_certificate_inner().unwrap();
        assert!(matches!(
            inner.validity.not_before,
            x509_cert::time::Time::UtcTime(_)
        ));
        assert!(matches!(
            inner.validity.not_after,
            x509_cert::time::Time::GeneralTime(_)
        ));
        assert!(inner.extensions.is_none());
    }

    #[test]
    fn test_oversize_serial_is_rejected() {
        let err = tbs(vec![0x7f; 21]).to_tbs_certificate_inner().unwrap_err();
        assert!(matches!(err, MintError::EncodingFailed(_)));
    }
}
