use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

use super::params::ExtensionParam;
use crate::error::{MintError, Result};

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use certmint::cert::extensions::{SubjectAltName, SubjectAltNameEntry, ToAndFromX509Extension};
/// let san = SubjectAltName {
///     entries: vec![SubjectAltNameEntry::DnsName("example.test".to_string())],
/// };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.entries, decoded.entries);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// One alternate identity of the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectAltNameEntry {
    DnsName(String),
    IpAddress(IpAddr),
    /// An email address.
    Rfc822Name(String),
}

impl SubjectAltNameEntry {
    fn to_general_name(&self) -> Result<GeneralName> {
        let name = match self {
            SubjectAltNameEntry::DnsName(dns) => GeneralName::DnsName(ia5(dns)?),
            SubjectAltNameEntry::Rfc822Name(email) => GeneralName::Rfc822Name(ia5(email)?),
            SubjectAltNameEntry::IpAddress(IpAddr::V4(ip)) => {
                GeneralName::IpAddress(OctetString::new(ip.octets().to_vec())?)
            }
            SubjectAltNameEntry::IpAddress(IpAddr::V6(ip)) => {
                GeneralName::IpAddress(OctetString::new(ip.octets().to_vec())?)
            }
        };
        Ok(name)
    }

    fn from_general_name(name: &GeneralName) -> Result<Self> {
        match name {
            GeneralName::DnsName(dns) => Ok(SubjectAltNameEntry::DnsName(dns.to_string())),
            GeneralName::Rfc822Name(email) => {
                Ok(SubjectAltNameEntry::Rfc822Name(email.to_string()))
            }
            GeneralName::IpAddress(octets) => {
                let bytes = octets.as_bytes();
                if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
                    Ok(SubjectAltNameEntry::IpAddress(Ipv4Addr::from(v4).into()))
                } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
                    Ok(SubjectAltNameEntry::IpAddress(Ipv6Addr::from(v6).into()))
                } else {
                    Err(MintError::InvalidInput(format!(
                        "IP address SAN of {} bytes",
                        bytes.len()
                    )))
                }
            }
            _ => Err(MintError::InvalidInput(
                "Unsupported general name type".to_string(),
            )),
        }
    }
}

impl fmt::Display for SubjectAltNameEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectAltNameEntry::DnsName(dns) => write!(f, "DNS:{dns}"),
            SubjectAltNameEntry::IpAddress(ip) => write!(f, "IP:{ip}"),
            SubjectAltNameEntry::Rfc822Name(email) => write!(f, "email:{email}"),
        }
    }
}

fn ia5(value: &str) -> Result<Ia5String> {
    Ia5String::new(value).map_err(|e| MintError::EncodingFailed(format!("{value:?}: {e}")))
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
#[derive(Debug, Clone, Default)]
pub struct SubjectAltName {
    pub entries: Vec<SubjectAltNameEntry>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.entries
                .iter()
                .map(SubjectAltNameEntry::to_general_name)
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let entries = san
            .0
            .iter()
            .map(SubjectAltNameEntry::from_general_name)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku
            .0
            .iter()
            .map(|v| match *v {
                const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => {
                    Ok(ExtendedKeyUsageOption::OcspSigning)
                }
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
                const_oid::db::rfc5912::ID_KP_CODE_SIGNING => {
                    Ok(ExtendedKeyUsageOption::CodeSigning)
                }
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                    Ok(ExtendedKeyUsageOption::EmailProtection)
                }
                const_oid::db::rfc5912::ID_KP_TIME_STAMPING => {
                    Ok(ExtendedKeyUsageOption::TimeStamping)
                }
                _ => Err(MintError::InvalidInput(
                    "Unsupported extended key usage option".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
        }
    }
}

/// Raw key identifier bytes, as carried by SKI and AKI extensions.
///
/// Renders as `keyid:AB:CD:EF` and parses from that form, from colon-joined
/// hex without the prefix, or from plain hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIdentifier(pub Vec<u8>);

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("keyid")?;
        for byte in &self.0 {
            write!(f, ":{byte:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for KeyIdentifier {
    type Err = MintError;

    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s
            .trim()
            .trim_start_matches("keyid:")
            .chars()
            .filter(|c| *c != ':')
            .collect();
        if digits.is_empty() {
            return Err(MintError::InvalidInput("empty key identifier".to_string()));
        }
        hex::decode(&digits)
            .map(KeyIdentifier)
            .map_err(|e| MintError::InvalidInput(format!("key identifier {s:?}: {e}")))
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: KeyIdentifier,
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski =
            x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.key_identifier.0.clone())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: KeyIdentifier(ski.0.as_bytes().to_vec()),
        })
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` field is written; issuer name and serial are
/// left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: KeyIdentifier,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.0.clone())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;
        let key_identifier = aki
            .key_identifier
            .map(|id| KeyIdentifier(id.as_bytes().to_vec()))
            .ok_or_else(|| {
                MintError::InvalidInput("authority key identifier has no keyid".to_string())
            })?;
        Ok(Self { key_identifier })
    }
}

/// One extension a caller asks to have in the minted certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionRequest {
    BasicConstraints {
        is_ca: bool,
        critical: bool,
    },
    KeyUsage {
        flags: FlagSet<KeyUsages>,
        critical: bool,
    },
    ExtendedKeyUsage {
        usages: Vec<ExtendedKeyUsageOption>,
        critical: bool,
    },
    /// Always written non-critical.
    SubjectAltName {
        entries: Vec<SubjectAltNameEntry>,
    },
    AuthorityKeyIdentifier {
        key_id: KeyIdentifier,
    },
    /// Any other extension, passed through as already-encoded DER.
    Other(ExtensionParam),
}

impl ExtensionRequest {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            ExtensionRequest::BasicConstraints { .. } => BasicConstraints::OID,
            ExtensionRequest::KeyUsage { .. } => KeyUsage::OID,
            ExtensionRequest::ExtendedKeyUsage { .. } => ExtendedKeyUsage::OID,
            ExtensionRequest::SubjectAltName { .. } => SubjectAltName::OID,
            ExtensionRequest::AuthorityKeyIdentifier { .. } => AuthorityKeyIdentifier::OID,
            ExtensionRequest::Other(param) => param.oid,
        }
    }

    /// Encode the request into the DER form that goes into the certificate.
    pub fn to_param(&self) -> Result<ExtensionParam> {
        match self {
            ExtensionRequest::BasicConstraints { is_ca, critical } => {
                let bc = BasicConstraints {
                    is_ca: *is_ca,
                    max_path_length: None,
                };
                ExtensionParam::from_extension(&bc, *critical)
            }
            ExtensionRequest::KeyUsage { flags, critical } => {
                ExtensionParam::from_extension(&KeyUsage(*flags), *critical)
            }
            ExtensionRequest::ExtendedKeyUsage { usages, critical } => {
                let eku = ExtendedKeyUsage {
                    usage: usages.clone(),
                };
                ExtensionParam::from_extension(&eku, *critical)
            }
            ExtensionRequest::SubjectAltName { entries } => {
                let san = SubjectAltName {
                    entries: entries.clone(),
                };
                ExtensionParam::from_extension(&san, false)
            }
            ExtensionRequest::AuthorityKeyIdentifier { key_id } => {
                let aki = AuthorityKeyIdentifier {
                    key_identifier: key_id.clone(),
                };
                ExtensionParam::from_extension(&aki, false)
            }
            ExtensionRequest::Other(param) => Ok(param.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.is_ca, decoded.is_ca);
        assert_eq!(original.max_path_length, decoded.max_path_length);
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_extended_key_usage_encoding_decoding() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.usage, decoded.usage);
    }

    #[test]
    fn test_subject_alt_name_mixed_kinds() {
        let original = SubjectAltName {
            entries: vec![
                SubjectAltNameEntry::DnsName("example.test".to_string()),
                SubjectAltNameEntry::IpAddress("192.168.1.5".parse().unwrap()),
                SubjectAltNameEntry::IpAddress("::1".parse().unwrap()),
                SubjectAltNameEntry::Rfc822Name("user@example.test".to_string()),
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.entries, decoded.entries);
        assert_eq!(decoded.entries[1].to_string(), "IP:192.168.1.5");
    }

    #[test]
    fn test_non_ascii_dns_name_fails_to_encode() {
        let san = SubjectAltName {
            entries: vec![SubjectAltNameEntry::DnsName("bücher.test".to_string())],
        };
        assert!(matches!(
            san.to_x509_extension_value(),
            Err(MintError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_key_identifier_display() {
        let key_id = KeyIdentifier(vec![0xab, 0xcd, 0xef]);
        assert_eq!(key_id.to_string(), "keyid:AB:CD:EF");
    }

    #[test]
    fn test_key_identifier_parse_forms() {
        let expected = KeyIdentifier(vec![0xab, 0xcd, 0xef]);
        assert_eq!("keyid:AB:CD:EF".parse::<KeyIdentifier>().unwrap(), expected);
        assert_eq!("ab:cd:ef".parse::<KeyIdentifier>().unwrap(), expected);
        assert_eq!("abcdef".parse::<KeyIdentifier>().unwrap(), expected);
        assert!("keyid:".parse::<KeyIdentifier>().is_err());
        assert!("keyid:XY".parse::<KeyIdentifier>().is_err());
    }

    #[test]
    fn test_authority_key_identifier_keyid_only() {
        let original = AuthorityKeyIdentifier {
            key_identifier: KeyIdentifier(vec![1, 2, 3, 4, 5]),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let raw = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(&encoded).unwrap();
        assert!(raw.authority_cert_issuer.is_none());
        assert!(raw.authority_cert_serial_number.is_none());
        let decoded = AuthorityKeyIdentifier::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_request_oids_and_criticality() {
        let request = ExtensionRequest::SubjectAltName {
            entries: vec![SubjectAltNameEntry::DnsName("example.test".to_string())],
        };
        let param = request.to_param().unwrap();
        assert_eq!(param.oid, request.oid());
        assert!(!param.critical);

        let request = ExtensionRequest::BasicConstraints {
            is_ca: false,
            critical: true,
        };
        let param = request.to_param().unwrap();
        assert_eq!(param.oid, BasicConstraints::OID);
        assert!(param.critical);
    }
}
