use std::fmt;

use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::Any;
use der::asn1::{Ia5StringRef, PrintableStringRef, SetOfVec, Utf8StringRef};
use time::{Month, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::{ExtensionRequest, ToAndFromX509Extension};
use crate::error::{MintError, Result};
use crate::key::PublicKey;

/// Everything an issuer needs to produce one certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `serial_number` - Big-endian serial number bytes.
/// * `validity` - The validity window.
/// * `extensions` - Requested X.509 extensions, in encoding order.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    pub serial_number: Vec<u8>,
    pub validity: Validity,
    #[builder(default)]
    pub extensions: Vec<ExtensionRequest>,
}

/// PKCS#9 emailAddress.
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// The naming attributes a subject may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    CommonName,
    OrganizationName,
    OrganizationalUnitName,
    CountryName,
    StateOrProvinceName,
    LocalityName,
    EmailAddress,
}

impl AttributeKind {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            AttributeKind::CommonName => rfc4519::CN,
            AttributeKind::OrganizationName => rfc4519::O,
            AttributeKind::OrganizationalUnitName => rfc4519::OU,
            AttributeKind::CountryName => rfc4519::C,
            AttributeKind::StateOrProvinceName => rfc4519::ST,
            AttributeKind::LocalityName => rfc4519::L,
            AttributeKind::EmailAddress => EMAIL_ADDRESS,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [
            AttributeKind::CommonName,
            AttributeKind::OrganizationName,
            AttributeKind::OrganizationalUnitName,
            AttributeKind::CountryName,
            AttributeKind::StateOrProvinceName,
            AttributeKind::LocalityName,
            AttributeKind::EmailAddress,
        ]
        .into_iter()
        .find(|kind| kind.oid() == *oid)
    }

    /// The long attribute name, e.g. `commonName`.
    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::CommonName => "commonName",
            AttributeKind::OrganizationName => "organizationName",
            AttributeKind::OrganizationalUnitName => "organizationalUnitName",
            AttributeKind::CountryName => "countryName",
            AttributeKind::StateOrProvinceName => "stateOrProvinceName",
            AttributeKind::LocalityName => "localityName",
            AttributeKind::EmailAddress => "emailAddress",
        }
    }

    /// The RFC 4514 short name, e.g. `CN`.
    pub fn short_name(self) -> &'static str {
        match self {
            AttributeKind::CommonName => "CN",
            AttributeKind::OrganizationName => "O",
            AttributeKind::OrganizationalUnitName => "OU",
            AttributeKind::CountryName => "C",
            AttributeKind::StateOrProvinceName => "ST",
            AttributeKind::LocalityName => "L",
            AttributeKind::EmailAddress => "E",
        }
    }
}

/// One `{name, value}` pair of a distinguished name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectAttribute {
    pub kind: AttributeKind,
    pub value: String,
}

impl SubjectAttribute {
    pub fn new(kind: AttributeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    fn to_x509_attribute(&self) -> Result<AttributeTypeAndValue> {
        let value = match self.kind {
            AttributeKind::CountryName => Any::encode_from(&PrintableStringRef::new(&self.value)?),
            AttributeKind::EmailAddress => Any::encode_from(&Ia5StringRef::new(&self.value)?),
            _ => Any::encode_from(&Utf8StringRef::new(&self.value)?),
        }
        .map_err(|e| {
            MintError::EncodingFailed(format!("{} value {:?}: {e}", self.kind.name(), self.value))
        })?;

        Ok(AttributeTypeAndValue {
            oid: self.kind.oid(),
            value,
        })
    }
}

/// An ordered list of subject attributes.
///
/// Each attribute is encoded as its own RDN, in list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName(pub Vec<SubjectAttribute>);

impl DistinguishedName {
    pub fn new(attributes: Vec<SubjectAttribute>) -> Self {
        Self(attributes)
    }

    pub fn attributes(&self) -> &[SubjectAttribute] {
        &self.0
    }

    /// The first commonName value, if any.
    pub fn common_name(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.kind == AttributeKind::CommonName)
            .map(|attr| attr.value.as_str())
    }

    /// Check the list can form a leaf subject.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(MintError::InvalidSubject(
                "subject attribute list is empty".to_string(),
            ));
        }
        if let Some(attr) = self.0.iter().find(|attr| attr.value.trim().is_empty()) {
            return Err(MintError::InvalidSubject(format!(
                "{} has an empty value",
                attr.kind.name()
            )));
        }
        if self.common_name().is_none() {
            return Err(MintError::InvalidSubject(
                "subject has no commonName".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let rdns = self
            .0
            .iter()
            .map(|attr| {
                let set = SetOfVec::try_from(vec![attr.to_x509_attribute()?])?;
                Ok(RelativeDistinguishedName(set))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 name, keeping the
    /// attributes this crate knows about.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let attributes = x509dn
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter_map(|attr| {
                let kind = AttributeKind::from_oid(&attr.oid)?;
                let value = decode_directory_string(&attr.value)?;
                Some(SubjectAttribute { kind, value })
            })
            .collect();
        Self(attributes)
    }
}

fn decode_directory_string(value: &Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<Utf8StringRef<'_>>() {
        return Some(s.as_str().to_string());
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef<'_>>() {
        return Some(s.as_str().to_string());
    }
    value
        .decode_as::<Ia5StringRef<'_>>()
        .ok()
        .map(|s| s.as_str().to_string())
}

impl fmt::Display for DistinguishedName {
    /// RFC 4514-like rendering in encoding order, e.g. `CN=example.test,O=Example`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", attr.kind.short_name(), attr.value)?;
        }
        Ok(())
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A validity period of `years` calendar years starting at `not_before`.
    ///
    /// Sub-second precision is dropped since certificate times carry whole
    /// seconds. A Feb 29 start lands on Feb 28 when the target year is not a
    /// leap year.
    ///
    /// # Errors
    /// `InvalidInput` when `years` is zero or the end date is out of range.
    pub fn for_years(not_before: OffsetDateTime, years: u32) -> Result<Self> {
        if years == 0 {
            return Err(MintError::InvalidInput(
                "validity must be at least one year".to_string(),
            ));
        }
        let not_before = not_before
            .replace_nanosecond(0)
            .map_err(|e| MintError::InvalidInput(e.to_string()))?;
        let target_year = i32::try_from(years)
            .ok()
            .and_then(|years| not_before.year().checked_add(years))
            .ok_or_else(|| MintError::InvalidInput(format!("validity of {years} years")))?;

        let not_after = match not_before.replace_year(target_year) {
            Ok(not_after) => not_after,
            Err(_) if not_before.month() == Month::February && not_before.day() == 29 => {
                not_before
                    .replace_day(28)
                    .and_then(|date| date.replace_year(target_year))
                    .map_err(|e| MintError::InvalidInput(e.to_string()))?
            }
            Err(e) => return Err(MintError::InvalidInput(e.to_string())),
        };

        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Whether `instant` falls inside the period, bounds included.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}
