//! Turns a command-line style identity into subject attributes and extensions.

use std::net::IpAddr;

use crate::cert::extensions::{
    ExtendedKeyUsageOption, ExtensionRequest, KeyUsages, SubjectAltNameEntry,
};
use crate::cert::params::{AttributeKind, DistinguishedName, SubjectAttribute};
use crate::error::{MintError, Result};

/// Marks a common name as a client identity.
pub const CLIENT_PREFIX: &str = "client:";

/// The normalized identity of one certificate to mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// commonName first, then organizationName and organizationalUnitName when given.
    pub subject: DistinguishedName,
    /// `None` only for client identities that are not email addresses.
    pub subject_alt_name: Option<SubjectAltNameEntry>,
    pub purpose: ExtendedKeyUsageOption,
}

impl Identity {
    /// Classify `common_name` and build the subject.
    ///
    /// A `client:` prefix selects a client identity (an RFC 822 SAN when the
    /// rest contains `@`). Anything else is a server identity whose SAN is an
    /// IP address when it parses as one and a DNS name otherwise.
    ///
    /// # Errors
    /// `InvalidInput` when the effective common name is empty or blank.
    pub fn new(
        common_name: &str,
        organization: Option<&str>,
        organizational_unit: Option<&str>,
    ) -> Result<Self> {
        if common_name.trim().is_empty() {
            return Err(MintError::InvalidInput(
                "a common name is required, eg. an IP address, DNS name or email address"
                    .to_string(),
            ));
        }

        let (common_name, subject_alt_name, purpose) =
            match common_name.strip_prefix(CLIENT_PREFIX) {
                Some(client) => {
                    let san = client
                        .contains('@')
                        .then(|| SubjectAltNameEntry::Rfc822Name(client.to_string()));
                    (client, san, ExtendedKeyUsageOption::ClientAuth)
                }
                None => {
                    let san = match common_name.parse::<IpAddr>() {
                        Ok(ip) => SubjectAltNameEntry::IpAddress(ip),
                        Err(_) => SubjectAltNameEntry::DnsName(common_name.to_string()),
                    };
                    (common_name, Some(san), ExtendedKeyUsageOption::ServerAuth)
                }
            };

        if common_name.trim().is_empty() {
            return Err(MintError::InvalidInput(format!(
                "nothing follows the {CLIENT_PREFIX:?} marker"
            )));
        }

        let mut attributes = vec![SubjectAttribute::new(AttributeKind::CommonName, common_name)];
        let optional = [
            (AttributeKind::OrganizationName, organization),
            (AttributeKind::OrganizationalUnitName, organizational_unit),
        ];
        for (kind, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                attributes.push(SubjectAttribute::new(kind, value));
            }
        }

        Ok(Self {
            subject: DistinguishedName::new(attributes),
            subject_alt_name,
            purpose,
        })
    }

    /// The effective common name, without any `client:` marker.
    pub fn common_name(&self) -> &str {
        self.subject.common_name().unwrap_or_default()
    }

    /// The extensions every minted leaf carries.
    ///
    /// Critical `basicConstraints` (not a CA) and `keyUsage`
    /// (digitalSignature, keyEncipherment), then `extKeyUsage` with the
    /// identity's purpose and the SAN when there is one.
    pub fn extensions(&self) -> Vec<ExtensionRequest> {
        let mut extensions = vec![
            ExtensionRequest::BasicConstraints {
                is_ca: false,
                critical: true,
            },
            ExtensionRequest::KeyUsage {
                flags: KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment,
                critical: true,
            },
            ExtensionRequest::ExtendedKeyUsage {
                usages: vec![self.purpose],
                critical: false,
            },
        ];
        if let Some(san) = &self.subject_alt_name {
            extensions.push(ExtensionRequest::SubjectAltName {
                entries: vec![san.clone()],
            });
        }
        extensions
    }
}
