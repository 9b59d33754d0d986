use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use sha1::{Digest, Sha1};
use x509_cert::ext::pkix::name::GeneralName;

use crate::config::{SanEntry, SanType};
use crate::error::CertIssueError;
use crate::key::{KeyPair, PublicKey};

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use certissue::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
/// use certissue::config::SanEntry;
/// let san = SubjectAltName { entries: vec!["DNS:example.com".parse::<SanEntry>().unwrap()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.entries, decoded.entries);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertIssueError>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Each entry becomes one `GeneralName`, in order: DNS entries as `dNSName`,
/// IP entries as a four-octet `iPAddress`.
#[derive(Debug, Clone, Default)]
pub struct SubjectAltName {
    pub entries: Vec<SanEntry>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError> {
        let names = self
            .entries
            .iter()
            .map(|entry| match entry.san_type() {
                SanType::Dns => Ia5String::try_from(entry.value().to_string())
                    .map(GeneralName::DnsName)
                    .map_err(|e| CertIssueError::InvalidInput(e.to_string())),
                SanType::Ip => {
                    let octets = entry.ipv4_octets().ok_or_else(|| {
                        CertIssueError::InvalidInput(format!("{entry} is not an IPv4 address"))
                    })?;
                    Ok(GeneralName::IpAddress(OctetString::new(octets.to_vec())?))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(x509_cert::ext::pkix::SubjectAltName(names).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertIssueError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let entries = san
            .0
            .iter()
            .map(|name| {
                let (san_type, value) = match name {
                    GeneralName::DnsName(dns) => (SanType::Dns, dns.to_string()),
                    GeneralName::IpAddress(ip) => match ip.as_bytes() {
                        [a, b, c, d] => (SanType::Ip, format!("{a}.{b}.{c}.{d}")),
                        _ => {
                            return Err(CertIssueError::DecodingError(
                                "only IPv4 addresses are supported".to_string(),
                            ));
                        }
                    },
                    _ => {
                        return Err(CertIssueError::InvalidInput(
                            "Unsupported general name type".to_string(),
                        ));
                    }
                };
                SanEntry::new(san_type, &value)
                    .map_err(|e| CertIssueError::DecodingError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
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
#[derive(Debug, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CertIssueError> {
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

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertIssueError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// SHA-1 over the `subjectPublicKey` bits, the method 1 key identifier of RFC 5280.
pub fn key_identifier(key: &PublicKey) -> Result<Vec<u8>, CertIssueError> {
    let spki = key.to_spki()?;
    Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl SubjectKeyIdentifier {
    pub fn for_key(key: &KeyPair) -> Result<Self, CertIssueError> {
        key_identifier(&PublicKey::from_key_pair(key)).map(Self)
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.clone())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertIssueError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` field is emitted, which is what `openssl x509 -req`
/// produces by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl AuthorityKeyIdentifier {
    /// Derives the identifier from the issuer's key.
    pub fn for_key(key: &KeyPair) -> Result<Self, CertIssueError> {
        Ok(Self {
            key_identifier: key_identifier(&PublicKey::from_key_pair(key))?,
        })
    }
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertIssueError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertIssueError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}
