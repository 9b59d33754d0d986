use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::{Tag, Tagged};
use der::asn1::{Any, SetOfVec};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::config::SanEntry;
use crate::error::CertIssueError;
use crate::key::PublicKey;

/// Parameters for building an X.509 certificate.
///
/// This struct contains the subject, public key, and optional extensions for the certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `subject_alt_names` - SAN entries, emitted in order.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: Name,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub subject_alt_names: Vec<SanEntry>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name.
    ///
    /// Attributes are emitted most-significant first (C, ST, L, O, OU, CN),
    /// skipping the ones that are unset. Values are stored verbatim, so no
    /// RFC 4514 escaping is needed for names containing `,` or `=`.
    pub fn as_x509_name(&self) -> Result<Name, CertIssueError> {
        let attributes = [
            (rfc4519::C, self.country.as_deref(), Tag::PrintableString),
            (rfc4519::ST, self.state.as_deref(), Tag::Utf8String),
            (rfc4519::L, self.locality.as_deref(), Tag::Utf8String),
            (rfc4519::O, self.organization.as_deref(), Tag::Utf8String),
            (rfc4519::OU, self.organization_unit.as_deref(), Tag::Utf8String),
            (rfc4519::CN, Some(self.common_name.as_str()), Tag::Utf8String),
        ];

        let rdns = attributes
            .into_iter()
            .filter_map(|(oid, value, tag)| value.map(|value| (oid, value, tag)))
            .map(|(oid, value, tag)| {
                let value = Any::new(tag, value.as_bytes())?;
                let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])?;
                Ok(RelativeDistinguishedName(set))
            })
            .collect::<Result<Vec<_>, CertIssueError>>()?;

        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Attributes other than the six above are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_text(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    rfc4519::CN => dn.common_name = value,
                    rfc4519::C => dn.country = Some(value),
                    rfc4519::ST => dn.state = Some(value),
                    rfc4519::L => dn.locality = Some(value),
                    rfc4519::O => dn.organization = Some(value),
                    rfc4519::OU => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

fn attribute_text(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            std::str::from_utf8(value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// # Arguments
    /// * `days` - The number of days for the validity period.
    ///
    /// # Returns
    /// A `Validity` object, or `InvalidInput` when the end date would fall
    /// after the year 9999.
    pub fn for_days(days: u32) -> Result<Self, CertIssueError> {
        let now = OffsetDateTime::now_utc();
        let not_after = now
            .checked_add(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                CertIssueError::InvalidInput(format!(
                    "a validity of {days} days ends after the year 9999"
                ))
            })?;
        Ok(Self {
            not_before: now,
            not_after,
        })
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
#[derive(Clone, Debug)]
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
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CertIssueError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    ///
    /// # Returns
    /// A decoded extension object.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CertIssueError> {
        E::from_x509_extension_value(&self.value)
    }
}
