use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;
use crate::error::{CertIssueError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    /// Certificate serial number, big-endian
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: Name,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// Certificate subject distinguished name
    pub subject: Name,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
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

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        };

        let serial_number = SerialNumber::new(&canonical_serial(&self.serial_number)?)?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: algorithm_id,
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

/// RFC 5280 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050 on.
fn to_x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    // DER times carry whole seconds only.
    let at = at.replace_nanosecond(0).map_err(|e| {
        CertIssueError::EncodingError(format!("invalid certificate time: {e}"))
    })?;
    if at.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(UtcTime::from_system_time(
            at.into(),
        )?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_system_time(at.into())?,
        ))
    }
}

/// Strips redundant leading zero bytes and adds one back when the high bit
/// is set, so the INTEGER stays positive.
pub(crate) fn canonical_serial(serial: &[u8]) -> Result<Vec<u8>> {
    let first = serial.iter().position(|b| *b != 0).ok_or_else(|| {
        CertIssueError::CertificateError("serial number must be positive".to_string())
    })?;
    let mut bytes = serial[first..].to_vec();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    if bytes.len() > 20 {
        return Err(CertIssueError::CertificateError(
            "serial number is longer than 20 octets".to_string(),
        ));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_serial() {
        assert_eq!(canonical_serial(&[0, 0, 1]).unwrap(), vec![1]);
        assert_eq!(canonical_serial(&[0x80]).unwrap(), vec![0, 0x80]);
        assert!(canonical_serial(&[0, 0]).is_err());
        assert!(canonical_serial(&[0x7f; 21]).is_err());
    }

    #[test]
    fn test_far_future_dates_use_generalized_time() {
        let near = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let far = near + time::Duration::days(36500);
        assert!(matches!(
            to_x509_time(near).unwrap(),
            x509_cert::time::Time::UtcTime(_)
        ));
        assert!(matches!(
            to_x509_time(far).unwrap(),
            x509_cert::time::Time::GeneralTime(_)
        ));
    }
}
