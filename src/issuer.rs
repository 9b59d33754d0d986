use der::Encode;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, KeyUsages, SubjectAltName,
    SubjectKeyIdentifier, key_identifier,
};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::error::{CertIssueError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the key identifier placed in issued certificates.
    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier>;

    /// Issues a certificate based on the provided certification request information.
    ///
    /// # Arguments
    /// * `cert_request` - The certification request information containing details about the certificate to be issued.
    /// * `validity` - The validity window of the new certificate.
    /// * `serial_number` - Big-endian serial number of the new certificate.
    ///
    /// # Returns
    /// A `Certificate` object representing the issued certificate.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
        serial_number: &[u8],
    ) -> Result<Certificate> {
        let signature_algo = self.signing_key().signature_algorithm();

        let subject_key_id =
            SubjectKeyIdentifier(key_identifier(&cert_request.subject_public_key)?);

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: None,
        };

        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(subject_key_id, false)?,
            ExtensionParam::from_extension(self.authority_key_identifier()?, false)?,
        ];

        if cert_request.is_ca {
            let key_usage = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
            extensions.push(ExtensionParam::from_extension(key_usage, true)?);
        }

        if !cert_request.subject_alt_names.is_empty() {
            let san = SubjectAltName {
                entries: cert_request.subject_alt_names.clone(),
            };
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }

        let combined_extensions = extensions
            .into_iter()
            .chain(cert_request.extensions.iter().cloned())
            .collect();

        let tbs_cert = TbsCertificate {
            serial_number: serial_number.to_vec(),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name(),
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions: combined_extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| CertIssueError::EncodingError(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::CertificateWithPrivateKey;
    use crate::key::PublicKey;
    use crate::cert::params::DistinguishedName;

    fn authority() -> CertificateWithPrivateKey {
        let key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("myca.local".to_string())
                    .build()
                    .as_x509_name()
                    .unwrap(),
            )
            .subject_public_key(PublicKey::from_key_pair(&key))
            .is_ca(true)
            .build();
        CertificateWithPrivateKey {
            cert: Certificate::new_self_signed(&info, &key, Validity::for_days(10).unwrap())
                .unwrap(),
            key,
        }
    }

    #[test]
    fn test_issued_leaf_chains_to_authority() {
        let ca = authority();
        let leaf_key = KeyPair::generate_ed25519();
        let request = CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("server.myca.local".to_string())
                    .build()
                    .as_x509_name()
                    .unwrap(),
            )
            .subject_public_key(PublicKey::from_key_pair(&leaf_key))
            .subject_alt_names(vec!["DNS:server.myca.local".parse().unwrap()])
            .build();

        let leaf = ca
            .issue(&request, Validity::for_days(365).unwrap(), &[0x10, 0x01])
            .unwrap();

        leaf.verify_signed_by(&PublicKey::from_key_pair(&ca.key))
            .unwrap();
        assert_eq!(leaf.inner.tbs_certificate.issuer, *ca.cert.subject());
        assert_eq!(
            leaf.inner.tbs_certificate.serial_number.as_bytes(),
            &[0x10, 0x01]
        );

        let aki: AuthorityKeyIdentifier = leaf.extension().unwrap().unwrap();
        assert_eq!(Some(aki.key_identifier), ca.cert.subject_key_identifier());

        let constraints: BasicConstraints = leaf.extension().unwrap().unwrap();
        assert!(!constraints.is_ca);

        let san: SubjectAltName = leaf.extension().unwrap().unwrap();
        assert_eq!(san.entries, request.subject_alt_names);
    }

    #[test]
    fn test_no_san_extension_without_entries() {
        let ca = authority();
        let leaf_key = KeyPair::generate_ecdsa_p256();
        let request = CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("bare".to_string())
                    .build()
                    .as_x509_name()
                    .unwrap(),
            )
            .subject_public_key(PublicKey::from_key_pair(&leaf_key))
            .build();

        let leaf = ca
            .issue(&request, Validity::for_days(1).unwrap(), &[2])
            .unwrap();
        assert!(leaf.extension::<SubjectAltName>().unwrap().is_none());
        let ski = ExtensionParam::from_extension(
            SubjectKeyIdentifier::for_key(&leaf_key).unwrap(),
            false,
        )
        .unwrap();
        let carried: SubjectKeyIdentifier = ski.to_extension().unwrap();
        assert_eq!(leaf.subject_key_identifier(), Some(carried.0));
    }
}
