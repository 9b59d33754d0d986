pub mod extensions;
pub mod params;

use std::path::Path;

use der::asn1::{Any, AnyRef};
use der::{Decode, Encode};
use extensions::{AuthorityKeyIdentifier, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{CertificationRequestInfo, Validity};
use x509_cert::name::Name;

use crate::error::{CertIssueError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem, pem_to_der};

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// Pure EdDSA over Ed25519.
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// # Returns
    /// An `AlgorithmIdentifierOwned` object containing the OID and parameters for the algorithm.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            // RFC 4055 requires an explicit NULL here.
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::from(AnyRef::NULL)),
            },
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertIssueError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    /// Decodes a PEM `CERTIFICATE` block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let der = pem_to_der(pem_str, CERTIFICATE_LABEL)?;
        let inner = x509_cert::Certificate::from_der(&der)?;
        Ok(Self { inner })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the extension identified by `E::OID`, if the certificate carries one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        let Some(extensions) = &self.inner.tbs_certificate.extensions else {
            return Ok(None);
        };
        extensions
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    /// The subject key identifier, if the certificate carries a readable one.
    pub fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        self.extension::<SubjectKeyIdentifier>()
            .ok()
            .flatten()
            .map(|ski| ski.0)
    }

    /// Checks that this certificate was signed by `issuer`.
    pub fn verify_signed_by(&self, issuer: &PublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertIssueError::CertificateError("signature has unused bits".to_string())
        })?;
        issuer.verify(&tbs, signature)
    }

    /// Creates a new self-signed certificate.
    ///
    /// Used to stand up throwaway authorities; the serial is always 1.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity window of the certificate.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };
        self_issuer.issue(cert_info, validity, &[1])
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier> {
        AuthorityKeyIdentifier::for_key(self.key)
    }
}

/// A CA certificate together with its private key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Loads CA material from a PEM certificate and a PEM private key.
    ///
    /// Fails when the key does not belong to the certificate.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self> {
        let cert_pem = std::fs::read_to_string(cert_path).map_err(|e| {
            CertIssueError::CertificateError(format!(
                "cannot read CA certificate {}: {e}",
                cert_path.display()
            ))
        })?;
        let key_pem = std::fs::read_to_string(key_path).map_err(|e| {
            CertIssueError::CertificateError(format!(
                "cannot read CA key {}: {e}",
                key_path.display()
            ))
        })?;
        let cert = Certificate::from_pem(&cert_pem)?;
        let key = KeyPair::from_pem(&key_pem)?;

        let cert_key = &cert.inner.tbs_certificate.subject_public_key_info;
        if cert_key.subject_public_key.raw_bytes() != key.as_spki()?.subject_public_key.raw_bytes()
        {
            return Err(CertIssueError::CertificateError(format!(
                "CA key {} does not match CA certificate {}",
                key_path.display(),
                cert_path.display()
            )));
        }
        Ok(Self { cert, key })
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier> {
        match self.cert.subject_key_identifier() {
            Some(key_identifier) => Ok(AuthorityKeyIdentifier { key_identifier }),
            None => AuthorityKeyIdentifier::for_key(&self.key),
        }
    }
}
