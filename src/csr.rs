use der::asn1::BitString;
use der::{Decode, Encode};
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CertIssueError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{CSR_LABEL, der_to_pem, pem_to_der};

/// A PKCS#10 certification request, signed by the key it carries.
#[derive(Debug, Clone)]
pub struct CertificateSigningRequest {
    pub inner: CertReq,
}

impl CertificateSigningRequest {
    /// Builds a request for `subject` with no attributes and signs it with `key`.
    pub fn create(key: &KeyPair, subject: Name) -> Result<Self> {
        let info = CertReqInfo {
            version: Version::V1,
            subject,
            public_key: key.as_spki()?,
            attributes: Default::default(),
        };
        let signature = key.sign_data(&info.to_der()?)?;

        Ok(Self {
            inner: CertReq {
                info,
                algorithm: key.signature_algorithm().into(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertIssueError::EncodingError(e.to_string()))
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CSR_LABEL))
    }

    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let der = pem_to_der(pem_str, CSR_LABEL)?;
        Ok(Self {
            inner: CertReq::from_der(&der)?,
        })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    /// Proof of possession: the request must be signed by its own key with
    /// the algorithm that key implies.
    pub fn verify(&self) -> Result<()> {
        let public_key = self.public_key()?;
        let expected: AlgorithmIdentifierOwned = public_key.signature_algorithm().into();
        if self.inner.algorithm.oid != expected.oid {
            return Err(CertIssueError::SignatureError(format!(
                "request signed with {} but its key expects {}",
                self.inner.algorithm.oid, expected.oid
            )));
        }
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertIssueError::SignatureError("request signature has unused bits".to_string())
        })?;
        public_key.verify(&self.inner.info.to_der()?, signature)
    }
}
