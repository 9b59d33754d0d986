use std::io::Write;
use std::path::Path;

use log::debug;

use super::{CryptoBackend, SigningRequest, create_private};
use crate::cert::CertificateWithPrivateKey;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use crate::csr::CertificateSigningRequest;
use crate::error::{CertIssueError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyAlgorithm, KeyPair};
use crate::serial::SerialFile;

/// Issues certificates in-process with the RustCrypto stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl CryptoBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn generate_key(&self, algorithm: KeyAlgorithm, key_path: &Path) -> Result<()> {
        let key = KeyPair::generate(algorithm)?;
        let pem = key.to_pkcs8_pem()?;
        create_private(key_path)?.write_all(pem.as_bytes())?;
        debug!("wrote {algorithm} key to {}", key_path.display());
        Ok(())
    }

    fn create_csr(&self, key_path: &Path, common_name: &str, csr_path: &Path) -> Result<()> {
        let key = KeyPair::from_pem(&std::fs::read_to_string(key_path)?)?;
        let subject = DistinguishedName::builder()
            .common_name(common_name.to_string())
            .build()
            .as_x509_name()?;
        let csr = CertificateSigningRequest::create(&key, subject)?;
        std::fs::write(csr_path, csr.to_pem()?)?;
        debug!("wrote request for CN={common_name} to {}", csr_path.display());
        Ok(())
    }

    fn sign_csr(&self, request: &SigningRequest<'_>) -> Result<()> {
        let ca = CertificateWithPrivateKey::load(request.ca_cert, request.ca_key)?;

        let csr_pem = std::fs::read_to_string(request.csr)?;
        let csr = CertificateSigningRequest::from_pem(&csr_pem)?;
        csr.verify().map_err(|e| {
            CertIssueError::CertificateError(format!(
                "request {} failed its signature check: {e}",
                request.csr.display()
            ))
        })?;

        let info = CertificationRequestInfo::builder()
            .subject(csr.subject().clone())
            .subject_public_key(csr.public_key()?)
            .subject_alt_names(request.sans.to_vec())
            .build();

        let validity = Validity::for_days(request.days)?;

        // Only consume a serial once everything else has loaded. Like
        // `openssl x509 -CAserial`, a signing failure past this point still
        // uses it up.
        let serial = SerialFile::new(request.ca_serial).next_serial()?;
        debug!("allocated serial {}", hex::encode_upper(&serial));
        let cert = ca.issue(&info, validity, &serial)?;

        std::fs::write(request.output, cert.to_pem()?)?;
        debug!(
            "signed certificate serial {} written to {}",
            hex::encode_upper(&serial),
            request.output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::Certificate;
    use crate::cert::extensions::SubjectAltName;
    use crate::key::PublicKey;

    fn write_ca(dir: &Path) -> (KeyPair, Certificate) {
        let key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("Native Test CA".to_string())
                    .build()
                    .as_x509_name()
                    .unwrap(),
            )
            .subject_public_key(PublicKey::from_key_pair(&key))
            .is_ca(true)
            .build();
        let validity = Validity::for_days(30).unwrap();
        let cert = Certificate::new_self_signed(&info, &key, validity).unwrap();
        std::fs::write(dir.join("ca.crt"), cert.to_pem().unwrap()).unwrap();
        std::fs::write(dir.join("ca.key"), key.to_pkcs8_pem().unwrap()).unwrap();
        std::fs::write(dir.join("ca.srl"), "0F\n").unwrap();
        (key, cert)
    }

    #[test]
    fn test_three_steps_produce_signed_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let (ca_key, _) = write_ca(dir.path());
        let backend = NativeBackend;

        let key_path = dir.path().join("leaf_key.pem");
        let csr_path = dir.path().join("leaf.csr");
        let cert_path = dir.path().join("leaf.crt");
        backend
            .generate_key(KeyAlgorithm::EcdsaP256, &key_path)
            .unwrap();
        backend.create_csr(&key_path, "leaf", &csr_path).unwrap();

        let sans = vec!["DNS:leaf.example".parse().unwrap()];
        backend
            .sign_csr(&SigningRequest {
                csr: &csr_path,
                ca_cert: &dir.path().join("ca.crt"),
                ca_key: &dir.path().join("ca.key"),
                ca_serial: &dir.path().join("ca.srl"),
                days: 90,
                sans: &sans,
                output: &cert_path,
            })
            .unwrap();

        let cert = Certificate::from_pem(&std::fs::read_to_string(&cert_path).unwrap()).unwrap();
        cert.verify_signed_by(&PublicKey::from_key_pair(&ca_key))
            .unwrap();
        assert_eq!(cert.inner.tbs_certificate.serial_number.as_bytes(), &[0x10]);
        let san: SubjectAltName = cert.extension().unwrap().unwrap();
        assert_eq!(san.entries, sans);

        let leaf_key = KeyPair::from_pem(&std::fs::read_to_string(&key_path).unwrap()).unwrap();
        assert_eq!(cert.public_key().unwrap(), PublicKey::from_key_pair(&leaf_key));
    }

    #[test]
    fn test_failed_ca_load_leaves_serial_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_ca(dir.path());
        let backend = NativeBackend;
        let key_path = dir.path().join("k.pem");
        let csr_path = dir.path().join("k.csr");
        backend
            .generate_key(KeyAlgorithm::Ed25519, &key_path)
            .unwrap();
        backend.create_csr(&key_path, "k", &csr_path).unwrap();

        let result = backend.sign_csr(&SigningRequest {
            csr: &csr_path,
            ca_cert: &dir.path().join("ca.crt"),
            ca_key: &dir.path().join("missing.key"),
            ca_serial: &dir.path().join("ca.srl"),
            days: 1,
            sans: &[],
            output: &dir.path().join("k.crt"),
        });

        assert!(result.is_err());
        assert!(!dir.path().join("k.crt").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ca.srl")).unwrap(),
            "0F\n"
        );
    }

    #[test]
    fn test_validity_past_year_9999_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_ca(dir.path());
        let backend = NativeBackend;
        let key_path = dir.path().join("k.pem");
        let csr_path = dir.path().join("k.csr");
        backend
            .generate_key(KeyAlgorithm::Ed25519, &key_path)
            .unwrap();
        backend.create_csr(&key_path, "k", &csr_path).unwrap();

        let result = backend.sign_csr(&SigningRequest {
            csr: &csr_path,
            ca_cert: &dir.path().join("ca.crt"),
            ca_key: &dir.path().join("ca.key"),
            ca_serial: &dir.path().join("ca.srl"),
            days: 3_000_000,
            sans: &[],
            output: &dir.path().join("k.crt"),
        });

        assert!(matches!(result, Err(CertIssueError::InvalidInput(_))));
        assert!(!dir.path().join("k.crt").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ca.srl")).unwrap(),
            "0F\n"
        );
    }
}
