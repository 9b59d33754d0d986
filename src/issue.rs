use std::path::PathBuf;

use log::{info, warn};

use crate::backend::{CryptoBackend, SigningRequest, subject_alt_name_value};
use crate::config::Configuration;
use crate::error::Result;

/// Artifacts left behind by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedFiles {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

/// Runs key generation, request creation and CA signing for one
/// configuration.
pub struct Issuance<'a> {
    config: &'a Configuration,
    backend: &'a dyn CryptoBackend,
}

impl<'a> Issuance<'a> {
    pub fn new(config: &'a Configuration, backend: &'a dyn CryptoBackend) -> Self {
        Self { config, backend }
    }

    /// Any failing step stops the run. The intermediate request is removed
    /// once the certificate is written and kept when signing fails.
    pub fn run(&self) -> Result<IssuedFiles> {
        let config = self.config;
        let output_dir = config.output_dir();
        if !output_dir.is_dir() {
            info!("creating output directory {}", output_dir.display());
            std::fs::create_dir_all(output_dir)?;
        }

        let key_path = config.key_path();
        let csr_path = config.csr_path();
        let cert_path = config.cert_path();

        info!(
            "generating {} key with the {} backend",
            config.key_algorithm(),
            self.backend.name()
        );
        self.backend
            .generate_key(config.key_algorithm(), &key_path)?;

        info!("creating signing request for CN={}", config.common_name());
        self.backend
            .create_csr(&key_path, config.common_name(), &csr_path)?;

        if !config.sans().is_empty() {
            info!("subjectAltName: {}", subject_alt_name_value(config.sans()));
        }
        info!(
            "signing with CA {} for {} days",
            config.ca_cert().display(),
            config.duration_days()
        );
        let signed = self.backend.sign_csr(&SigningRequest {
            csr: &csr_path,
            ca_cert: config.ca_cert(),
            ca_key: config.ca_key(),
            ca_serial: config.ca_serial(),
            days: config.duration_days(),
            sans: config.sans(),
            output: &cert_path,
        });
        if let Err(e) = signed {
            warn!(
                "signing failed, keeping {} for inspection",
                csr_path.display()
            );
            return Err(e);
        }

        std::fs::remove_file(&csr_path)?;

        Ok(IssuedFiles {
            key_path,
            cert_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use super::*;
    use crate::error::CertIssueError;
    use crate::key::KeyAlgorithm;

    /// Writes placeholder files and records what it was asked to do.
    #[derive(Default)]
    struct RecordingBackend {
        fail_signing: bool,
        calls: RefCell<Vec<String>>,
    }

    impl CryptoBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn generate_key(&self, algorithm: KeyAlgorithm, key_path: &Path) -> Result<()> {
            self.calls.borrow_mut().push(format!("key {algorithm}"));
            std::fs::write(key_path, "key")?;
            Ok(())
        }

        fn create_csr(&self, key_path: &Path, common_name: &str, csr_path: &Path) -> Result<()> {
            assert!(key_path.exists());
            self.calls.borrow_mut().push(format!("csr {common_name}"));
            std::fs::write(csr_path, "csr")?;
            Ok(())
        }

        fn sign_csr(&self, request: &SigningRequest<'_>) -> Result<()> {
            assert!(request.csr.exists());
            self.calls.borrow_mut().push(format!(
                "sign {} [{}]",
                request.days,
                subject_alt_name_value(request.sans)
            ));
            if self.fail_signing {
                return Err(CertIssueError::CertificateError("CA key unreadable".into()));
            }
            std::fs::write(request.output, "crt")?;
            Ok(())
        }
    }

    fn config(output_dir: &Path) -> Configuration {
        Configuration::builder()
            .common_name("test")
            .duration_days(365)
            .sans(vec!["DNS:test.example.com".parse().unwrap()])
            .ca_cert("ca.crt")
            .ca_key("ca.key")
            .ca_serial("ca.srl")
            .output_dir(output_dir)
            .build()
    }

    #[test]
    fn test_steps_run_in_order_and_request_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let backend = RecordingBackend::default();

        let issued = Issuance::new(&config, &backend).run().unwrap();

        assert_eq!(issued.key_path, dir.path().join("test_key.pem"));
        assert_eq!(issued.cert_path, dir.path().join("test.crt"));
        assert!(issued.key_path.exists());
        assert!(issued.cert_path.exists());
        assert!(!dir.path().join("test.csr").exists());
        assert_eq!(
            *backend.calls.borrow(),
            vec![
                "key rsa2048".to_string(),
                "csr test".to_string(),
                "sign 365 [DNS:test.example.com]".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        let config = config(&nested);

        Issuance::new(&config, &RecordingBackend::default())
            .run()
            .unwrap();

        assert!(nested.join("test.crt").exists());
    }

    #[test]
    fn test_signing_failure_keeps_request() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let backend = RecordingBackend {
            fail_signing: true,
            ..Default::default()
        };

        let err = Issuance::new(&config, &backend).run().unwrap_err();

        assert!(matches!(err, CertIssueError::CertificateError(_)));
        assert!(dir.path().join("test.csr").exists());
        assert!(!dir.path().join("test.crt").exists());
    }
}
