//! # certissue - Issue leaf certificates from an existing CA
//!
//! certissue takes a subject common name, a validity in days, subject
//! alternative names and the material of a certificate authority (certificate,
//! private key, serial file), then produces a fresh private key and a
//! certificate signed by that CA.
//!
//! The work happens in three stages:
//!
//! 1. [`cli`] turns command line flags into a [`config::PartialConfiguration`].
//! 2. [`prompt`] asks the operator for every required value that is missing or
//!    fails its check in [`validate`], producing an immutable
//!    [`config::Configuration`].
//! 3. [`issue`] runs key generation, request creation and CA signing through a
//!    [`backend::CryptoBackend`] and removes the intermediate request.
//!
//! ## Backends
//!
//! - **native** (default): RustCrypto in-process. Keys may be RSA
//!   (2048/3072/4096), ECDSA P-256 or P-384, or Ed25519. CA keys are read from
//!   PKCS#8, PKCS#1 or SEC1 PEM.
//! - **openssl**: runs `openssl genpkey`, `openssl req` and `openssl x509 -req`
//!   found on `PATH`. The subjectAltName extension is passed in a temporary
//!   file that is removed once signing returns.
//!
//! ## Issuing programmatically
//!
//! ```rust,no_run
//! use certissue::backend::NativeBackend;
//! use certissue::config::Configuration;
//! use certissue::issue::Issuance;
//!
//! # fn main() -> Result<(), certissue::error::CertIssueError> {
//! let config = Configuration::builder()
//!     .common_name("test")
//!     .duration_days(365)
//!     .sans(vec!["DNS:test.example.com".parse().unwrap()])
//!     .ca_cert("ca.crt")
//!     .ca_key("ca.key")
//!     .ca_serial("ca.srl")
//!     .output_dir("/tmp/out")
//!     .build();
//!
//! let issued = Issuance::new(&config, &NativeBackend).run()?;
//! println!("Certificate: {}", issued.cert_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Signing with an in-memory CA
//!
//! ```rust
//! use certissue::{
//!     cert::{Certificate, CertificateWithPrivateKey, params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     issuer::Issuer,
//!     key::{KeyPair, PublicKey},
//! };
//!
//! # fn main() -> Result<(), certissue::error::CertIssueError> {
//! let ca_key = KeyPair::generate_ecdsa_p256();
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("Example CA".to_string()).build().as_x509_name()?)
//!     .subject_public_key(PublicKey::from_key_pair(&ca_key))
//!     .is_ca(true)
//!     .build();
//! let ca = CertificateWithPrivateKey {
//!     cert: Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(30)?)?,
//!     key: ca_key,
//! };
//!
//! let leaf_key = KeyPair::generate_ed25519();
//! let leaf_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("server".to_string()).build().as_x509_name()?)
//!     .subject_public_key(PublicKey::from_key_pair(&leaf_key))
//!     .subject_alt_names(vec!["IP:10.0.0.1".parse().unwrap()])
//!     .build();
//! let leaf = ca.issue(&leaf_info, Validity::for_days(365)?, &[0x02])?;
//! leaf.verify_signed_by(&PublicKey::from_key_pair(&ca.key))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: command line flags
//! - [`config`]: configuration types and defaults
//! - [`validate`]: per-field format checks
//! - [`prompt`]: interactive completion of missing values
//! - [`issue`]: the three-step issuance
//! - [`backend`]: native and OpenSSL collaborators
//! - [`key`], [`csr`], [`cert`], [`issuer`], [`tbs_certificate`]: X.509 building blocks
//! - [`serial`]: CA serial file handling
//! - [`error`]: error types

pub mod backend;
pub mod cert;
pub mod cli;
pub mod config;
pub mod csr;
pub mod error;
pub mod issue;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod prompt;
pub mod serial;
pub mod tbs_certificate;
pub mod validate;
