//! The cryptography collaborator.
//!
//! Issuance needs three operations: generate a private key, derive a signing
//! request from it, and have the CA sign that request. [`CryptoBackend`] is
//! the seam; [`NativeBackend`] does the work in-process and
//! [`OpensslBackend`] drives the `openssl` binary.

mod native;
mod openssl;

use std::fs::{File, OpenOptions};
use std::path::Path;

pub use native::NativeBackend;
pub use openssl::OpensslBackend;

use crate::config::{Backend, SanEntry};
use crate::error::Result;
use crate::key::KeyAlgorithm;

/// Inputs to [`CryptoBackend::sign_csr`].
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub csr: &'a Path,
    pub ca_cert: &'a Path,
    pub ca_key: &'a Path,
    pub ca_serial: &'a Path,
    pub days: u32,
    /// Emitted in this order.
    pub sans: &'a [SanEntry],
    pub output: &'a Path,
}

pub trait CryptoBackend {
    fn name(&self) -> &'static str;

    /// Writes a fresh PEM private key to `key_path`, readable by the owner only.
    fn generate_key(&self, algorithm: KeyAlgorithm, key_path: &Path) -> Result<()>;

    /// Writes a PEM request for subject `CN=<common_name>` signed by the key
    /// at `key_path`.
    fn create_csr(&self, key_path: &Path, common_name: &str, csr_path: &Path) -> Result<()>;

    /// Has the CA sign the request and writes the PEM certificate to
    /// `request.output`. Advances the CA serial file.
    fn sign_csr(&self, request: &SigningRequest<'_>) -> Result<()>;
}

/// Instantiates the collaborator selected on the command line.
pub fn create(backend: Backend) -> Result<Box<dyn CryptoBackend>> {
    Ok(match backend {
        Backend::Native => Box::new(NativeBackend),
        Backend::Openssl => Box::new(OpensslBackend::locate()?),
    })
}

/// Text form of the subjectAltName extension, e.g. `DNS:a.example, IP:10.0.0.1`.
pub fn subject_alt_name_value(sans: &[SanEntry]) -> String {
    sans.iter()
        .map(SanEntry::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creates (or truncates) `path` readable and writable by the owner only,
/// before anything secret is written to it.
pub(crate) fn create_private(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        options.mode(0o600);
        let file = options.open(path)?;
        // `mode` only applies when the file is new.
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }
    #[cfg(not(unix))]
    Ok(options.open(path)?)
}
