//! Run configuration.
//!
//! [`PartialConfiguration`] is what the command line produced and may hold
//! missing or invalid values. [`Configuration`] is the checked result the
//! issuer consumes; it has no setters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bon::Builder;

use crate::key::KeyAlgorithm;
use crate::validate::{self, ValidationError};

/// Validity used when the operator does not pick one, roughly a century.
pub const DEFAULT_DURATION_DAYS: u32 = 36500;

/// Accepted subject alternative name kinds.
pub const SAN_TYPES: [SanType; 2] = [SanType::Ip, SanType::Dns];

pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Read-only defaults handed to the interview and the config builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    pub duration_days: u32,
    pub san_types: &'static [SanType],
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            duration_days: DEFAULT_DURATION_DAYS,
            san_types: &SAN_TYPES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SanType {
    Ip,
    Dns,
}

impl SanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanType::Ip => "IP",
            SanType::Dns => "DNS",
        }
    }
}

impl fmt::Display for SanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One subject alternative name, checked against its type.
///
/// The text form is `TYPE:value` with the type in upper case, for example
/// `DNS:test.example.com` or `IP:10.0.0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanEntry {
    san_type: SanType,
    value: String,
}

impl SanEntry {
    pub fn new(san_type: SanType, value: &str) -> Result<Self, ValidationError> {
        let value = validate::san_value(san_type, value)?;
        Ok(Self { san_type, value })
    }

    pub fn san_type(&self) -> SanType {
        self.san_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The address octets of an `IP` entry.
    pub fn ipv4_octets(&self) -> Option<[u8; 4]> {
        match self.san_type {
            SanType::Ip => validate::ipv4_octets(&self.value),
            SanType::Dns => None,
        }
    }
}

impl fmt::Display for SanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.san_type, self.value)
    }
}

impl FromStr for SanEntry {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate::san_entry(s, &SAN_TYPES)
    }
}

/// Which collaborator performs the cryptography.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// In-process RustCrypto implementation.
    #[default]
    Native,
    /// The `openssl` command line tool found on `PATH`.
    Openssl,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Native => "native",
            Backend::Openssl => "openssl",
        })
    }
}

/// Values as they arrived on the command line, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialConfiguration {
    pub common_name: Option<String>,
    pub duration: Option<String>,
    pub sans: Vec<String>,
    pub ca_cert: Option<String>,
    pub ca_key: Option<String>,
    pub ca_serial: Option<String>,
    pub output_dir: PathBuf,
    pub key_algorithm: KeyAlgorithm,
    pub backend: Backend,
}

impl Default for PartialConfiguration {
    fn default() -> Self {
        Self {
            common_name: None,
            duration: None,
            sans: Vec::new(),
            ca_cert: None,
            ca_key: None,
            ca_serial: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            key_algorithm: KeyAlgorithm::default(),
            backend: Backend::default(),
        }
    }
}

/// A fully validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Configuration {
    #[builder(into)]
    common_name: String,
    #[builder(default = DEFAULT_DURATION_DAYS)]
    duration_days: u32,
    #[builder(default)]
    sans: Vec<SanEntry>,
    #[builder(into)]
    ca_cert: PathBuf,
    #[builder(into)]
    ca_key: PathBuf,
    #[builder(into)]
    ca_serial: PathBuf,
    #[builder(into, default = PathBuf::from(DEFAULT_OUTPUT_DIR))]
    output_dir: PathBuf,
    #[builder(default)]
    key_algorithm: KeyAlgorithm,
    #[builder(default)]
    backend: Backend,
}

impl Configuration {
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn sans(&self) -> &[SanEntry] {
        &self.sans
    }

    pub fn ca_cert(&self) -> &Path {
        &self.ca_cert
    }

    pub fn ca_key(&self) -> &Path {
        &self.ca_key
    }

    pub fn ca_serial(&self) -> &Path {
        &self.ca_serial
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// `<output-dir>/<CN>_key.pem`
    pub fn key_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_key.pem", self.common_name))
    }

    /// `<output-dir>/<CN>.csr`
    pub fn csr_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csr", self.common_name))
    }

    /// `<output-dir>/<CN>.crt`
    pub fn cert_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.crt", self.common_name))
    }
}
