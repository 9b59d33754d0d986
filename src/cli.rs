use std::path::PathBuf;

use clap::Parser;

use crate::config::{Backend, DEFAULT_DURATION_DAYS, DEFAULT_OUTPUT_DIR, PartialConfiguration};
use crate::key::KeyAlgorithm;

/// Issue a leaf certificate signed by an existing CA.
///
/// Anything required that is missing or invalid on the command line is
/// asked for interactively.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Subject common name; also names the output files
    #[arg(long = "cn", value_name = "NAME")]
    pub common_name: Option<String>,

    /// Validity in days
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_DURATION_DAYS.to_string())]
    pub duration: String,

    /// Subject alternative name as TYPE:value, e.g. DNS:example.com or IP:10.0.0.1 (repeatable)
    #[arg(long = "san", value_name = "TYPE:VALUE")]
    pub sans: Vec<String>,

    /// CA certificate (PEM)
    #[arg(long, value_name = "PATH")]
    pub ca_cert: Option<String>,

    /// CA private key (PEM)
    #[arg(long, value_name = "PATH")]
    pub ca_key: Option<String>,

    /// CA serial file, advanced on every issuance
    #[arg(long, value_name = "PATH")]
    pub ca_serial: Option<String>,

    /// Directory for the key and certificate; created if missing
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Algorithm of the generated key
    #[arg(long, value_enum, default_value_t = KeyAlgorithm::Rsa2048)]
    pub key_type: KeyAlgorithm,

    /// Cryptography implementation
    #[arg(long, value_enum, default_value_t = Backend::Native)]
    pub backend: Backend,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn into_partial(self) -> PartialConfiguration {
        PartialConfiguration {
            common_name: self.common_name,
            duration: Some(self.duration),
            sans: self.sans,
            ca_cert: self.ca_cert,
            ca_key: self.ca_key,
            ca_serial: self.ca_serial,
            output_dir: self.output_dir,
            key_algorithm: self.key_type,
            backend: self.backend,
        }
    }

    /// Log filter implied by `--verbose`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
