use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use tempfile::NamedTempFile;

use super::{CryptoBackend, SigningRequest, create_private, subject_alt_name_value};
use crate::config::SanEntry;
use crate::error::{CertIssueError, Result};
use crate::key::KeyAlgorithm;

/// Drives the `openssl` command line tool.
#[derive(Debug, Clone)]
pub struct OpensslBackend {
    program: PathBuf,
}

impl OpensslBackend {
    /// Finds `openssl` on `PATH`.
    pub fn locate() -> Result<Self> {
        let program = which::which("openssl").map_err(|e| CertIssueError::ToolNotFound {
            tool: "openssl",
            reason: e.to_string(),
        })?;
        debug!("using {}", program.display());
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, step: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(step);
        command
    }

    fn run(step: &'static str, mut command: Command) -> Result<()> {
        debug!("running {command:?}");
        let output = command.output()?;
        if !output.status.success() {
            return Err(CertIssueError::ToolFailed {
                step,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl CryptoBackend for OpensslBackend {
    fn name(&self) -> &'static str {
        "openssl"
    }

    fn generate_key(&self, algorithm: KeyAlgorithm, key_path: &Path) -> Result<()> {
        let options: &[&str] = match algorithm {
            KeyAlgorithm::Rsa2048 => &["-algorithm", "RSA", "-pkeyopt", "rsa_keygen_bits:2048"],
            KeyAlgorithm::Rsa3072 => &["-algorithm", "RSA", "-pkeyopt", "rsa_keygen_bits:3072"],
            KeyAlgorithm::Rsa4096 => &["-algorithm", "RSA", "-pkeyopt", "rsa_keygen_bits:4096"],
            KeyAlgorithm::EcdsaP256 => &["-algorithm", "EC", "-pkeyopt", "ec_paramgen_curve:P-256"],
            KeyAlgorithm::EcdsaP384 => &["-algorithm", "EC", "-pkeyopt", "ec_paramgen_curve:P-384"],
            KeyAlgorithm::Ed25519 => &["-algorithm", "ED25519"],
        };
        // openssl truncates the existing file and keeps its mode.
        drop(create_private(key_path)?);
        let mut command = self.command("genpkey");
        command.args(options);
        command.arg("-out").arg(key_path);
        Self::run("genpkey", command)
    }

    fn create_csr(&self, key_path: &Path, common_name: &str, csr_path: &Path) -> Result<()> {
        let mut command = self.command("req");
        command
            .arg("-new")
            .arg("-key")
            .arg(key_path)
            .arg("-subj")
            .arg(format!("/CN={}", escape_subject_value(common_name)))
            .arg("-out")
            .arg(csr_path);
        Self::run("req", command)
    }

    fn sign_csr(&self, request: &SigningRequest<'_>) -> Result<()> {
        // Must outlive the child process; removed when dropped.
        let extfile = extension_file(request.sans)?;

        let mut command = self.command("x509");
        command
            .arg("-req")
            .arg("-in")
            .arg(request.csr)
            .arg("-CA")
            .arg(request.ca_cert)
            .arg("-CAkey")
            .arg(request.ca_key)
            .arg("-CAserial")
            .arg(request.ca_serial)
            .arg("-out")
            .arg(request.output)
            .arg("-days")
            .arg(request.days.to_string())
            .arg("-sha256");
        if let Some(extfile) = &extfile {
            command.arg("-extfile").arg(extfile.path());
        }
        Self::run("x509", command)
    }
}

/// `-subj` treats `/` as a separator and `\` as an escape.
fn escape_subject_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '/' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn extension_file(sans: &[SanEntry]) -> Result<Option<NamedTempFile>> {
    if sans.is_empty() {
        return Ok(None);
    }
    let mut file = tempfile::Builder::new()
        .prefix("certissue-ext-")
        .suffix(".cnf")
        .tempfile()?;
    writeln!(file, "subjectAltName = {}", subject_alt_name_value(sans))?;
    file.flush()?;
    Ok(Some(file))
}
