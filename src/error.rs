//! Errors raised by the library; the binary wraps them in `anyhow`.

use std::process::ExitStatus;

use thiserror::Error;

/// Represents errors that can occur while issuing a certificate.
///
/// This enum provides detailed error messages for various failure scenarios.
#[derive(Debug, Error)]
pub enum CertIssueError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// A signature could not be produced or did not verify.
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// The CA serial file is missing, unreadable or malformed.
    #[error("Serial file {path}: {reason}")]
    SerialFile { path: String, reason: String },

    /// An external tool could not be found.
    #[error("Could not locate `{tool}`: {reason}")]
    ToolNotFound { tool: &'static str, reason: String },

    /// An external tool exited unsuccessfully.
    #[error("`openssl {step}` failed ({status}): {stderr}")]
    ToolFailed {
        step: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    /// The operator's input stream ended before a field was answered.
    #[error("Input closed while waiting for {0}")]
    InputClosed(&'static str),

    /// Filesystem or terminal I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CertIssueError>;

impl From<der::Error> for CertIssueError {
    /// Converts a `der::Error` into a `CertIssueError`.
    fn from(err: der::Error) -> Self {
        CertIssueError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertIssueError {
    fn from(err: rsa::Error) -> Self {
        CertIssueError::KeyGenerationError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertIssueError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertIssueError::EncodingError(err.to_string())
    }
}

impl From<signature::Error> for CertIssueError {
    fn from(err: signature::Error) -> Self {
        CertIssueError::SignatureError(err.to_string())
    }
}

impl From<pem::PemError> for CertIssueError {
    fn from(err: pem::PemError) -> Self {
        CertIssueError::DecodingError(err.to_string())
    }
}

impl From<crate::validate::ValidationError> for CertIssueError {
    fn from(err: crate::validate::ValidationError) -> Self {
        CertIssueError::InvalidInput(err.to_string())
    }
}
