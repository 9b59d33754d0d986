use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{CertIssueError, Result};

/// A CA serial file in the format `openssl x509 -CAserial` maintains: one hex
/// number, the serial of the last certificate issued.
#[derive(Debug, Clone)]
pub struct SerialFile {
    path: PathBuf,
}

impl SerialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Increments the stored serial, writes it back and returns it as
    /// big-endian bytes.
    pub fn next_serial(&self) -> Result<Vec<u8>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| self.error(e.to_string()))?;
        let current = parse_serial(&text).map_err(|reason| self.error(reason))?;
        let next = increment(current);

        std::fs::write(&self.path, format!("{}\n", hex::encode_upper(&next)))
            .map_err(|e| self.error(e.to_string()))?;
        debug!(
            "serial file {} advanced to {}",
            self.path.display(),
            hex::encode_upper(&next)
        );
        Ok(next)
    }

    fn error(&self, reason: String) -> CertIssueError {
        CertIssueError::SerialFile {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

fn parse_serial(text: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = text.trim();
    if digits.is_empty() {
        return Err("serial file is empty".to_string());
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    hex::decode(padded).map_err(|e| format!("not a hex serial: {e}"))
}

fn increment(mut serial: Vec<u8>) -> Vec<u8> {
    for byte in serial.iter_mut().rev() {
        let (value, overflow) = byte.overflowing_add(1);
        *byte = value;
        if !overflow {
            return serial;
        }
    }
    serial.insert(0, 1);
    serial
}
