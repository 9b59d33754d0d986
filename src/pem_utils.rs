use crate::error::{CertIssueError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const CSR_LABEL: &str = "CERTIFICATE REQUEST";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, insisting on `label`.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != label {
        return Err(CertIssueError::DecodingError(format!(
            "expected a PEM block labelled {label:?}, found {:?}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mismatch_is_rejected() {
        let encoded = der_to_pem(&[0x30, 0x00], CSR_LABEL);
        assert!(encoded.starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
        assert!(pem_to_der(&encoded, CERTIFICATE_LABEL).is_err());
        assert_eq!(pem_to_der(&encoded, CSR_LABEL).unwrap(), vec![0x30, 0x00]);
    }
}
