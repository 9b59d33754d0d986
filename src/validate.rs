//! Format checks for every value the tool accepts.
//!
//! Each validator takes the raw text and returns the typed value or a
//! [`ValidationError`] that is shown to the operator before asking again.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::config::{SanEntry, SanType};

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digit pattern compiles"));

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)\.([0-9]+)$").expect("IPv4 pattern compiles")
});

static DNS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").expect("DNS pattern compiles"));

/// Rejection of a single input value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("common name must not be empty")]
    EmptyCommonName,

    #[error("common name {0:?} cannot name a file in the output directory")]
    CommonNameNotFileName(String),

    #[error("duration must be a positive number of days, got {0:?}")]
    InvalidDuration(String),

    #[error("path must not be empty")]
    EmptyPath,

    #[error("answer y or n, got {0:?}")]
    InvalidYesNo(String),

    #[error("SAN type must be one of {allowed}, got {input:?}")]
    InvalidSanType { input: String, allowed: String },

    #[error("{0:?} is not a dotted-decimal IPv4 address")]
    InvalidIp(String),

    #[error("{0:?} is not a valid DNS name")]
    InvalidDns(String),

    #[error("SAN entry must look like TYPE:value, got {0:?}")]
    MalformedSanEntry(String),
}

/// Non-empty, and usable as the stem of the output file names.
pub fn common_name(input: &str) -> Result<String, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::EmptyCommonName);
    }
    if input.contains(['/', '\\', '\0']) || input == "." || input == ".." {
        return Err(ValidationError::CommonNameNotFileName(input.to_string()));
    }
    Ok(input.to_string())
}

/// Digits only, strictly positive.
pub fn duration(input: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidDuration(input.to_string());
    if !DIGITS.is_match(input) {
        return Err(invalid());
    }
    match input.parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(invalid()),
    }
}

/// CA file locations are only checked for being non-empty; opening them is
/// left to issuance.
pub fn path(input: &str) -> Result<PathBuf, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    Ok(PathBuf::from(input))
}

pub fn yes_no(input: &str) -> Result<bool, ValidationError> {
    match input {
        "y" | "Y" => Ok(true),
        "n" | "N" => Ok(false),
        _ => Err(ValidationError::InvalidYesNo(input.to_string())),
    }
}

/// Case-insensitive match against `allowed`.
pub fn san_type(input: &str, allowed: &[SanType]) -> Result<SanType, ValidationError> {
    allowed
        .iter()
        .copied()
        .find(|candidate| candidate.as_str().eq_ignore_ascii_case(input))
        .ok_or_else(|| ValidationError::InvalidSanType {
            input: input.to_string(),
            allowed: allowed
                .iter()
                .map(SanType::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

pub fn san_value(san_type: SanType, input: &str) -> Result<String, ValidationError> {
    match san_type {
        SanType::Ip => {
            ipv4_octets(input).ok_or_else(|| ValidationError::InvalidIp(input.to_string()))?;
        }
        SanType::Dns => {
            if !DNS_NAME.is_match(input) {
                return Err(ValidationError::InvalidDns(input.to_string()));
            }
        }
    }
    Ok(input.to_string())
}

/// Parses `TYPE:value`.
pub fn san_entry(input: &str, allowed: &[SanType]) -> Result<SanEntry, ValidationError> {
    let (kind, value) = input
        .split_once(':')
        .ok_or_else(|| ValidationError::MalformedSanEntry(input.to_string()))?;
    let kind = san_type(kind, allowed)?;
    SanEntry::new(kind, value)
}

/// Four dot-separated digit groups, each no larger than 255.
pub(crate) fn ipv4_octets(input: &str) -> Option<[u8; 4]> {
    let groups = IPV4.captures(input)?;
    let mut octets = [0u8; 4];
    for (octet, group) in octets.iter_mut().zip(groups.iter().skip(1)) {
        *octet = group?.as_str().parse().ok()?;
    }
    Some(octets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SAN_TYPES;

    #[test]
    fn test_duration() {
        assert_eq!(duration("365"), Ok(365));
        assert_eq!(duration("36500"), Ok(36500));
        for rejected in ["0", "-5", "abc", "", "12a", " 5", "99999999999"] {
            assert!(duration(rejected).is_err(), "{rejected:?} accepted");
        }
    }

    #[test]
    fn test_common_name_and_paths() {
        assert_eq!(common_name("test").unwrap(), "test");
        assert_eq!(common_name(""), Err(ValidationError::EmptyCommonName));
        assert_eq!(common_name("web server").unwrap(), "web server");
        assert_eq!(common_name("..x").unwrap(), "..x");
        for rejected in ["../x", "a/b", "/abs", "a\\b", ".", ".."] {
            assert!(
                matches!(
                    common_name(rejected),
                    Err(ValidationError::CommonNameNotFileName(_))
                ),
                "{rejected:?} accepted"
            );
        }
        assert_eq!(path("/etc/ca.crt").unwrap(), PathBuf::from("/etc/ca.crt"));
        assert_eq!(path("does/not/exist").unwrap(), PathBuf::from("does/not/exist"));
        assert_eq!(path(""), Err(ValidationError::EmptyPath));
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no("y"), Ok(true));
        assert_eq!(yes_no("Y"), Ok(true));
        assert_eq!(yes_no("n"), Ok(false));
        assert_eq!(yes_no("N"), Ok(false));
        for rejected in ["yes", "no", "", " y", "x"] {
            assert!(yes_no(rejected).is_err(), "{rejected:?} accepted");
        }
    }

    #[test]
    fn test_san_type_is_case_insensitive() {
        assert_eq!(san_type("ip", &SAN_TYPES), Ok(SanType::Ip));
        assert_eq!(san_type("Dns", &SAN_TYPES), Ok(SanType::Dns));
        assert_eq!(san_type("DNS", &SAN_TYPES).unwrap().to_string(), "DNS");
        assert!(san_type("email", &SAN_TYPES).is_err());
        assert!(san_type("dns", &[SanType::Ip]).is_err());
    }

    #[test]
    fn test_ip_values() {
        assert!(san_value(SanType::Ip, "10.0.0.1").is_ok());
        assert!(san_value(SanType::Ip, "255.255.255.255").is_ok());
        for rejected in ["10.0.0", "10.0.0.1.2", "a.b.c.d", "999.999.999.999", "1..2.3", ""] {
            assert!(
                san_value(SanType::Ip, rejected).is_err(),
                "{rejected:?} accepted"
            );
        }
    }

    #[test]
    fn test_dns_values() {
        assert!(san_value(SanType::Dns, "example.com").is_ok());
        assert!(san_value(SanType::Dns, "my-host.internal").is_ok());
        assert!(san_value(SanType::Dns, "exa mple.com").is_err());
        assert!(san_value(SanType::Dns, "*.example.com").is_err());
        assert!(san_value(SanType::Dns, "").is_err());
    }

    #[test]
    fn test_san_entry() {
        let entry = san_entry("dns:test.example.com", &SAN_TYPES).unwrap();
        assert_eq!(entry.to_string(), "DNS:test.example.com");
        assert_eq!(
            san_entry("IP:10.0.0.1", &SAN_TYPES).unwrap().ipv4_octets(),
            Some([10, 0, 0, 1])
        );
        assert!(matches!(
            san_entry("example.com", &SAN_TYPES),
            Err(ValidationError::MalformedSanEntry(_))
        ));
        assert!(san_entry("IP:example.com", &SAN_TYPES).is_err());
    }
}
