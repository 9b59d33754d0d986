mod util;

use std::path::Path;
use std::process::{Command, Output, Stdio};

use certissue::cert::extensions::SubjectAltName;

fn certissue(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_certissue"))
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::null())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run certissue")
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn help_prints_usage_and_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = certissue(dir.path(), &["--help"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--ca-serial"));
    assert!(!stdout.contains("Common name"));
    assert_eq!(entries(dir.path()), 0);
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = certissue(dir.path(), &["--bogus"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bogus"));
    assert!(stderr.contains("Usage:"));
    assert_eq!(entries(dir.path()), 0);
}

#[test]
fn malformed_san_flag_is_dropped_with_a_warning() {
    let ca_dir = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ca = util::write_ca_files(ca_dir.path());
    let out = work.path().join("out");

    let output = certissue(
        work.path(),
        &[
            "--cn",
            "test",
            "--san",
            "IP:example.com",
            "--san",
            "DNS:test.example.com",
            "--ca-cert",
            ca.cert.to_str().unwrap(),
            "--ca-key",
            ca.key.to_str().unwrap(),
            "--ca-serial",
            ca.serial.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--key-type",
            "p256",
        ],
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.contains("ignoring --san"), "stderr: {stderr}");
    let cert = util::read_certificate(&out.join("test.crt"));
    let san: SubjectAltName = cert.extension().unwrap().unwrap();
    let sans: Vec<String> = san.entries.iter().map(ToString::to_string).collect();
    assert_eq!(sans, vec!["DNS:test.example.com"]);
}

#[test]
fn only_malformed_san_flags_ask_for_names() {
    let dir = tempfile::tempdir().unwrap();
    let output = certissue(dir.path(), &["--cn", "test", "--san", "EMAIL:a@b"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Add a subject alternative name?"), "stdout: {stdout}");
    assert_eq!(entries(dir.path()), 0);
}

#[test]
fn flags_alone_issue_a_certificate() {
    let ca_dir = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ca = util::write_ca_files(ca_dir.path());
    let out = work.path().join("out");

    let output = certissue(
        work.path(),
        &[
            "--cn",
            "test",
            "--duration",
            "365",
            "--san",
            "DNS:test.example.com",
            "--ca-cert",
            ca.cert.to_str().unwrap(),
            "--ca-key",
            ca.key.to_str().unwrap(),
            "--ca-serial",
            ca.serial.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--key-type",
            "p256",
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Private key: {}", out.join("test_key.pem").display())));
    assert!(stdout.contains(&format!("Certificate: {}", out.join("test.crt").display())));
    assert!(out.join("test_key.pem").exists());
    assert!(out.join("test.crt").exists());
    assert!(!out.join("test.csr").exists());
}

#[test]
fn closed_stdin_fails_instead_of_looping() {
    let dir = tempfile::tempdir().unwrap();
    let output = certissue(dir.path(), &["--duration", "0"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Input closed"), "stderr: {stderr}");
    assert_eq!(entries(dir.path()), 0);
}
