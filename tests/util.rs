#![allow(dead_code)]

use std::path::{Path, PathBuf};

use certissue::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use certissue::cert::{Certificate, CertificateWithPrivateKey};
use certissue::config::Configuration;
use certissue::key::{KeyAlgorithm, KeyPair, PublicKey};

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let ca_key = KeyPair::generate_ecdsa_p256();

    let subject_dn = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .organization("Crab widgits SE".to_string())
        .build();

    let ca_cert_info = CertificationRequestInfo::builder()
        .subject(subject_dn.as_x509_name().unwrap())
        .subject_public_key(PublicKey::from_key_pair(&ca_key))
        .is_ca(true)
        .build();

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(
            &ca_cert_info,
            &ca_key,
            Validity::for_days(3650).unwrap(),
        )
        .unwrap(),
        key: ca_key,
    }
}

/// CA material on disk, the way an operator hands it to the tool.
pub struct CaFiles {
    pub ca: CertificateWithPrivateKey,
    pub cert: PathBuf,
    pub key: PathBuf,
    pub serial: PathBuf,
}

pub fn write_ca_files(dir: &Path) -> CaFiles {
    let ca = generate_ca_cert();
    let files = CaFiles {
        cert: dir.join("ca.crt"),
        key: dir.join("ca.key"),
        serial: dir.join("ca.srl"),
        ca,
    };
    std::fs::write(&files.cert, files.ca.cert.to_pem().unwrap()).unwrap();
    std::fs::write(&files.key, files.ca.key.to_pkcs8_pem().unwrap()).unwrap();
    std::fs::write(&files.serial, "01\n").unwrap();
    files
}

pub fn leaf_config(ca: &CaFiles, output_dir: &Path) -> Configuration {
    Configuration::builder()
        .common_name("test")
        .duration_days(365)
        .sans(vec!["DNS:test.example.com".parse().unwrap()])
        .ca_cert(ca.cert.clone())
        .ca_key(ca.key.clone())
        .ca_serial(ca.serial.clone())
        .output_dir(output_dir)
        .key_algorithm(KeyAlgorithm::EcdsaP256)
        .build()
}

pub fn read_certificate(path: &Path) -> Certificate {
    Certificate::from_pem(&std::fs::read_to_string(path).unwrap()).unwrap()
}
