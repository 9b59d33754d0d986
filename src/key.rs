use std::fmt;

use const_oid::db::{rfc5912, rfc8410};
use der::Encode;
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use signature::{SignatureEncoding, Signer, Verifier};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CertIssueError, Result};

/// Algorithms available for the freshly generated leaf key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum KeyAlgorithm {
    #[default]
    #[value(name = "rsa2048")]
    Rsa2048,
    #[value(name = "rsa3072")]
    Rsa3072,
    #[value(name = "rsa4096")]
    Rsa4096,
    #[value(name = "p256")]
    EcdsaP256,
    #[value(name = "p384")]
    EcdsaP384,
    #[value(name = "ed25519")]
    Ed25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::Rsa2048 => "rsa2048",
            KeyAlgorithm::Rsa3072 => "rsa3072",
            KeyAlgorithm::Rsa4096 => "rsa4096",
            KeyAlgorithm::EcdsaP256 => "p256",
            KeyAlgorithm::EcdsaP384 => "p384",
            KeyAlgorithm::Ed25519 => "ed25519",
        };
        f.write_str(name)
    }
}

/// Supported key types for certificate operations.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            KeyPair::Rsa { .. } => "Rsa",
            KeyPair::EcdsaP256 { .. } => "EcdsaP256",
            KeyPair::EcdsaP384 { .. } => "EcdsaP384",
            KeyPair::Ed25519 { .. } => "Ed25519",
        };
        f.debug_struct("KeyPair").field("kind", &kind).finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a key pair for the given algorithm.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        match algorithm {
            KeyAlgorithm::Rsa2048 => Self::generate_rsa(2048),
            KeyAlgorithm::Rsa3072 => Self::generate_rsa(3072),
            KeyAlgorithm::Rsa4096 => Self::generate_rsa(4096),
            KeyAlgorithm::EcdsaP256 => Ok(Self::generate_ecdsa_p256()),
            KeyAlgorithm::EcdsaP384 => Ok(Self::generate_ecdsa_p384()),
            KeyAlgorithm::Ed25519 => Ok(Self::generate_ed25519()),
        }
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P384SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP384 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = Ed25519SigningKey::generate(&mut rng);
        KeyPair::Ed25519 { signing_key }
    }

    /// Imports a private key from PEM.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`), PKCS#1 (`RSA PRIVATE KEY`) and SEC1
    /// (`EC PRIVATE KEY`) encodings, which covers what `openssl genrsa`,
    /// `openssl ecparam -genkey` and `openssl genpkey` write.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let label = pem::parse(pem_str)?.tag().to_string();
        match label.as_str() {
            "PRIVATE KEY" => Self::import_from_pkcs8_pem(pem_str),
            "RSA PRIVATE KEY" => {
                let private = RsaPrivateKey::from_pkcs1_pem(pem_str)
                    .map_err(|e| CertIssueError::DecodingError(e.to_string()))?;
                Ok(Self::from_rsa(private))
            }
            "EC PRIVATE KEY" => {
                if let Ok(secret) = p256::SecretKey::from_sec1_pem(pem_str) {
                    let signing_key = P256SigningKey::from(secret);
                    let verifying_key = *signing_key.verifying_key();
                    return Ok(KeyPair::EcdsaP256 {
                        signing_key,
                        verifying_key,
                    });
                }
                let secret = p384::SecretKey::from_sec1_pem(pem_str).map_err(|_| {
                    CertIssueError::DecodingError(
                        "EC private key is neither P-256 nor P-384".to_string(),
                    )
                })?;
                let signing_key = P384SigningKey::from(secret);
                let verifying_key = *signing_key.verifying_key();
                Ok(KeyPair::EcdsaP384 {
                    signing_key,
                    verifying_key,
                })
            }
            "ENCRYPTED PRIVATE KEY" => Err(CertIssueError::InvalidInput(
                "encrypted private keys are not supported".to_string(),
            )),
            other => Err(CertIssueError::DecodingError(format!(
                "unexpected PEM label {other:?} for a private key"
            ))),
        }
    }

    /// Imports a PKCS#8 private key of any supported type.
    pub fn import_from_pkcs8_pem(pem_str: &str) -> Result<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_pem(pem_str) {
            return Ok(Self::from_rsa(private));
        }
        if let Ok(signing_key) = P256SigningKey::from_pkcs8_pem(pem_str) {
            let verifying_key = *signing_key.verifying_key();
            return Ok(KeyPair::EcdsaP256 {
                signing_key,
                verifying_key,
            });
        }
        if let Ok(signing_key) = P384SigningKey::from_pkcs8_pem(pem_str) {
            let verifying_key = *signing_key.verifying_key();
            return Ok(KeyPair::EcdsaP384 {
                signing_key,
                verifying_key,
            });
        }
        Ed25519SigningKey::from_pkcs8_pem(pem_str)
            .map(|signing_key| KeyPair::Ed25519 { signing_key })
            .map_err(|_| {
                CertIssueError::DecodingError(
                    "PKCS#8 key is not RSA, P-256, P-384 or Ed25519".to_string(),
                )
            })
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    /// Exports the private key as PKCS#8 PEM.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let encoded = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP256 { signing_key, .. } => signing_key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP384 { signing_key, .. } => signing_key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_pem(LineEnding::LF),
        }
        .map_err(|e| CertIssueError::EncodingError(e.to_string()))?;
        Ok(encoded.to_string())
    }

    /// The signature algorithm this key produces.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        PublicKey::from_key_pair(self).signature_algorithm()
    }

    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        PublicKey::from_key_pair(self).to_spki()
    }

    /// Signs `data`, returning the signature in the encoding X.509 expects
    /// (DER `Ecdsa-Sig-Value` for ECDSA, raw bytes otherwise).
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key =
                    rsa::pkcs1v15::SigningKey::<Sha256>::new(private.as_ref().clone());
                let signature = signing_key.try_sign(data)?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key, .. } => {
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => {
                let signature = signing_key.try_sign(data)?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

/// Public half of a [`KeyPair`].
#[derive(Clone, Debug, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// The algorithm signatures by the matching private key use.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            PublicKey::Rsa(_) => SignatureAlgorithm::Sha256WithRSA,
            PublicKey::EcdsaP256(_) => SignatureAlgorithm::Sha256WithECDSA,
            PublicKey::EcdsaP384(_) => SignatureAlgorithm::Sha384WithECDSA,
            PublicKey::Ed25519(_) => SignatureAlgorithm::Ed25519,
        }
    }

    /// Reads a public key out of a `SubjectPublicKeyInfo`.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let decode_error = |e: pkcs8::spki::Error| CertIssueError::DecodingError(e.to_string());
        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => RsaPublicKey::from_public_key_der(&der)
                .map(PublicKey::Rsa)
                .map_err(decode_error),
            rfc5912::ID_EC_PUBLIC_KEY => {
                if let Ok(key) = P256VerifyingKey::from_public_key_der(&der) {
                    return Ok(PublicKey::EcdsaP256(key));
                }
                P384VerifyingKey::from_public_key_der(&der)
                    .map(PublicKey::EcdsaP384)
                    .map_err(decode_error)
            }
            rfc8410::ID_ED_25519 => Ed25519VerifyingKey::from_public_key_der(&der)
                .map(PublicKey::Ed25519)
                .map_err(decode_error),
            other => Err(CertIssueError::DecodingError(format!(
                "unsupported public key algorithm {other}"
            ))),
        }
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone())?,
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)?
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)?
            }
            PublicKey::Ed25519(verifying_key) => SubjectPublicKeyInfoOwned::from_key(*verifying_key)?,
        };
        Ok(spki)
    }

    /// Checks a signature produced by [`KeyPair::sign_data`] with the matching key.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            PublicKey::Rsa(public) => {
                let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public.clone());
                let signature = rsa::pkcs1v15::Signature::try_from(signature)?;
                verifying_key.verify(data, &signature)?;
            }
            PublicKey::EcdsaP256(verifying_key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify(data, &signature)?;
            }
            PublicKey::EcdsaP384(verifying_key) => {
                let signature = p384::ecdsa::Signature::from_der(signature)?;
                verifying_key.verify(data, &signature)?;
            }
            PublicKey::Ed25519(verifying_key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)?;
                verifying_key.verify(data, &signature)?;
            }
        }
        Ok(())
    }
}
