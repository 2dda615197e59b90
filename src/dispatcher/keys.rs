// Private key decoding and public key derivation

use ed25519_dalek::SigningKey as Ed25519SigningKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;

use crate::algorithm::KeyAlgorithm;
use crate::error::{error_codes, KmsError, KmsResult};

/// A decoded private key, ready for a crypto operation
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    Ed25519(Ed25519SigningKey),
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            PrivateKey::Rsa(_) => "Rsa",
            PrivateKey::P256(_) => "P256",
            PrivateKey::P384(_) => "P384",
            PrivateKey::Ed25519(_) => "Ed25519",
        };
        f.debug_tuple(variant).field(&"[REDACTED]").finish()
    }
}

impl PrivateKey {
    /// Decode PEM key material as the given key family.
    ///
    /// RSA accepts PKCS#8 and PKCS#1, EC accepts PKCS#8 and SEC1 on P-256 or
    /// P-384, Ed25519 accepts PKCS#8. The error never echoes the input.
    pub fn from_pem(key_algorithm: KeyAlgorithm, pem: &str) -> KmsResult<Self> {
        let pem = pem.trim();

        match key_algorithm {
            KeyAlgorithm::Rsa => RsaPrivateKey::from_pkcs8_pem(pem)
                .map(PrivateKey::Rsa)
                .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem).map(PrivateKey::Rsa))
                .map_err(|e| decode_error(key_algorithm, &e.to_string())),
            KeyAlgorithm::Ec => {
                if let Ok(key) = p256::SecretKey::from_pkcs8_pem(pem) {
                    return Ok(PrivateKey::P256(key));
                }
                if let Ok(key) = p384::SecretKey::from_pkcs8_pem(pem) {
                    return Ok(PrivateKey::P384(key));
                }
                if let Ok(key) = p256::SecretKey::from_sec1_pem(pem) {
                    return Ok(PrivateKey::P256(key));
                }
                p384::SecretKey::from_sec1_pem(pem)
                    .map(PrivateKey::P384)
                    .map_err(|e| decode_error(key_algorithm, &e.to_string()))
            }
            KeyAlgorithm::Ed25519 => Ed25519SigningKey::from_pkcs8_pem(pem)
                .map(PrivateKey::Ed25519)
                .map_err(|e| decode_error(key_algorithm, &e.to_string())),
        }
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Rsa(_) => KeyAlgorithm::Rsa,
            PrivateKey::P256(_) | PrivateKey::P384(_) => KeyAlgorithm::Ec,
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// SPKI PEM encoding of the matching public key
    pub fn public_key_pem(&self) -> KmsResult<String> {
        let encoded = match self {
            PrivateKey::Rsa(key) => RsaPublicKey::from(key).to_public_key_pem(LineEnding::LF),
            PrivateKey::P256(key) => key.public_key().to_public_key_pem(LineEnding::LF),
            PrivateKey::P384(key) => key.public_key().to_public_key_pem(LineEnding::LF),
            PrivateKey::Ed25519(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
        };

        encoded.map_err(|e| {
            KmsError::crypto_error_with_algorithm(
                "public key derivation",
                &format!("Failed to encode public key: {}", e),
                error_codes::PUBLIC_KEY_ENCODE_FAILED,
                &self.key_algorithm().to_string(),
            )
        })
    }
}

fn decode_error(key_algorithm: KeyAlgorithm, cause: &str) -> KmsError {
    KmsError::crypto_error_with_algorithm(
        "private key decoding",
        &format!("Failed to decode {} private key: {}", key_algorithm, cause),
        error_codes::PRIVATE_KEY_DECODE_FAILED,
        &key_algorithm.to_string(),
    )
}
