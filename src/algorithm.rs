/*!
 * Key and operation algorithm descriptors
 *
 * A key record carries one of these descriptors; the dispatcher pattern-matches
 * on it to pick padding and hash at call time.
 */

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::KmsError;

/// Mathematical key family, independent of how the key is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "EC")]
    Ec,
    #[serde(rename = "Ed25519")]
    Ed25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "RSA"),
            KeyAlgorithm::Ec => write!(f, "EC"),
            KeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA" => Ok(KeyAlgorithm::Rsa),
            "EC" => Ok(KeyAlgorithm::Ec),
            "Ed25519" => Ok(KeyAlgorithm::Ed25519),
            other => Err(KmsError::invalid_parameter(
                "key_algorithm",
                "RSA, EC or Ed25519",
                other,
            )),
        }
    }
}

/// Message digest applied before signing, or inside OAEP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA384")]
    Sha384,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest length in bytes
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "SHA1"),
            HashAlgorithm::Sha256 => write!(f, "SHA256"),
            HashAlgorithm::Sha384 => write!(f, "SHA384"),
            HashAlgorithm::Sha512 => write!(f, "SHA512"),
        }
    }
}

/// Padding used by a signing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePadding {
    /// RSASSA-PKCS1-v1_5
    Pkcs1v15,
    /// RSASSA-PSS with MGF1 and maximum salt length
    Pss,
    /// Curve-based schemes carry no padding
    None,
}

/// Padding used by an encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionPadding {
    /// RSAES-PKCS1-v1_5
    Pkcs1v15,
    /// RSAES-OAEP
    Oaep,
}

/// Named signing descriptor: fully determines how a message becomes a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[serde(rename = "RSASSA_PSS_SHA_256")]
    RsassaPssSha256,
    #[serde(rename = "RSASSA_PSS_SHA_384")]
    RsassaPssSha384,
    #[serde(rename = "RSASSA_PSS_SHA_512")]
    RsassaPssSha512,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_256")]
    RsassaPkcs1V15Sha256,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_384")]
    RsassaPkcs1V15Sha384,
    #[serde(rename = "RSASSA_PKCS1_V1_5_SHA_512")]
    RsassaPkcs1V15Sha512,
    #[serde(rename = "ECDSA_SHA_256")]
    EcdsaSha256,
    #[serde(rename = "ECDSA_SHA_384")]
    EcdsaSha384,
    #[serde(rename = "Ed25519")]
    Ed25519,
}

impl SigningAlgorithm {
    pub const ALL: [SigningAlgorithm; 9] = [
        SigningAlgorithm::RsassaPssSha256,
        SigningAlgorithm::RsassaPssSha384,
        SigningAlgorithm::RsassaPssSha512,
        SigningAlgorithm::RsassaPkcs1V15Sha256,
        SigningAlgorithm::RsassaPkcs1V15Sha384,
        SigningAlgorithm::RsassaPkcs1V15Sha512,
        SigningAlgorithm::EcdsaSha256,
        SigningAlgorithm::EcdsaSha384,
        SigningAlgorithm::Ed25519,
    ];

    /// Wire name of the descriptor
    pub fn name(&self) -> &'static str {
        match self {
            SigningAlgorithm::RsassaPssSha256 => "RSASSA_PSS_SHA_256",
            SigningAlgorithm::RsassaPssSha384 => "RSASSA_PSS_SHA_384",
            SigningAlgorithm::RsassaPssSha512 => "RSASSA_PSS_SHA_512",
            SigningAlgorithm::RsassaPkcs1V15Sha256 => "RSASSA_PKCS1_V1_5_SHA_256",
            SigningAlgorithm::RsassaPkcs1V15Sha384 => "RSASSA_PKCS1_V1_5_SHA_384",
            SigningAlgorithm::RsassaPkcs1V15Sha512 => "RSASSA_PKCS1_V1_5_SHA_512",
            SigningAlgorithm::EcdsaSha256 => "ECDSA_SHA_256",
            SigningAlgorithm::EcdsaSha384 => "ECDSA_SHA_384",
            SigningAlgorithm::Ed25519 => "Ed25519",
        }
    }

    /// Hash applied to the message; `None` for pure Ed25519
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        match self {
            SigningAlgorithm::RsassaPssSha256
            | SigningAlgorithm::RsassaPkcs1V15Sha256
            | SigningAlgorithm::EcdsaSha256 => Some(HashAlgorithm::Sha256),
            SigningAlgorithm::RsassaPssSha384
            | SigningAlgorithm::RsassaPkcs1V15Sha384
            | SigningAlgorithm::EcdsaSha384 => Some(HashAlgorithm::Sha384),
            SigningAlgorithm::RsassaPssSha512 | SigningAlgorithm::RsassaPkcs1V15Sha512 => {
                Some(HashAlgorithm::Sha512)
            }
            SigningAlgorithm::Ed25519 => None,
        }
    }

    pub fn padding(&self) -> SignaturePadding {
        match self {
            SigningAlgorithm::RsassaPssSha256
            | SigningAlgorithm::RsassaPssSha384
            | SigningAlgorithm::RsassaPssSha512 => SignaturePadding::Pss,
            SigningAlgorithm::RsassaPkcs1V15Sha256
            | SigningAlgorithm::RsassaPkcs1V15Sha384
            | SigningAlgorithm::RsassaPkcs1V15Sha512 => SignaturePadding::Pkcs1v15,
            SigningAlgorithm::EcdsaSha256
            | SigningAlgorithm::EcdsaSha384
            | SigningAlgorithm::Ed25519 => SignaturePadding::None,
        }
    }

    /// Key family this descriptor is meant for
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self.padding() {
            SignaturePadding::Pkcs1v15 | SignaturePadding::Pss => KeyAlgorithm::Rsa,
            SignaturePadding::None => match self {
                SigningAlgorithm::Ed25519 => KeyAlgorithm::Ed25519,
                _ => KeyAlgorithm::Ec,
            },
        }
    }
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        SigningAlgorithm::RsassaPkcs1V15Sha256
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = KmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SigningAlgorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| {
                KmsError::invalid_parameter("signing_algorithm", "a known signing algorithm", s)
            })
    }
}

/// Named encryption descriptor: determines how ciphertext is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[serde(rename = "RSAES_PKCS1_V1_5")]
    RsaesPkcs1V15,
    #[serde(rename = "RSAES_OAEP_SHA_1")]
    RsaesOaepSha1,
    #[serde(rename = "RSAES_OAEP_SHA_256")]
    RsaesOaepSha256,
}

impl EncryptionAlgorithm {
    pub const ALL: [EncryptionAlgorithm; 3] = [
        EncryptionAlgorithm::RsaesPkcs1V15,
        EncryptionAlgorithm::RsaesOaepSha1,
        EncryptionAlgorithm::RsaesOaepSha256,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::RsaesPkcs1V15 => "RSAES_PKCS1_V1_5",
            EncryptionAlgorithm::RsaesOaepSha1 => "RSAES_OAEP_SHA_1",
            EncryptionAlgorithm::RsaesOaepSha256 => "RSAES_OAEP_SHA_256",
        }
    }

    pub fn padding(&self) -> EncryptionPadding {
        match self {
            EncryptionAlgorithm::RsaesPkcs1V15 => EncryptionPadding::Pkcs1v15,
            EncryptionAlgorithm::RsaesOaepSha1 | EncryptionAlgorithm::RsaesOaepSha256 => {
                EncryptionPadding::Oaep
            }
        }
    }

    /// OAEP digest; absent for PKCS#1 v1.5
    pub fn oaep_hash(&self) -> Option<HashAlgorithm> {
        match self {
            EncryptionAlgorithm::RsaesPkcs1V15 => None,
            EncryptionAlgorithm::RsaesOaepSha1 => Some(HashAlgorithm::Sha1),
            EncryptionAlgorithm::RsaesOaepSha256 => Some(HashAlgorithm::Sha256),
        }
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }
}

impl Default for EncryptionAlgorithm {
    fn default() -> Self {
        EncryptionAlgorithm::RsaesPkcs1V15
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncryptionAlgorithm {
    type Err = KmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncryptionAlgorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| {
                KmsError::invalid_parameter(
                    "encryption_algorithm",
                    "a known encryption algorithm",
                    s,
                )
            })
    }
}

/// The operation a key record is used for, with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationAlgorithm {
    Signing(SigningAlgorithm),
    Encryption(EncryptionAlgorithm),
}

impl OperationAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            OperationAlgorithm::Signing(algorithm) => algorithm.name(),
            OperationAlgorithm::Encryption(algorithm) => algorithm.name(),
        }
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            OperationAlgorithm::Signing(algorithm) => algorithm.key_algorithm(),
            OperationAlgorithm::Encryption(algorithm) => algorithm.key_algorithm(),
        }
    }
}

impl From<SigningAlgorithm> for OperationAlgorithm {
    fn from(algorithm: SigningAlgorithm) -> Self {
        OperationAlgorithm::Signing(algorithm)
    }
}

impl From<EncryptionAlgorithm> for OperationAlgorithm {
    fn from(algorithm: EncryptionAlgorithm) -> Self {
        OperationAlgorithm::Encryption(algorithm)
    }
}

impl fmt::Display for OperationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_descriptor_parameters() {
        let algorithm = SigningAlgorithm::RsassaPkcs1V15Sha256;
        assert_eq!(algorithm.hash_algorithm(), Some(HashAlgorithm::Sha256));
        assert_eq!(algorithm.padding(), SignaturePadding::Pkcs1v15);
        assert_eq!(algorithm.key_algorithm(), KeyAlgorithm::Rsa);

        assert_eq!(SigningAlgorithm::EcdsaSha384.key_algorithm(), KeyAlgorithm::Ec);
        assert_eq!(SigningAlgorithm::Ed25519.hash_algorithm(), None);
        assert_eq!(SigningAlgorithm::RsassaPssSha512.padding(), SignaturePadding::Pss);
    }

    #[test]
    fn test_defaults_match_fixture_provisioning() {
        assert_eq!(SigningAlgorithm::default().name(), "RSASSA_PKCS1_V1_5_SHA_256");
        assert_eq!(EncryptionAlgorithm::default().name(), "RSAES_PKCS1_V1_5");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "ECDSA_SHA_256".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::EcdsaSha256
        );
        assert_eq!(
            "RSAES_OAEP_SHA_1".parse::<EncryptionAlgorithm>().unwrap(),
            EncryptionAlgorithm::RsaesOaepSha1
        );
        assert!("RSA-SHA256".parse::<SigningAlgorithm>().is_err());
        assert!("EC".parse::<KeyAlgorithm>().is_ok());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&SigningAlgorithm::RsassaPssSha384).unwrap();
        assert_eq!(json, "\"RSASSA_PSS_SHA_384\"");

        let operation: OperationAlgorithm =
            serde_json::from_str("\"RSAES_OAEP_SHA_256\"").unwrap();
        assert_eq!(
            operation,
            OperationAlgorithm::Encryption(EncryptionAlgorithm::RsaesOaepSha256)
        );
    }

    #[test]
    fn test_hash_output_sizes() {
        for hash in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(hash.digest(b"abc").len(), hash.output_size());
        }
    }
}
