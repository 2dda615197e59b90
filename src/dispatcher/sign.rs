// Signature generation for every supported signing descriptor

use ed25519_dalek::Signer;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use super::keys::PrivateKey;
use crate::algorithm::{HashAlgorithm, SignaturePadding, SigningAlgorithm};
use crate::error::{error_codes, KmsError, KmsResult};

/// Sign `message` with `key` as described by `algorithm`.
///
/// The message is hashed here; callers pass the raw message bytes. ECDSA
/// signatures are DER encoded, Ed25519 signatures are the raw 64 bytes.
pub fn sign_message(
    algorithm: SigningAlgorithm,
    key: &PrivateKey,
    message: &[u8],
) -> KmsResult<Vec<u8>> {
    match (key, algorithm.padding(), algorithm.hash_algorithm()) {
        (PrivateKey::Rsa(rsa_key), SignaturePadding::Pkcs1v15, Some(hash)) => {
            sign_rsa_pkcs1v15(rsa_key, hash, message, algorithm)
        }
        (PrivateKey::Rsa(rsa_key), SignaturePadding::Pss, Some(hash)) => {
            sign_rsa_pss(rsa_key, hash, message, algorithm)
        }
        (PrivateKey::P256(secret), SignaturePadding::None, Some(hash)) => {
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature = signing_key
                .sign_prehash(&hash.digest(message))
                .map_err(|e| signing_error(algorithm, &e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        (PrivateKey::P384(secret), SignaturePadding::None, Some(hash)) => {
            let signing_key = p384::ecdsa::SigningKey::from(secret);
            let signature: p384::ecdsa::Signature = signing_key
                .sign_prehash(&hash.digest(message))
                .map_err(|e| signing_error(algorithm, &e.to_string()))?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        (PrivateKey::Ed25519(signing_key), SignaturePadding::None, None) => {
            Ok(signing_key.sign(message).to_bytes().to_vec())
        }
        (key, _, _) => Err(signing_error(
            algorithm,
            &format!("{} is not usable with a {} key", algorithm, key.key_algorithm()),
        )),
    }
}

fn sign_rsa_pkcs1v15(
    key: &RsaPrivateKey,
    hash: HashAlgorithm,
    message: &[u8],
    algorithm: SigningAlgorithm,
) -> KmsResult<Vec<u8>> {
    let scheme = match hash {
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    };

    key.sign(scheme, &hash.digest(message))
        .map_err(|e| signing_error(algorithm, &e.to_string()))
}

fn sign_rsa_pss(
    key: &RsaPrivateKey,
    hash: HashAlgorithm,
    message: &[u8],
    algorithm: SigningAlgorithm,
) -> KmsResult<Vec<u8>> {
    let salt_len = pss_max_salt_len(key, hash);
    let scheme = match hash {
        HashAlgorithm::Sha1 => Pss::new_with_salt::<Sha1>(salt_len),
        HashAlgorithm::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
        HashAlgorithm::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
        HashAlgorithm::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
    };

    key.sign_with_rng(&mut OsRng, scheme, &hash.digest(message))
        .map_err(|e| signing_error(algorithm, &e.to_string()))
}

/// Largest salt that fits the encoded message: emLen - hLen - 2.
pub(crate) fn pss_max_salt_len(key: &RsaPrivateKey, hash: HashAlgorithm) -> usize {
    let em_len = (key.n().bits() + 6) / 8;
    em_len.saturating_sub(hash.output_size() + 2)
}

fn signing_error(algorithm: SigningAlgorithm, cause: &str) -> KmsError {
    KmsError::crypto_error_with_algorithm(
        "sign",
        cause,
        error_codes::SIGNING_FAILED,
        algorithm.name(),
    )
}
