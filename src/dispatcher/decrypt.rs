// RSA decryption for every supported encryption descriptor

use rsa::{Oaep, Pkcs1v15Encrypt};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use super::keys::PrivateKey;
use crate::algorithm::{EncryptionAlgorithm, EncryptionPadding, HashAlgorithm};
use crate::error::{error_codes, KmsError, KmsResult};

/// Decrypt `ciphertext` with `key` as described by `algorithm`.
pub fn decrypt_message(
    algorithm: EncryptionAlgorithm,
    key: &PrivateKey,
    ciphertext: &[u8],
) -> KmsResult<Vec<u8>> {
    let PrivateKey::Rsa(rsa_key) = key else {
        return Err(decryption_error(
            algorithm,
            &format!("{} is not usable with a {} key", algorithm, key.key_algorithm()),
        ));
    };

    let plaintext = match algorithm.padding() {
        EncryptionPadding::Pkcs1v15 => rsa_key.decrypt(Pkcs1v15Encrypt, ciphertext),
        // OAEP without an explicit hash means SHA-1, for both label and MGF1
        EncryptionPadding::Oaep => match algorithm.oaep_hash().unwrap_or(HashAlgorithm::Sha1) {
            HashAlgorithm::Sha1 => rsa_key.decrypt(Oaep::new::<Sha1>(), ciphertext),
            HashAlgorithm::Sha256 => rsa_key.decrypt(Oaep::new::<Sha256>(), ciphertext),
            HashAlgorithm::Sha384 => rsa_key.decrypt(Oaep::new::<Sha384>(), ciphertext),
            HashAlgorithm::Sha512 => rsa_key.decrypt(Oaep::new::<Sha512>(), ciphertext),
        },
    };

    plaintext.map_err(|e| decryption_error(algorithm, &e.to_string()))
}

fn decryption_error(algorithm: EncryptionAlgorithm, cause: &str) -> KmsError {
    KmsError::crypto_error_with_algorithm(
        "decrypt",
        cause,
        error_codes::DECRYPTION_FAILED,
        algorithm.name(),
    )
}
