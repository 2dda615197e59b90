//! Crypto Operation Dispatcher
//!
//! Stateless sign / decrypt over an explicit key record. The record's
//! descriptor picks padding and hash; nothing here checks that the descriptor
//! suits the key material, so a mismatched record fails only when used.

mod decrypt;
mod keys;
mod sign;
mod tests;

pub use decrypt::decrypt_message;
pub use keys::PrivateKey;
pub use sign::sign_message;

use crate::algorithm::OperationAlgorithm;
use crate::error::{error_codes, KmsError, KmsResult};
use crate::key_management::KeyRecord;

/// Sign `message` with a signing record.
pub fn sign(record: &KeyRecord, message: &[u8]) -> KmsResult<Vec<u8>> {
    match record.algorithm() {
        OperationAlgorithm::Signing(algorithm) => {
            let key = PrivateKey::from_pem(record.key_algorithm(), record.private_key())?;
            sign_message(algorithm, &key, message)
        }
        OperationAlgorithm::Encryption(algorithm) => Err(purpose_mismatch("sign", algorithm.name())),
    }
}

/// Decrypt `ciphertext` with an encryption record.
pub fn decrypt(record: &KeyRecord, ciphertext: &[u8]) -> KmsResult<Vec<u8>> {
    match record.algorithm() {
        OperationAlgorithm::Encryption(algorithm) => {
            let key = PrivateKey::from_pem(record.key_algorithm(), record.private_key())?;
            decrypt_message(algorithm, &key, ciphertext)
        }
        OperationAlgorithm::Signing(algorithm) => Err(purpose_mismatch("decrypt", algorithm.name())),
    }
}

/// Derive the SPKI PEM public key for a record's private key.
pub fn derive_public_key(record: &KeyRecord) -> KmsResult<String> {
    PrivateKey::from_pem(record.key_algorithm(), record.private_key())?.public_key_pem()
}

fn purpose_mismatch(operation: &str, algorithm: &str) -> KmsError {
    KmsError::crypto_error_with_algorithm(
        operation,
        &format!("{} cannot be used to {}", algorithm, operation),
        error_codes::ALGORITHM_PURPOSE_MISMATCH,
        algorithm,
    )
}
