#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mock_kms::{
    dispatcher,
    key_management::KeyRecord,
    EncryptionAlgorithm, SigningAlgorithm,
};

const RP1_ENCRYPTION_KEY: &str = include_str!("../../dev_key/encryption_keys/rp1");
const RP1_SIGNING_KEY: &str = include_str!("../../dev_key/keys/rp1");

#[derive(Arbitrary, Debug)]
struct DispatcherFuzzInput {
    algorithm: u8,
    payload: Vec<u8>,
}

fuzz_target!(|input: DispatcherFuzzInput| {
    // Arbitrary ciphertext must fail cleanly, never panic
    let encryption = EncryptionAlgorithm::ALL[input.algorithm as usize % EncryptionAlgorithm::ALL.len()];
    let record = KeyRecord::encryption(RP1_ENCRYPTION_KEY, encryption);
    let _ = dispatcher::decrypt(&record, &input.payload);

    // Every signing descriptor paired with an RSA key either signs or errors
    let signing = SigningAlgorithm::ALL[input.algorithm as usize % SigningAlgorithm::ALL.len()];
    let record = KeyRecord::signing(RP1_SIGNING_KEY, signing);
    let _ = dispatcher::sign(&record, &input.payload);
});
