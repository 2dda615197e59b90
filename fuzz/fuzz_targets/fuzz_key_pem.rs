#![no_main]

use libfuzzer_sys::fuzz_target;
use mock_kms::{dispatcher::PrivateKey, KeyAlgorithm};

fuzz_target!(|data: &[u8]| {
    let Ok(pem) = std::str::from_utf8(data) else {
        return;
    };
    for algorithm in [KeyAlgorithm::Rsa, KeyAlgorithm::Ec, KeyAlgorithm::Ed25519] {
        if let Ok(key) = PrivateKey::from_pem(algorithm, pem) {
            let _ = key.public_key_pem();
        }
    }
});
