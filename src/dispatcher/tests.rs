//! Tests for the crypto operation dispatcher

#[cfg(test)]
mod tests {
    use super::super::{decrypt, derive_public_key, sign, PrivateKey};
    use crate::algorithm::{EncryptionAlgorithm, HashAlgorithm, KeyAlgorithm, SigningAlgorithm};
    use crate::dispatcher::sign::pss_max_salt_len;
    use crate::error::error_codes;
    use crate::key_management::KeyRecord;
    use crate::test_fixtures::{dev_key, fixture};
    use rand::rngs::OsRng;
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
    use rsa::{Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
    use sha2::{Digest, Sha256, Sha512};

    const MESSAGE: &[u8] = b"request message from rp1";

    fn rp1_signing_pem() -> String {
        dev_key("keys/rp1")
    }

    fn rp1_encryption_public() -> RsaPublicKey {
        let private = RsaPrivateKey::from_pkcs1_pem(&dev_key("encryption_keys/rp1")).unwrap();
        RsaPublicKey::from(&private)
    }

    #[test]
    fn test_rsa_pkcs1v15_signature_verifies_with_public_key() {
        let record = KeyRecord::signing(rp1_signing_pem(), SigningAlgorithm::RsassaPkcs1V15Sha256);
        let signature = sign(&record, MESSAGE).unwrap();

        let public = RsaPublicKey::from_public_key_pem(&fixture("rp1_signing_public.pem")).unwrap();
        let hashed = Sha256::digest(MESSAGE);
        assert!(public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &signature)
            .is_ok());
    }

    #[test]
    fn test_rsa_pkcs1v15_signature_is_deterministic() {
        let record = KeyRecord::signing(rp1_signing_pem(), SigningAlgorithm::RsassaPkcs1V15Sha512);
        assert_eq!(sign(&record, MESSAGE).unwrap(), sign(&record, MESSAGE).unwrap());
    }

    #[test]
    fn test_rsa_pss_uses_maximum_salt() {
        let pem = rp1_signing_pem();
        let record = KeyRecord::signing(pem.clone(), SigningAlgorithm::RsassaPssSha512);
        let signature = sign(&record, MESSAGE).unwrap();

        let private = RsaPrivateKey::from_pkcs1_pem(&pem).unwrap();
        let salt_len = pss_max_salt_len(&private, HashAlgorithm::Sha512);
        // 2048-bit modulus: 256 - 64 - 2
        assert_eq!(salt_len, 190);

        let public = RsaPublicKey::from(&private);
        let hashed = Sha512::digest(MESSAGE);
        assert!(public
            .verify(Pss::new_with_salt::<Sha512>(salt_len), &hashed, &signature)
            .is_ok());
    }

    #[test]
    fn test_rsa_pkcs8_key_is_accepted() {
        let record = KeyRecord::signing(
            fixture("rsa_rotated_pkcs8.pem"),
            SigningAlgorithm::RsassaPkcs1V15Sha256,
        );
        let signature = sign(&record, MESSAGE).unwrap();
        assert_eq!(signature.len(), 256);
    }

    #[test]
    fn test_ecdsa_p256_signature_is_der_and_verifies() {
        use p256::ecdsa::signature::Verifier;

        let record = KeyRecord::signing(fixture("ec_p256_pkcs8.pem"), SigningAlgorithm::EcdsaSha256);
        let signature = sign(&record, MESSAGE).unwrap();

        let public = p256::PublicKey::from_public_key_pem(&fixture("ec_p256_public.pem")).unwrap();
        let verifying_key = p256::ecdsa::VerifyingKey::from(&public);
        let parsed = p256::ecdsa::Signature::from_der(&signature).unwrap();
        assert!(verifying_key.verify(MESSAGE, &parsed).is_ok());
    }

    #[test]
    fn test_ecdsa_p384_signature_verifies() {
        use p384::ecdsa::signature::Verifier;

        let pem = fixture("ec_p384_pkcs8.pem");
        let record = KeyRecord::signing(pem.clone(), SigningAlgorithm::EcdsaSha384);
        let signature = sign(&record, MESSAGE).unwrap();

        let secret = p384::SecretKey::from_pkcs8_pem(&pem).unwrap();
        let signing_key = p384::ecdsa::SigningKey::from(&secret);
        let parsed = p384::ecdsa::Signature::from_der(&signature).unwrap();
        assert!(signing_key.verifying_key().verify(MESSAGE, &parsed).is_ok());
    }

    #[test]
    fn test_sec1_ec_key_is_accepted() {
        let key = PrivateKey::from_pem(KeyAlgorithm::Ec, &fixture("ec_p256_sec1.pem")).unwrap();
        assert!(matches!(key, PrivateKey::P256(_)));
    }

    #[test]
    fn test_ed25519_signature_verifies() {
        use ed25519_dalek::{Signature, Verifier, VerifyingKey};

        let record = KeyRecord::signing(fixture("ed25519_pkcs8.pem"), SigningAlgorithm::Ed25519);
        let signature = sign(&record, MESSAGE).unwrap();
        assert_eq!(signature.len(), 64);

        let verifying_key = VerifyingKey::from_public_key_pem(&fixture("ed25519_public.pem")).unwrap();
        let parsed = Signature::from_slice(&signature).unwrap();
        assert!(verifying_key.verify(MESSAGE, &parsed).is_ok());
    }

    #[test]
    fn test_decrypt_pkcs1v15() {
        let ciphertext = rp1_encryption_public()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, b"secret payload")
            .unwrap();
        let record = KeyRecord::encryption(dev_key("encryption_keys/rp1"), EncryptionAlgorithm::RsaesPkcs1V15);

        assert_eq!(decrypt(&record, &ciphertext).unwrap(), b"secret payload");
    }

    #[test]
    fn test_decrypt_oaep_uses_descriptor_hash() {
        let public = rp1_encryption_public();
        let ciphertext = public
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), b"oaep payload")
            .unwrap();

        let sha256 = KeyRecord::encryption(dev_key("encryption_keys/rp1"), EncryptionAlgorithm::RsaesOaepSha256);
        assert_eq!(decrypt(&sha256, &ciphertext).unwrap(), b"oaep payload");

        // Same ciphertext under the SHA-1 descriptor must not decrypt
        let sha1 = KeyRecord::encryption(dev_key("encryption_keys/rp1"), EncryptionAlgorithm::RsaesOaepSha1);
        assert!(decrypt(&sha1, &ciphertext).is_err());
    }

    #[test]
    fn test_corrupt_ciphertext_fails() {
        let record = KeyRecord::encryption(dev_key("encryption_keys/rp1"), EncryptionAlgorithm::RsaesPkcs1V15);
        let error = decrypt(&record, &[0u8; 17]).unwrap_err();
        assert_eq!(error.error_code(), error_codes::DECRYPTION_FAILED);
    }

    #[test]
    fn test_mismatched_descriptor_fails_at_use() {
        // An ECDSA descriptor on RSA material is accepted at construction
        let record = KeyRecord::signing(rp1_signing_pem(), SigningAlgorithm::EcdsaSha256);
        let error = sign(&record, MESSAGE).unwrap_err();

        assert_eq!(error.error_code(), error_codes::PRIVATE_KEY_DECODE_FAILED);
        assert!(!error.to_string().contains("BEGIN"));
    }

    #[test]
    fn test_rsa_descriptor_on_ed25519_key_record_fails() {
        let record = KeyRecord::new(
            fixture("ed25519_pkcs8.pem"),
            KeyAlgorithm::Ed25519,
            SigningAlgorithm::RsassaPssSha256,
        );
        let error = sign(&record, MESSAGE).unwrap_err();
        assert_eq!(error.error_code(), error_codes::SIGNING_FAILED);
    }

    #[test]
    fn test_operation_must_match_record_purpose() {
        let record = KeyRecord::encryption(dev_key("encryption_keys/rp1"), EncryptionAlgorithm::RsaesPkcs1V15);
        let error = sign(&record, MESSAGE).unwrap_err();
        assert_eq!(error.error_code(), error_codes::ALGORITHM_PURPOSE_MISMATCH);
    }

    #[test]
    fn test_derived_public_key_matches_openssl_export() {
        let record = KeyRecord::signing(rp1_signing_pem(), SigningAlgorithm::default());
        let derived = derive_public_key(&record).unwrap();
        assert!(derived.starts_with("-----BEGIN PUBLIC KEY-----"));

        let expected = RsaPublicKey::from_public_key_pem(&fixture("rp1_signing_public.pem")).unwrap();
        assert_eq!(RsaPublicKey::from_public_key_pem(&derived).unwrap(), expected);

        let ed25519 = KeyRecord::signing(fixture("ed25519_pkcs8.pem"), SigningAlgorithm::Ed25519);
        assert_eq!(
            derive_public_key(&ed25519).unwrap().trim(),
            fixture("ed25519_public.pem").trim()
        );
    }
}
