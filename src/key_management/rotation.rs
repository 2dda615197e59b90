// Key rotation API: overwrite current-store records, inspect original ones

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use super::store::{KeyPurpose, KeyRecord};
use crate::algorithm::{EncryptionAlgorithm, KeyAlgorithm, OperationAlgorithm, SigningAlgorithm};
use crate::dispatcher;
use crate::error::KmsResult;
use crate::kms::MockKms;

/// A stored key as seen by test code, with its derived public key
#[derive(Clone, Serialize)]
pub struct NodeKeyInfo {
    pub private_key: String,
    pub public_key: String,
    /// First 8 bytes of SHA-256 over the public key PEM, hex encoded
    pub fingerprint: String,
    pub key_algorithm: KeyAlgorithm,
    pub algorithm: OperationAlgorithm,
}

impl fmt::Debug for NodeKeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKeyInfo")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("fingerprint", &self.fingerprint)
            .field("key_algorithm", &self.key_algorithm)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl NodeKeyInfo {
    fn from_record(record: &KeyRecord) -> KmsResult<Self> {
        let public_key = dispatcher::derive_public_key(record)?;
        Ok(Self {
            private_key: record.private_key().to_string(),
            fingerprint: fingerprint(&public_key),
            public_key,
            key_algorithm: record.key_algorithm(),
            algorithm: record.algorithm(),
        })
    }
}

impl MockKms {
    /// Replace a node's signing key in the current store.
    ///
    /// The key is not checked against the algorithm; a bad pairing shows up
    /// on the next sign request.
    pub fn set_node_signing_key(
        &self,
        node_id: &str,
        private_key: impl Into<String>,
        algorithm: SigningAlgorithm,
    ) -> KmsResult<()> {
        self.rotate(node_id, KeyPurpose::Signing, KeyRecord::signing(private_key, algorithm))
    }

    pub fn set_node_signing_master_key(
        &self,
        node_id: &str,
        private_key: impl Into<String>,
        algorithm: SigningAlgorithm,
    ) -> KmsResult<()> {
        self.rotate(
            node_id,
            KeyPurpose::SigningMaster,
            KeyRecord::signing(private_key, algorithm),
        )
    }

    pub fn set_node_encryption_key(
        &self,
        node_id: &str,
        private_key: impl Into<String>,
        algorithm: EncryptionAlgorithm,
    ) -> KmsResult<()> {
        self.rotate(
            node_id,
            KeyPurpose::Encryption,
            KeyRecord::encryption(private_key, algorithm),
        )
    }

    pub fn get_original_node_signing_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.original_key_info(node_id, KeyPurpose::Signing)
    }

    pub fn get_original_node_signing_master_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.original_key_info(node_id, KeyPurpose::SigningMaster)
    }

    pub fn get_original_node_encryption_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.original_key_info(node_id, KeyPurpose::Encryption)
    }

    pub fn get_current_node_signing_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.current_key_info(node_id, KeyPurpose::Signing)
    }

    pub fn get_current_node_signing_master_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.current_key_info(node_id, KeyPurpose::SigningMaster)
    }

    pub fn get_current_node_encryption_key(&self, node_id: &str) -> KmsResult<NodeKeyInfo> {
        self.current_key_info(node_id, KeyPurpose::Encryption)
    }

    /// Factory key of a node, with the public key derived on demand
    pub fn original_key_info(&self, node_id: &str, purpose: KeyPurpose) -> KmsResult<NodeKeyInfo> {
        let record = self.original_store().get(node_id, purpose)?;
        NodeKeyInfo::from_record(&record)
    }

    pub fn current_key_info(&self, node_id: &str, purpose: KeyPurpose) -> KmsResult<NodeKeyInfo> {
        let record = self.current_store().get(node_id, purpose)?;
        NodeKeyInfo::from_record(&record)
    }

    fn rotate(&self, node_id: &str, purpose: KeyPurpose, record: KeyRecord) -> KmsResult<()> {
        let algorithm = record.algorithm();
        let new_fingerprint = dispatcher::derive_public_key(&record)
            .map(|public_key| fingerprint(&public_key))
            .unwrap_or_else(|_| "unparseable".to_string());

        self.current_store_mut().replace(node_id, purpose, record)?;
        log::warn!(
            "Rotated {} key of node '{}' (algorithm {}, fingerprint {})",
            purpose,
            node_id,
            algorithm,
            new_fingerprint
        );
        Ok(())
    }
}

/// Short public key fingerprint for logs and test assertions
pub fn fingerprint(public_key_pem: &str) -> String {
    hex::encode(&Sha256::digest(public_key_pem.as_bytes())[..8])
}
