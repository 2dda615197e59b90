// In-memory key store: node id -> signing, signing master and encryption key records

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::algorithm::{EncryptionAlgorithm, KeyAlgorithm, OperationAlgorithm, SigningAlgorithm};
use crate::error::{KmsError, KmsResult};

/// What a node uses a key for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPurpose {
    /// Authenticates ordinary protocol messages
    Signing,

    /// Higher-privilege key for sensitive operations such as key rotation
    SigningMaster,

    /// Decrypts messages addressed to the node
    Encryption,
}

impl KeyPurpose {
    pub const ALL: [KeyPurpose; 3] = [
        KeyPurpose::Signing,
        KeyPurpose::SigningMaster,
        KeyPurpose::Encryption,
    ];
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPurpose::Signing => write!(f, "signing"),
            KeyPurpose::SigningMaster => write!(f, "signing master"),
            KeyPurpose::Encryption => write!(f, "encryption"),
        }
    }
}

/// One private key together with the algorithm it is used with.
///
/// Records are immutable; rotation swaps in a whole new record.
#[derive(Clone)]
pub struct KeyRecord {
    private_key: Zeroizing<String>,
    key_algorithm: KeyAlgorithm,
    algorithm: OperationAlgorithm,
}

impl KeyRecord {
    /// Build a record without checking that the key matches the algorithm.
    pub fn new(
        private_key: impl Into<String>,
        key_algorithm: KeyAlgorithm,
        algorithm: impl Into<OperationAlgorithm>,
    ) -> Self {
        Self {
            private_key: Zeroizing::new(private_key.into()),
            key_algorithm,
            algorithm: algorithm.into(),
        }
    }

    /// Signing record whose key family is implied by the descriptor
    pub fn signing(private_key: impl Into<String>, algorithm: SigningAlgorithm) -> Self {
        Self::new(private_key, algorithm.key_algorithm(), algorithm)
    }

    pub fn encryption(private_key: impl Into<String>, algorithm: EncryptionAlgorithm) -> Self {
        Self::new(private_key, algorithm.key_algorithm(), algorithm)
    }

    /// PEM-encoded private key
    pub fn private_key(&self) -> &str {
        self.private_key.as_str()
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    pub fn algorithm(&self) -> OperationAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("private_key", &"[REDACTED]")
            .field("key_algorithm", &self.key_algorithm)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// The three key records held for one node
#[derive(Debug, Clone)]
pub struct NodeKeySet {
    pub signing_key: Arc<KeyRecord>,
    pub signing_master_key: Arc<KeyRecord>,
    pub encryption_key: Arc<KeyRecord>,
}

impl NodeKeySet {
    pub fn new(signing_key: KeyRecord, signing_master_key: KeyRecord, encryption_key: KeyRecord) -> Self {
        Self {
            signing_key: Arc::new(signing_key),
            signing_master_key: Arc::new(signing_master_key),
            encryption_key: Arc::new(encryption_key),
        }
    }

    pub fn get(&self, purpose: KeyPurpose) -> &Arc<KeyRecord> {
        match purpose {
            KeyPurpose::Signing => &self.signing_key,
            KeyPurpose::SigningMaster => &self.signing_master_key,
            KeyPurpose::Encryption => &self.encryption_key,
        }
    }

    /// Swap one record, leaving the other two untouched
    pub fn replace(&mut self, purpose: KeyPurpose, record: KeyRecord) {
        let slot = match purpose {
            KeyPurpose::Signing => &mut self.signing_key,
            KeyPurpose::SigningMaster => &mut self.signing_master_key,
            KeyPurpose::Encryption => &mut self.encryption_key,
        };
        *slot = Arc::new(record);
    }
}

/// Mapping from node id to that node's key set.
///
/// Cloning is cheap: records are shared until one side replaces them.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    nodes: HashMap<String, NodeKeySet>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a node's key set, returning the previous one
    pub fn insert(&mut self, node_id: impl Into<String>, key_set: NodeKeySet) -> Option<NodeKeySet> {
        self.nodes.insert(node_id.into(), key_set)
    }

    pub fn get(&self, node_id: &str, purpose: KeyPurpose) -> KmsResult<Arc<KeyRecord>> {
        self.nodes
            .get(node_id)
            .map(|key_set| Arc::clone(key_set.get(purpose)))
            .ok_or_else(|| KmsError::key_not_found(node_id, &purpose.to_string()))
    }

    /// Replace one record of a node that is already present
    pub fn replace(&mut self, node_id: &str, purpose: KeyPurpose, record: KeyRecord) -> KmsResult<()> {
        let key_set = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| KmsError::key_not_found(node_id, &purpose.to_string()))?;
        key_set.replace(purpose, record);
        Ok(())
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Loaded node ids, sorted
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
