//! The mock KMS service object
//!
//! Holds the write-once `original` store, the rotatable `current` store and
//! the process-wide key source mode. Build it once and share it as
//! `Arc<MockKms>` between the HTTP layer and test code.
//!
//! The locks below make shared access memory-safe; they do not order rotation
//! against requests already in flight. A test that rotates a node's key while
//! a request for that node is being served may see either key. Tests are
//! expected to serialise rotation with their own traffic.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::KmsConfig;
use crate::dispatcher;
use crate::error::KmsResult;
use crate::key_management::{load_key_store, KeyPurpose, KeyRecord, KeyStore};
use crate::key_source::KeySourceMode;

pub struct MockKms {
    original: KeyStore,
    current: RwLock<KeyStore>,
    key_source: RwLock<KeySourceMode>,
}

impl MockKms {
    /// Seed both stores with identical records.
    pub fn new(store: KeyStore) -> Self {
        Self {
            current: RwLock::new(store.clone()),
            original: store,
            key_source: RwLock::new(KeySourceMode::default()),
        }
    }

    /// Load key material from disk as described by `config`.
    pub fn load(config: &KmsConfig) -> KmsResult<Self> {
        config.validate()?;
        Ok(Self::new(load_key_store(config)?))
    }

    /// Ids of every loaded node, sorted
    pub fn node_ids(&self) -> Vec<String> {
        self.original.node_ids()
    }

    /// Look up a record in the store selected by the current key source.
    pub fn resolve(&self, node_id: &str, purpose: KeyPurpose) -> KmsResult<Arc<KeyRecord>> {
        match self.key_source() {
            KeySourceMode::Original => self.original.get(node_id, purpose),
            KeySourceMode::Internal => self.current_store().get(node_id, purpose),
        }
    }

    /// Sign `message` with the node's signing or signing master key.
    pub fn sign(&self, node_id: &str, purpose: KeyPurpose, message: &[u8]) -> KmsResult<Vec<u8>> {
        let record = self.resolve(node_id, purpose)?;
        dispatcher::sign(&record, message)
    }

    /// Decrypt `ciphertext` with the node's encryption key.
    pub fn decrypt(&self, node_id: &str, ciphertext: &[u8]) -> KmsResult<Vec<u8>> {
        let record = self.resolve(node_id, KeyPurpose::Encryption)?;
        dispatcher::decrypt(&record, ciphertext)
    }

    pub(crate) fn original_store(&self) -> &KeyStore {
        &self.original
    }

    // A panic while holding one of these locks cannot leave a store half
    // written (replacement is a single slot assignment), so poison is ignored.
    pub(crate) fn current_store(&self) -> RwLockReadGuard<'_, KeyStore> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn current_store_mut(&self) -> RwLockWriteGuard<'_, KeyStore> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn key_source_lock(&self) -> &RwLock<KeySourceMode> {
        &self.key_source
    }
}
