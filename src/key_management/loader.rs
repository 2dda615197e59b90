// Key material loader: reads each node's three key files at startup

use std::fs;
use std::path::{Path, PathBuf};

use super::store::{KeyRecord, KeyStore, NodeKeySet};
use crate::algorithm::{EncryptionAlgorithm, SigningAlgorithm};
use crate::config::KmsConfig;
use crate::error::{KmsError, KmsResult};

const SIGNING_KEY_DIR: &str = "keys";
const MASTER_KEY_DIR: &str = "master_keys";
const ENCRYPTION_KEY_DIR: &str = "encryption_keys";
const BEHIND_PROXY_DIR: &str = "behind_proxy";
const MASTER_KEY_SUFFIX: &str = "_master";

/// On-disk key file layout.
///
/// For node `n` under base `B`: `B/keys/n`, `B/master_keys/n_master` and
/// `B/encryption_keys/n`. Proxy-fronted nodes use the same layout under
/// `B/behind_proxy/`.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    base: PathBuf,
}

impl KeyLayout {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    fn root(&self, behind_proxy: bool) -> PathBuf {
        if behind_proxy {
            self.base.join(BEHIND_PROXY_DIR)
        } else {
            self.base.clone()
        }
    }

    pub fn signing_key_path(&self, node_id: &str, behind_proxy: bool) -> PathBuf {
        self.root(behind_proxy).join(SIGNING_KEY_DIR).join(node_id)
    }

    pub fn signing_master_key_path(&self, node_id: &str, behind_proxy: bool) -> PathBuf {
        self.root(behind_proxy)
            .join(MASTER_KEY_DIR)
            .join(format!("{}{}", node_id, MASTER_KEY_SUFFIX))
    }

    pub fn encryption_key_path(&self, node_id: &str, behind_proxy: bool) -> PathBuf {
        self.root(behind_proxy).join(ENCRYPTION_KEY_DIR).join(node_id)
    }
}

/// Load every configured node's keys with the default descriptors.
///
/// Any missing or unreadable file aborts the load: the node list is fixture
/// data, so a gap means a broken checkout rather than bad input.
pub fn load_key_store(config: &KmsConfig) -> KmsResult<KeyStore> {
    let layout = KeyLayout::new(&config.key_path);
    let mut store = KeyStore::new();

    let nodes = config
        .node_ids
        .iter()
        .map(|id| (id, false))
        .chain(config.proxy_node_ids.iter().map(|id| (id, true)));

    for (node_id, behind_proxy) in nodes {
        let key_set = load_node_key_set(&layout, node_id, behind_proxy)?;
        if store.insert(node_id.as_str(), key_set).is_some() {
            log::warn!("Node '{}' listed more than once; later entry wins", node_id);
        }
        log::debug!("Loaded keys for node '{}' (behind proxy: {})", node_id, behind_proxy);
    }

    log::info!(
        "Loaded key material for {} nodes from {}",
        store.len(),
        config.key_path.display()
    );
    Ok(store)
}

/// Read one node's signing, master and encryption keys.
pub fn load_node_key_set(layout: &KeyLayout, node_id: &str, behind_proxy: bool) -> KmsResult<NodeKeySet> {
    let signing = read_key_file(&layout.signing_key_path(node_id, behind_proxy))?;
    let master = read_key_file(&layout.signing_master_key_path(node_id, behind_proxy))?;
    let encryption = read_key_file(&layout.encryption_key_path(node_id, behind_proxy))?;

    Ok(NodeKeySet::new(
        KeyRecord::signing(signing, SigningAlgorithm::default()),
        KeyRecord::signing(master, SigningAlgorithm::default()),
        KeyRecord::encryption(encryption, EncryptionAlgorithm::default()),
    ))
}

fn read_key_file(path: &Path) -> KmsResult<String> {
    fs::read_to_string(path)
        .map_err(|e| KmsError::key_load_error(&path.display().to_string(), &e.to_string()))
}
