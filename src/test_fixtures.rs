// Shared fixture access for unit tests

use std::path::PathBuf;

use crate::config::KmsConfig;

pub(crate) fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Contents of a file under tests/fixtures
pub(crate) fn fixture(name: &str) -> String {
    std::fs::read_to_string(manifest_path("tests/fixtures").join(name))
        .unwrap_or_else(|e| panic!("missing fixture {}: {}", name, e))
}

/// Contents of a file under the bundled dev_key directory
pub(crate) fn dev_key(relative: &str) -> String {
    std::fs::read_to_string(manifest_path("dev_key").join(relative))
        .unwrap_or_else(|e| panic!("missing dev key {}: {}", relative, e))
}

/// Config pointing at dev_key with a small node list
pub(crate) fn small_config() -> KmsConfig {
    KmsConfig {
        key_path: manifest_path("dev_key"),
        node_ids: vec!["rp1".to_string(), "idp1".to_string(), "as1".to_string()],
        proxy_node_ids: vec!["proxy1_rp4".to_string()],
        port: 0,
        bind_address: "127.0.0.1".to_string(),
    }
}
