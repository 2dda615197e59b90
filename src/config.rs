/*!
 * Service configuration
 *
 * Defaults describe the bundled fixture nodes. A JSON file and environment
 * variables can override any field.
 */

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{error_codes, KmsError, KmsResult};

pub const DEFAULT_PORT: u16 = 14000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_KEY_PATH: &str = "dev_key";

/// Nodes whose keys live directly under the key directory
pub const DEFAULT_NODE_IDS: &[&str] = &[
    "rp1", "rp2", "rp3", "idp1", "idp2", "idp3", "as1", "as2", "ndid1", "proxy1", "proxy2",
];

/// Nodes operating behind a proxy; their keys live under `behind_proxy/`
pub const DEFAULT_PROXY_NODE_IDS: &[&str] = &[
    "proxy1_rp4",
    "proxy1_idp4",
    "proxy1_as4",
    "proxy2_rp5",
    "proxy2_idp5",
    "proxy2_as5",
];

pub const ENV_PORT: &str = "KMS_PORT";
pub const ENV_BIND_ADDRESS: &str = "KMS_BIND_ADDRESS";
pub const ENV_KEY_PATH: &str = "KEY_PATH";
pub const ENV_NODE_IDS: &str = "KMS_NODE_IDS";
pub const ENV_PROXY_NODE_IDS: &str = "KMS_PROXY_NODE_IDS";

/// Mock KMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmsConfig {
    /// HTTP port; 0 picks an ephemeral port
    pub port: u16,

    /// Address the listener binds to
    pub bind_address: String,

    /// Base directory of the key file layout
    pub key_path: PathBuf,

    /// Directly reachable node ids
    pub node_ids: Vec<String>,

    /// Proxy-fronted node ids
    pub proxy_node_ids: Vec<String>,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
            node_ids: DEFAULT_NODE_IDS.iter().map(|id| id.to_string()).collect(),
            proxy_node_ids: DEFAULT_PROXY_NODE_IDS.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl KmsConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> KmsResult<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Read a JSON config file; absent fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> KmsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            KmsError::config_error(
                "config_file",
                &format!("Failed to read {}: {}", path.display(), e),
                error_codes::INVALID_CONFIG_VALUE,
            )
        })?;
        let config: KmsConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> KmsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| {
                KmsError::config_error(
                    ENV_PORT,
                    &format!("'{}' is not a valid port", port),
                    error_codes::INVALID_CONFIG_VALUE,
                )
            })?;
        }
        if let Some(address) = lookup(ENV_BIND_ADDRESS) {
            self.bind_address = address.trim().to_string();
        }
        if let Some(path) = lookup(ENV_KEY_PATH) {
            self.key_path = PathBuf::from(path.trim());
        }
        if let Some(ids) = lookup(ENV_NODE_IDS) {
            self.node_ids = split_list(&ids);
        }
        if let Some(ids) = lookup(ENV_PROXY_NODE_IDS) {
            self.proxy_node_ids = split_list(&ids);
        }
        Ok(self)
    }

    /// Reject configurations the loader could never serve
    pub fn validate(&self) -> KmsResult<()> {
        if self.node_ids.is_empty() && self.proxy_node_ids.is_empty() {
            return Err(KmsError::config_error(
                "node_ids",
                "At least one node id is required",
                error_codes::EMPTY_NODE_LIST,
            ));
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> KmsResult<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                KmsError::config_error(
                    "bind_address",
                    &format!("'{}' is not a valid address: {}", self.bind_address, e),
                    error_codes::INVALID_CONFIG_VALUE,
                )
            })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
