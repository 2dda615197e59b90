/*!
 * Mock Key Management Service
 *
 * This crate stands in for the key custodians of identity-platform nodes during
 * end-to-end tests. Every node (relying parties, identity providers, authoritative
 * sources, proxies and the nodes behind them) owns three keys:
 *
 * - a signing key used by `POST /kms/sign`
 * - a signing master key used by `POST /kms/master/sign`
 * - an encryption key used by `POST /kms/decrypt`
 *
 * Keys are loaded once from a directory tree at startup. Tests may rotate any
 * of them at runtime and flip between the original and rotated key sets
 * without restarting the service.
 */

/// Signing and encryption algorithm descriptors
pub mod algorithm;

/// Service configuration
pub mod config;

/// Key decoding and the crypto operation dispatcher
pub mod dispatcher;

/// Common error types for the mock KMS
pub mod error;

/// Observability event channel
pub mod events;

/// Key store, loader and rotation API
pub mod key_management;

/// Key source selector
pub mod key_source;

/// The service object shared by the HTTP layer and tests
pub mod kms;

/// HTTP endpoints and server lifecycle
pub mod server;

#[cfg(test)]
mod test_fixtures;

// Re-export main types for convenience
pub use algorithm::{EncryptionAlgorithm, KeyAlgorithm, OperationAlgorithm, SigningAlgorithm};
pub use config::KmsConfig;
pub use error::{KmsError, KmsResult};
pub use events::{KmsEvent, KmsEventKind, KmsEvents, ListenerId};
pub use key_management::{KeyPurpose, KeyRecord, KeyStore, NodeKeyInfo};
pub use key_source::KeySourceMode;
pub use kms::MockKms;
pub use server::KmsServer;

/// Start the mock KMS with the given configuration.
///
/// Shorthand for [`KmsServer::start`]. The returned server keeps answering
/// until [`stop`] is called on it.
pub async fn start(config: &KmsConfig) -> KmsResult<KmsServer> {
    KmsServer::start(config).await
}

/// Stop a server returned by [`start`] and wait for it to drain.
pub async fn stop(server: KmsServer) -> KmsResult<()> {
    server.stop().await
}

/// The types a test harness usually needs
pub mod prelude {
    pub use crate::start;
    pub use crate::stop;
    pub use crate::EncryptionAlgorithm;
    pub use crate::KeyAlgorithm;
    pub use crate::KeyPurpose;
    pub use crate::KeySourceMode;
    pub use crate::KmsConfig;
    pub use crate::KmsError;
    pub use crate::KmsEvent;
    pub use crate::KmsEventKind;
    pub use crate::KmsEvents;
    pub use crate::KmsResult;
    pub use crate::KmsServer;
    pub use crate::MockKms;
    pub use crate::NodeKeyInfo;
    pub use crate::SigningAlgorithm;
}
