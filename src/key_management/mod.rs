/*!
 * Key Management for the mock KMS
 *
 * This module holds the per-node key store, the startup loader that fills it
 * from the key directory, and the rotation API tests use to swap keys at runtime.
 */

pub mod loader;
pub mod rotation;
pub mod store;


pub use loader::load_key_store;
pub use loader::load_node_key_set;
pub use loader::KeyLayout;
pub use rotation::fingerprint;
pub use rotation::NodeKeyInfo;
pub use store::KeyPurpose;
pub use store::KeyRecord;
pub use store::KeyStore;
pub use store::NodeKeySet;
