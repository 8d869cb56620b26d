//! aura-secrets: named secrets sealed under a device-bound key
//!
//! Layers, bottom up:
//!   1. `KeyValueStore`  - async get/set/delete of opaque strings
//!      (memory, JSON file, platform keychain)
//!   2. `DeviceKeyManager` - single-flight read-or-create of the device secret
//!   3. `SecretStore`    - encrypt/decrypt + namespaced store/get/delete

pub mod device;
pub mod facade;
pub mod file;
pub mod keychain;
pub mod store;

pub use device::DeviceKeyManager;
pub use facade::SecretStore;
pub use file::FileStore;
pub use keychain::KeychainStore;
pub use store::{KeyValueStore, MemoryStore};

use std::sync::Arc;

use aura_core::config::{expand_tilde, StoreBackend, StoreConfig};

/// Build the configured key-value store backend.
pub fn open_store(config: &StoreConfig) -> Arc<dyn KeyValueStore> {
    match config.backend {
        StoreBackend::File => Arc::new(FileStore::new(expand_tilde(&config.path))),
        StoreBackend::Keychain => Arc::new(KeychainStore::new(&config.service)),
        StoreBackend::Memory => Arc::new(MemoryStore::default()),
    }
}
