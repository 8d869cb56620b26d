//! Secure key-value store contract and the in-memory backend

use std::collections::HashMap;

use async_trait::async_trait;
use aura_core::VaultResult;
use tokio::sync::RwLock;

/// Minimal contract over the platform secure store.
///
/// Values are opaque strings. Implementations report every backend failure
/// as `VaultError::StoreIo`; a missing key is `Ok(None)`, and deleting a
/// missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> VaultResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> VaultResult<()>;

    async fn delete(&self, key: &str) -> VaultResult<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Keys currently held, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
