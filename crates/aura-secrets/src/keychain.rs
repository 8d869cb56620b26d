//! Platform keychain backend.
//!
//! Uses the `keyring` crate for cross-platform access:
//! - macOS/iOS: Keychain Services
//! - Linux: GNOME Keyring / Secret Service (D-Bus)
//! - Windows: Credential Manager (DPAPI)
//!
//! Keyring calls block, so each one runs on the blocking pool.

use async_trait::async_trait;
use aura_core::{VaultError, VaultResult};
use zeroize::Zeroize;

use crate::store::KeyValueStore;

pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    /// Check if the platform keychain can create entries for this service.
    pub fn is_available(&self) -> bool {
        keyring::Entry::new(&self.service, "__aura_probe__").is_ok()
    }

    async fn run<T, F>(&self, key: &str, op: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&str, &str) -> VaultResult<T> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || op(&service, &key))
            .await
            .map_err(|e| VaultError::StoreIo(format!("keychain task: {e}")))?
    }
}

fn entry(service: &str, key: &str) -> VaultResult<keyring::Entry> {
    keyring::Entry::new(service, key)
        .map_err(|e| VaultError::StoreIo(format!("keychain entry creation: {e}")))
}

fn keychain_get(service: &str, key: &str) -> VaultResult<Option<String>> {
    match entry(service, key)?.get_password() {
        Ok(mut password) => {
            let value = password.clone();
            password.zeroize();
            Ok(Some(value))
        }
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(VaultError::StoreIo(format!("keychain get for '{key}': {e}"))),
    }
}

fn keychain_set(service: &str, key: &str, value: &str) -> VaultResult<()> {
    entry(service, key)?
        .set_password(value)
        .map_err(|e| VaultError::StoreIo(format!("keychain store for '{key}': {e}")))?;
    tracing::debug!(key, "stored entry in platform keychain");
    Ok(())
}

fn keychain_delete(service: &str, key: &str) -> VaultResult<()> {
    match entry(service, key)?.delete_credential() {
        Ok(()) => {
            tracing::debug!(key, "deleted entry from platform keychain");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => Ok(()), // already deleted
        Err(e) => Err(VaultError::StoreIo(format!("keychain delete for '{key}': {e}"))),
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> VaultResult<Option<String>> {
        self.run(key, keychain_get).await
    }

    async fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        let mut value = value.to_string();
        self.run(key, move |service, key| {
            let result = keychain_set(service, key, &value);
            value.zeroize();
            result
        })
        .await
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        self.run(key, keychain_delete).await
    }
}
