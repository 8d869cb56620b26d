//! Secret store facade: encrypt/decrypt and namespaced named secrets.
//!
//! Nothing here returns an error to the caller. `encrypt` degrades to an
//! explicitly tagged unprotected result, the read paths return `None`, and
//! the write paths return `false`. Specific causes are logged with their
//! `VaultError::code()`.

use std::sync::Arc;

use aura_core::config::{AuraConfig, SecretsConfig};
use aura_core::{Sealed, VaultResult};
use aura_crypto::Opened;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::device::DeviceKeyManager;
use crate::store::KeyValueStore;

pub struct SecretStore {
    store: Arc<dyn KeyValueStore>,
    keys: DeviceKeyManager,
    prefix: String,
    migrate_legacy: bool,
}

impl SecretStore {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &SecretsConfig) -> Self {
        Self {
            keys: DeviceKeyManager::from_config(store.clone(), config),
            store,
            prefix: config.prefix.clone(),
            migrate_legacy: config.migrate_legacy,
        }
    }

    /// Build the configured backend and wrap it.
    pub fn from_config(config: &AuraConfig) -> VaultResult<Self> {
        config.validate()?;
        Ok(Self::new(crate::open_store(&config.store), &config.secrets))
    }

    pub fn device_keys(&self) -> &DeviceKeyManager {
        &self.keys
    }

    /// True when values sealed now will not survive a restart
    pub fn is_key_ephemeral(&self) -> bool {
        self.keys.is_ephemeral()
    }

    fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Seal any serializable value.
    ///
    /// Falls back to `Sealed::Degraded` (plain base64 of the JSON) when the
    /// device key is unavailable or the value cannot be serialized.
    pub async fn encrypt<T: Serialize + ?Sized>(&self, data: &T) -> Sealed {
        let json = match serde_json::to_string(data) {
            Ok(json) => Zeroizing::new(json),
            Err(e) => {
                tracing::warn!(
                    code = "serialization_error",
                    error = %e,
                    "value not serializable; returning UNPROTECTED fallback"
                );
                return Sealed::Degraded(STANDARD.encode("null"));
            }
        };

        match self.seal_json(&json).await {
            Ok(envelope) => Sealed::Protected(envelope),
            Err(e) => {
                tracing::warn!(
                    code = e.code(),
                    error = %e,
                    "encryption failed; returning UNPROTECTED base64 fallback"
                );
                Sealed::Degraded(STANDARD.encode(json.as_bytes()))
            }
        }
    }

    /// Open an envelope produced by [`Self::encrypt`] (or a legacy one).
    ///
    /// Returns `None` for any failure: malformed envelope, tag mismatch,
    /// wrong key, or a payload that does not deserialize as `T`.
    pub async fn decrypt<T: DeserializeOwned>(&self, envelope: &str) -> Option<T> {
        match self.open_as::<T>(envelope).await {
            Ok((value, _)) => Some(value),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "decrypt failed");
                None
            }
        }
    }

    /// Seal and persist a string secret under `prefix + name`.
    pub async fn store_secret(&self, name: &str, value: &str) -> bool {
        self.store_object(name, value).await
    }

    pub async fn get_secret(&self, name: &str) -> Option<String> {
        self.get_object(name).await
    }

    pub async fn delete_secret(&self, name: &str) -> bool {
        match self.store.delete(&self.key_for(name)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, name, "secret delete failed");
                false
            }
        }
    }

    /// Seal and persist any serializable value.
    ///
    /// Nothing is written when the seal is degraded or the device key is
    /// ephemeral, so an existing stored value is never replaced by one that
    /// cannot be opened after restart.
    pub async fn store_object<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> bool {
        let envelope = match self.encrypt(value).await {
            Sealed::Protected(envelope) => envelope,
            Sealed::Degraded(_) => {
                tracing::warn!(name, "refusing to persist an unprotected secret");
                return false;
            }
        };
        if self.keys.is_ephemeral() {
            tracing::warn!(name, "refusing to persist a secret sealed under an ephemeral device key");
            return false;
        }

        match self.store.set(&self.key_for(name), &envelope).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, name, "secret write failed");
                false
            }
        }
    }

    /// Read and open a named value. Legacy envelopes are re-sealed in the
    /// current format after a successful read when migration is enabled.
    pub async fn get_object<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.key_for(name);
        let stored = match self.store.get(&key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, name, "secret read failed");
                return None;
            }
        };

        match self.open_as::<T>(&stored).await {
            Ok((value, opened)) => {
                if opened.legacy && self.migrate_legacy {
                    self.migrate(&key, &opened).await;
                }
                Some(value)
            }
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, name, "stored secret could not be opened");
                None
            }
        }
    }

    /// Presence check without decrypting
    pub async fn has_secret(&self, name: &str) -> bool {
        matches!(self.store.get(&self.key_for(name)).await, Ok(Some(_)))
    }

    /// Delete several named secrets. Every delete is attempted; true only if
    /// all of them succeeded. The device key is never touched.
    pub async fn clear_secrets(&self, names: &[&str]) -> bool {
        let mut all_ok = true;
        for name in names {
            all_ok &= self.delete_secret(name).await;
        }
        all_ok
    }

    async fn seal_json(&self, json: &str) -> VaultResult<String> {
        let secret = self.keys.get_or_create().await?;
        aura_crypto::seal(&secret, json)
    }

    async fn open_as<T: DeserializeOwned>(&self, envelope: &str) -> VaultResult<(T, Opened)> {
        let secret = self.keys.get_or_create().await?;
        let opened = aura_crypto::open(&secret, envelope)?;
        let value = serde_json::from_str(&opened.plaintext)?;
        Ok((value, opened))
    }

    async fn migrate(&self, key: &str, opened: &Opened) {
        if self.keys.is_ephemeral() {
            tracing::warn!(key, "skipping legacy migration under an ephemeral device key");
            return;
        }
        let result = match self.seal_json(&opened.plaintext).await {
            Ok(envelope) => self.store.set(key, &envelope).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::info!(key, "migrated legacy envelope to current format"),
            Err(e) => tracing::warn!(code = e.code(), error = %e, key, "legacy migration failed"),
        }
    }
}
