//! Device key lifecycle: read-or-create of the single device secret.
//!
//! The secret lives under one reserved slot in the key-value store. The first
//! caller that finds the slot empty generates and writes it; concurrent first
//! callers wait on the same initialization and receive the same secret.

use std::sync::Arc;

use aura_core::config::SecretsConfig;
use aura_core::{KeyOrigin, VaultError, VaultResult};
use aura_crypto::{generate_device_secret, DeviceSecret};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;

use crate::store::KeyValueStore;

pub struct DeviceKeyManager {
    store: Arc<dyn KeyValueStore>,
    slot: String,
    allow_ephemeral: bool,
    secret: OnceCell<DeviceSecret>,
}

impl DeviceKeyManager {
    pub fn new(store: Arc<dyn KeyValueStore>, slot: &str, allow_ephemeral: bool) -> Self {
        Self {
            store,
            slot: slot.to_string(),
            allow_ephemeral,
            secret: OnceCell::new(),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &SecretsConfig) -> Self {
        Self::new(
            store,
            &config.device_key_slot,
            config.allow_ephemeral_fallback,
        )
    }

    /// Return the device secret, creating and persisting it on first use.
    ///
    /// A stored value is returned verbatim. When the store cannot be read or
    /// written, an unpersisted secret is used for the rest of this manager's
    /// life if the ephemeral fallback is enabled (see [`Self::is_ephemeral`]);
    /// otherwise `KeyUnavailable` is returned and the next call retries.
    pub async fn get_or_create(&self) -> VaultResult<DeviceSecret> {
        self.secret
            .get_or_try_init(|| self.load_or_create())
            .await
            .cloned()
    }

    /// Origin of the loaded secret, if one has been loaded
    pub fn origin(&self) -> Option<KeyOrigin> {
        self.secret.get().map(DeviceSecret::origin)
    }

    /// True when the secret in use was never persisted
    pub fn is_ephemeral(&self) -> bool {
        self.origin() == Some(KeyOrigin::Ephemeral)
    }

    async fn load_or_create(&self) -> VaultResult<DeviceSecret> {
        match self.read_or_write().await {
            Ok(secret) => Ok(secret),
            Err(e) if self.allow_ephemeral => {
                tracing::warn!(
                    code = e.code(),
                    error = %e,
                    slot = %self.slot,
                    "secure store unusable; using an ephemeral device key. \
                     Data sealed in this process will not decrypt after restart"
                );
                Ok(DeviceSecret::new(
                    generate_device_secret(),
                    KeyOrigin::Ephemeral,
                ))
            }
            Err(e) => Err(VaultError::KeyUnavailable(e.to_string())),
        }
    }

    async fn read_or_write(&self) -> VaultResult<DeviceSecret> {
        if let Some(existing) = self.store.get(&self.slot).await? {
            tracing::debug!(slot = %self.slot, "loaded device key");
            return Ok(DeviceSecret::new(
                SecretString::from(existing),
                KeyOrigin::Stored,
            ));
        }

        let fresh = generate_device_secret();
        self.store.set(&self.slot, fresh.expose_secret()).await?;
        tracing::info!(slot = %self.slot, "created device key");
        Ok(DeviceSecret::new(fresh, KeyOrigin::Created))
    }
}
