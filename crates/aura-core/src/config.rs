use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Top-level configuration (loaded from aura.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    pub store: StoreConfig,
    pub secrets: SecretsConfig,
    pub log: LogConfig,
}

/// Which secure key-value store backs the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Single JSON map file, written atomically
    File,
    /// Platform keychain via the `keyring` crate
    Keychain,
    /// Process memory only (tests, dry runs)
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind (default: file)
    pub backend: StoreBackend,
    /// JSON store path for the file backend
    pub path: PathBuf,
    /// Keychain service name for the keychain backend
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Prefix joined to every caller-supplied secret name
    pub prefix: String,
    /// Reserved slot holding the device secret
    pub device_key_slot: String,
    /// Use an unpersisted in-memory device secret when the store is unusable
    pub allow_ephemeral_fallback: bool,
    /// Re-seal legacy envelopes in the current format when they are read
    pub migrate_legacy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level or EnvFilter directive (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::from("~/.local/share/aura/secrets.json"),
            service: "aura".into(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            prefix: "aura_secret_".into(),
            device_key_slot: "aura_device_key".into(),
            allow_ephemeral_fallback: true,
            migrate_legacy: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl AuraConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> VaultResult<Self> {
        let config: AuraConfig =
            toml::from_str(content).map_err(|e| VaultError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> VaultResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))
    }

    /// Reject settings that would let a caller-supplied name address the
    /// device-key slot.
    pub fn validate(&self) -> VaultResult<()> {
        let secrets = &self.secrets;
        if secrets.prefix.is_empty() {
            return Err(VaultError::Config("secrets.prefix must not be empty".into()));
        }
        if secrets.device_key_slot.is_empty() {
            return Err(VaultError::Config(
                "secrets.device_key_slot must not be empty".into(),
            ));
        }
        if secrets.device_key_slot.starts_with(&secrets.prefix) {
            return Err(VaultError::Config(format!(
                "secrets.device_key_slot '{}' falls inside the secret namespace '{}'",
                secrets.device_key_slot, secrets.prefix
            )));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(VaultError::Config(format!(
                "log.format must be \"json\" or \"text\", got \"{other}\""
            ))),
        }
    }
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        return home.join(rest);
    }
    path.to_path_buf()
}
