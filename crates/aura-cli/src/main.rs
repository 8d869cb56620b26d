//! aura-vault: seal and manage device-bound secrets
//!
//! Commands:
//!   encrypt <json>                 - seal a JSON value, print the envelope
//!   decrypt <envelope>             - open an envelope, print the JSON value
//!   secret set|get|delete|exists   - named secrets in the configured store
//!   device status                  - where the device key came from
//!   config show                    - display current configuration
//!
//! Data goes to stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use aura_core::config::{expand_tilde, StoreBackend};
use aura_core::{AuraConfig, Sealed};
use aura_secrets::{KeychainStore, SecretStore};
use serde_json::Value;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "aura-vault",
    version,
    about = "Device-bound secret vault",
    long_about = "aura-vault: seal credentials under a per-device key and keep them in a secure store"
)]
struct Cli {
    /// Path to aura.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "AURA_CONFIG",
        default_value = "~/.config/aura/aura.toml"
    )]
    config: PathBuf,

    /// Log level or filter directive (overrides [log].level)
    #[arg(long, env = "AURA_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a JSON value under the device key
    Encrypt {
        /// JSON document, e.g. '{"apiKey":"abc123"}'
        json: String,
    },

    /// Open an envelope produced by `encrypt`
    Decrypt {
        /// Base64 envelope
        envelope: String,
    },

    /// Named secret management
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Device key inspection
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    /// Seal and store a secret (prompts when no value is given)
    Set {
        name: String,
        value: Option<String>,
    },
    /// Print a stored secret
    Get { name: String },
    /// Remove a stored secret
    Delete { name: String },
    /// Check whether a secret is stored, without decrypting it
    Exists { name: String },
}

#[derive(Subcommand, Debug)]
enum DeviceAction {
    /// Show the store backend and the origin of the device key (never the key)
    Status,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config);
    let loaded = load_config(&config_path)?;
    let config = loaded.clone().unwrap_or_default();

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    init_logging(level, &config.log.format);
    if loaded.is_none() {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            config_path.display()
        );
    }
    config.validate()?;

    match cli.command {
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config_path, &config),
        Commands::Encrypt { json } => cmd_encrypt(&config, &json).await,
        Commands::Decrypt { envelope } => cmd_decrypt(&config, &envelope).await,
        Commands::Secret { action } => cmd_secret(&config, action).await,
        Commands::Device {
            action: DeviceAction::Status,
        } => cmd_device_status(&config).await,
    }
}

fn load_config(path: &Path) -> Result<Option<AuraConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    AuraConfig::load(path)
        .map(Some)
        .with_context(|| format!("loading config {}", path.display()))
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────────────────

fn cmd_config_show(path: &Path, config: &AuraConfig) -> Result<()> {
    println!("# config: {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("serializing config")?
    );
    Ok(())
}

async fn cmd_encrypt(config: &AuraConfig, json: &str) -> Result<()> {
    let value: Value = serde_json::from_str(json).context("input is not valid JSON")?;
    let vault = SecretStore::from_config(config)?;

    match vault.encrypt(&value).await {
        Sealed::Protected(envelope) => {
            if vault.is_key_ephemeral() {
                eprintln!("warning: device key is ephemeral; this envelope will not open after exit");
            }
            println!("{envelope}");
            Ok(())
        }
        Sealed::Degraded(_) => {
            bail!("device key unavailable; refusing to print an unprotected value")
        }
    }
}

async fn cmd_decrypt(config: &AuraConfig, envelope: &str) -> Result<()> {
    let vault = SecretStore::from_config(config)?;
    match vault.decrypt::<Value>(envelope.trim()).await {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("credential needs to be re-entered"),
    }
}

async fn cmd_secret(config: &AuraConfig, action: SecretAction) -> Result<()> {
    let vault = SecretStore::from_config(config)?;

    match action {
        SecretAction::Set { name, value } => {
            let value = match value {
                Some(v) => v,
                None => rpassword::prompt_password(format!("value for '{name}': "))
                    .context("reading secret value")?,
            };
            if !vault.store_secret(&name, &value).await {
                if vault.is_key_ephemeral() {
                    bail!("secure store unusable; '{name}' was not stored");
                }
                bail!("failed to store secret '{name}'");
            }
            eprintln!("stored '{name}'");
        }
        SecretAction::Get { name } => match vault.get_secret(&name).await {
            Some(value) => println!("{value}"),
            None if vault.has_secret(&name).await => {
                bail!("'{name}': credential needs to be re-entered")
            }
            None => bail!("no secret named '{name}'"),
        },
        SecretAction::Delete { name } => {
            if !vault.delete_secret(&name).await {
                bail!("failed to delete secret '{name}'");
            }
            eprintln!("deleted '{name}'");
        }
        SecretAction::Exists { name } => {
            let present = vault.has_secret(&name).await;
            println!("{present}");
            if !present {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

async fn cmd_device_status(config: &AuraConfig) -> Result<()> {
    let backend = match config.store.backend {
        StoreBackend::File => format!("file ({})", expand_tilde(&config.store.path).display()),
        StoreBackend::Keychain => {
            let available = KeychainStore::new(&config.store.service).is_available();
            format!(
                "keychain (service '{}', {})",
                config.store.service,
                if available { "available" } else { "unavailable" }
            )
        }
        StoreBackend::Memory => "memory".to_string(),
    };
    println!("store:      {backend}");
    println!("key slot:   {}", config.secrets.device_key_slot);

    let vault = SecretStore::from_config(config)?;
    match vault.device_keys().get_or_create().await {
        Ok(secret) => {
            let origin = secret.origin();
            println!("key origin: {origin}");
            if !origin.is_persistent() {
                println!("            data sealed now will not decrypt after exit");
            }
        }
        Err(e) => println!("key origin: unavailable ({e})"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_secret_set_without_value() {
        let cli = Cli::try_parse_from(["aura-vault", "secret", "set", "binance"]).unwrap();
        match cli.command {
            Commands::Secret {
                action: SecretAction::Set { name, value },
            } => {
                assert_eq!(name, "binance");
                assert_eq!(value, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aura.toml");
        std::fs::write(&path, "[secrets]\nprefix = \"\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
