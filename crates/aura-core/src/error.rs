use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Failure kinds inside the vault core.
///
/// None of the variants carry key material; messages are safe to log.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("device key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("envelope decode error: {0}")]
    Decode(String),

    #[error("integrity check failed")]
    Integrity,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("secure store I/O error: {0}")]
    StoreIo(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Stable short code for telemetry, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::KeyUnavailable(_) => "key_unavailable",
            VaultError::Decode(_) => "decode_error",
            VaultError::Integrity => "integrity_failure",
            VaultError::Serialization(_) => "serialization_error",
            VaultError::StoreIo(_) => "store_io_error",
            VaultError::Config(_) => "config_error",
            VaultError::Io(_) => "io_error",
        }
    }
}
