pub mod config;
pub mod error;
pub mod types;

pub use config::AuraConfig;
pub use error::{VaultError, VaultResult};
pub use types::{KeyOrigin, Sealed};
