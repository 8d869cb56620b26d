//! Key material: the device secret and the per-operation IV and salt

use aura_core::KeyOrigin;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::kdf::sha256_hex;
use crate::{IV_SIZE, SALT_SIZE};

/// The long-lived per-installation secret.
///
/// Holds the exact string found in (or written to) the secure store. No shape
/// validation is applied to stored values.
pub struct DeviceSecret {
    value: SecretString,
    origin: KeyOrigin,
}

impl DeviceSecret {
    pub fn new(value: SecretString, origin: KeyOrigin) -> Self {
        Self { value, origin }
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    pub fn expose_secret(&self) -> &str {
        self.value.expose_secret()
    }
}

impl Clone for DeviceSecret {
    fn clone(&self) -> Self {
        Self {
            value: SecretString::from(self.value.expose_secret().to_owned()),
            origin: self.origin,
        }
    }
}

impl std::fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSecret")
            .field("value", &"[REDACTED]")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Generate fresh device-secret material.
///
/// Two independent 32-byte samples and a millisecond timestamp are
/// concatenated as text and hashed once; the hex digest is the secret.
pub fn generate_device_secret() -> SecretString {
    let mut a = [0u8; 32];
    let mut b = [0u8; 32];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut a);
    rng.fill_bytes(&mut b);

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let mut material = format!("{}{}{}", hex::encode(a), hex::encode(b), timestamp);
    let digest = sha256_hex(material.as_bytes());

    material.zeroize();
    a.zeroize();
    b.zeroize();

    SecretString::from(digest)
}

/// Per-operation salt, never reused
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Per-operation IV; keeps identical plaintexts from producing identical envelopes
#[derive(Clone, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DIGEST_HEX_LEN;

    #[test]
    fn test_device_secret_shape() {
        let secret = generate_device_secret();
        let value = secret.expose_secret();

        assert_eq!(value.len(), DIGEST_HEX_LEN);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_device_secrets_differ() {
        let s1 = generate_device_secret();
        let s2 = generate_device_secret();
        assert_ne!(s1.expose_secret(), s2.expose_secret(), "random secrets must differ");
    }

    #[test]
    fn test_iv_and_salt_sizes() {
        assert_eq!(Iv::generate().to_hex().len(), IV_SIZE * 2);
        assert_eq!(Salt::generate().to_hex().len(), SALT_SIZE * 2);
    }

    #[test]
    fn test_iv_and_salt_fresh_each_call() {
        assert!(Iv::generate() != Iv::generate());
        assert!(Salt::generate() != Salt::generate());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = DeviceSecret::new(SecretString::from("super-secret-value"), KeyOrigin::Stored);
        let rendered = format!("{secret:?}");

        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_clone_keeps_value_and_origin() {
        let secret = DeviceSecret::new(SecretString::from("abc"), KeyOrigin::Created);
        let copy = secret.clone();

        assert_eq!(copy.expose_secret(), "abc");
        assert_eq!(copy.origin(), KeyOrigin::Created);
    }
}
