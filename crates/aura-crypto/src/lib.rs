//! aura-crypto: local encryption envelope for secrets at rest
//!
//! Pipeline (seal):
//! ```text
//! device secret ─┐
//! random IV ─────┼─ iterated SHA-256 (1000 rounds) ─ derived key
//! random salt ───┘                                      │
//! plaintext ─ 3-pass XOR transform ─ base64 ────────────┤─ data
//! plaintext ‖ derived key ─ SHA-256 ────────────────────┘─ hmac
//! {iv, salt, hmac, data} ─ JSON ─ base64 ─ envelope
//! ```
//!
//! Opening recomputes the derived key from the envelope's IV and salt,
//! reverses the transform and fails closed on a tag mismatch. The tag-less
//! legacy shape `base64("<ivHex>:<cipherBase64>")` is still readable.
//!
//! The constructions here are kept bit-compatible with envelopes already on
//! devices. They are not a vetted AEAD; confidentiality rests on the device
//! secret staying inside the platform secure store.

pub mod cipher;
pub mod envelope;
pub mod integrity;
pub mod kdf;
pub mod keys;
pub mod seal;

pub use envelope::{decode, encode, Decoded, Envelope, LegacyEnvelope};
pub use kdf::{derive_key, DerivedKey, KDF_ROUNDS};
pub use keys::{generate_device_secret, DeviceSecret, Iv, Salt};
pub use seal::{open, seal, Opened};

/// Size of the per-operation salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of the per-operation IV in bytes
pub const IV_SIZE: usize = 32;

/// Length of a lowercase hex SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;
