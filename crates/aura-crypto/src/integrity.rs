//! Integrity tag: SHA-256 over `plaintext ‖ derived key`
//!
//! This is hash-then-compare, not HMAC. It is kept for compatibility with
//! existing envelopes; moving to a keyed MAC needs a new envelope version.

use subtle::ConstantTimeEq;

use crate::kdf::{sha256_hex, DerivedKey};

/// Compute the tag for a plaintext under a derived key.
pub fn tag(plaintext: &str, key: &DerivedKey) -> String {
    let mut input = Vec::with_capacity(plaintext.len() + key.as_bytes().len());
    input.extend_from_slice(plaintext.as_bytes());
    input.extend_from_slice(key.as_bytes());
    let digest = sha256_hex(&input);
    zeroize::Zeroize::zeroize(&mut input);
    digest
}

/// Recompute and compare in constant time over the full length.
pub fn verify(plaintext: &str, key: &DerivedKey, expected: &str) -> bool {
    let computed = tag(plaintext, key);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}
