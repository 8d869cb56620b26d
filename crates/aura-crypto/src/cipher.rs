//! Multi-pass position-dependent XOR transform
//!
//! Each pass maps byte `i` to `b ^ key[(i + pass * 7) % key.len()] ^ (i % 256)`.
//! Forward runs passes 0, 1, 2; reverse runs 2, 1, 0. Every pass is its own
//! inverse, so reverse undoes forward exactly.
//!
//! This provides no integrity. A wrong key produces garbage rather than an
//! error; tamper detection belongs to [`crate::integrity`].

use crate::kdf::DerivedKey;

/// Number of passes in the current format
pub const PASSES: usize = 3;

/// Key-index rotation applied per pass
const PASS_ROTATION: usize = 7;

/// Apply a single pass in place.
///
/// Exposed for the single-pass legacy format. An empty key leaves the data
/// untouched.
pub fn apply_pass(data: &mut [u8], key: &[u8], pass: usize) {
    if key.is_empty() {
        return;
    }
    let offset = pass * PASS_ROTATION;
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[(i + offset) % key.len()] ^ (i % 256) as u8;
    }
}

/// Encrypt: passes 0, 1, 2.
pub fn forward(plaintext: &[u8], key: &DerivedKey) -> Vec<u8> {
    let mut out = plaintext.to_vec();
    for pass in 0..PASSES {
        apply_pass(&mut out, key.as_bytes(), pass);
    }
    out
}

/// Decrypt: passes 2, 1, 0.
pub fn reverse(ciphertext: &[u8], key: &DerivedKey) -> Vec<u8> {
    let mut out = ciphertext.to_vec();
    for pass in (0..PASSES).rev() {
        apply_pass(&mut out, key.as_bytes(), pass);
    }
    out
}
