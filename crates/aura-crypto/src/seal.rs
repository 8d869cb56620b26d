//! Seal/open: the full envelope pipeline over a serialized plaintext

use aura_core::{VaultError, VaultResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::cipher;
use crate::envelope::{self, Decoded, Envelope, LegacyEnvelope};
use crate::integrity;
use crate::kdf::{derive_for_envelope, derive_key};
use crate::keys::{DeviceSecret, Iv, Salt};

/// Recovered plaintext and the format it came from
pub struct Opened {
    pub plaintext: Zeroizing<String>,
    /// True when read from a tag-less legacy envelope
    pub legacy: bool,
}

impl std::fmt::Debug for Opened {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opened")
            .field("plaintext", &"[REDACTED]")
            .field("legacy", &self.legacy)
            .finish()
    }
}

/// Encrypt a serialized plaintext under the device secret with a fresh IV and
/// salt, returning the envelope transport string.
pub fn seal(secret: &DeviceSecret, plaintext: &str) -> VaultResult<String> {
    let iv = Iv::generate().to_hex();
    let salt = Salt::generate().to_hex();
    let key = derive_key(secret, &iv, &salt);

    let ciphertext = cipher::forward(plaintext.as_bytes(), &key);
    let hmac = integrity::tag(plaintext, &key);

    envelope::encode(&Envelope {
        iv,
        salt,
        hmac,
        data: STANDARD.encode(ciphertext),
    })
}

/// Decrypt an envelope transport string.
///
/// Current envelopes fail closed with `Integrity` when the recomputed tag
/// does not match. Legacy envelopes carry no tag and are returned as-is.
pub fn open(secret: &DeviceSecret, transport: &str) -> VaultResult<Opened> {
    match envelope::decode(transport)? {
        Decoded::Current(env) => open_current(secret, &env),
        Decoded::Legacy(env) => open_legacy(secret, &env),
    }
}

fn open_current(secret: &DeviceSecret, env: &Envelope) -> VaultResult<Opened> {
    let key = derive_for_envelope(secret, &env.iv, &env.salt)?;
    let ciphertext = STANDARD
        .decode(&env.data)
        .map_err(|e| VaultError::Decode(format!("data: {e}")))?;

    // Garbage from a wrong key or flipped byte is usually not UTF-8; treat it
    // the same as a tag mismatch.
    let plaintext = String::from_utf8(cipher::reverse(&ciphertext, &key))
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Integrity)?;

    if !integrity::verify(&plaintext, &key, &env.hmac) {
        return Err(VaultError::Integrity);
    }

    Ok(Opened {
        plaintext,
        legacy: false,
    })
}

fn open_legacy(secret: &DeviceSecret, env: &LegacyEnvelope) -> VaultResult<Opened> {
    tracing::debug!("opening legacy envelope without integrity tag");

    // Legacy derivation had no salt and a single pass.
    let key = derive_key(secret, &env.iv, "");
    let mut bytes = STANDARD
        .decode(&env.data)
        .map_err(|e| VaultError::Decode(format!("legacy data: {e}")))?;
    cipher::apply_pass(&mut bytes, key.as_bytes(), 0);

    let plaintext = String::from_utf8(bytes)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Decode("legacy payload is not UTF-8".into()))?;

    Ok(Opened {
        plaintext,
        legacy: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::KeyOrigin;
    use proptest::prelude::*;
    use secrecy::SecretString;

    fn secret(value: &str) -> DeviceSecret {
        DeviceSecret::new(SecretString::from(value), KeyOrigin::Stored)
    }

    fn reencode(env: &Envelope) -> String {
        envelope::encode(env).unwrap()
    }

    fn parse(transport: &str) -> Envelope {
        match envelope::decode(transport).unwrap() {
            Decoded::Current(env) => env,
            other => panic!("expected current envelope, got {other:?}"),
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let s = secret("device-secret");
        let sealed = seal(&s, r#"{"apiKey":"abc123"}"#).unwrap();
        let opened = open(&s, &sealed).unwrap();

        assert_eq!(opened.plaintext.as_str(), r#"{"apiKey":"abc123"}"#);
        assert!(!opened.legacy);
    }

    #[test]
    fn test_seal_is_randomized() {
        let s = secret("device-secret");
        let a = seal(&s, "same").unwrap();
        let b = seal(&s, "same").unwrap();

        assert_ne!(a, b, "fresh IV/salt must give distinct envelopes");
        assert_eq!(open(&s, &a).unwrap().plaintext.as_str(), "same");
        assert_eq!(open(&s, &b).unwrap().plaintext.as_str(), "same");
    }

    #[test]
    fn test_envelope_field_sizes() {
        let env = parse(&seal(&secret("d"), "x").unwrap());
        assert_eq!(env.iv.len(), 64);
        assert_eq!(env.salt.len(), 32);
        assert_eq!(env.hmac.len(), 64);
    }

    #[test]
    fn test_flipped_ciphertext_byte_fails() {
        let s = secret("device-secret");
        let env = parse(&seal(&s, r#"{"apiKey":"abc123"}"#).unwrap());
        let ciphertext = STANDARD.decode(&env.data).unwrap();

        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            let forged = Envelope {
                data: STANDARD.encode(&tampered),
                ..env.clone()
            };
            assert!(
                matches!(open(&s, &reencode(&forged)), Err(VaultError::Integrity)),
                "flip at byte {i} must be detected"
            );
        }
    }

    #[test]
    fn test_swapped_tag_fails() {
        let s = secret("device-secret");
        let env_a = parse(&seal(&s, "alpha").unwrap());
        let env_b = parse(&seal(&s, "beta").unwrap());

        let forged = Envelope {
            hmac: env_b.hmac,
            ..env_a
        };
        assert!(matches!(open(&s, &reencode(&forged)), Err(VaultError::Integrity)));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = seal(&secret("one"), "payload").unwrap();
        assert!(matches!(
            open(&secret("two"), &sealed),
            Err(VaultError::Integrity)
        ));
    }

    #[test]
    fn test_malformed_iv_is_decode_error() {
        let s = secret("d");
        let env = parse(&seal(&s, "x").unwrap());
        let forged = Envelope {
            iv: "short".into(),
            ..env
        };
        assert!(matches!(open(&s, &reencode(&forged)), Err(VaultError::Decode(_))));
    }

    #[test]
    fn test_open_legacy() {
        let s = secret("device-secret");
        let iv = Iv::generate().to_hex();
        let key = derive_key(&s, &iv, "");
        let mut bytes = br#"{"apiKey":"old"}"#.to_vec();
        cipher::apply_pass(&mut bytes, key.as_bytes(), 0);
        let transport = STANDARD.encode(format!("{iv}:{}", STANDARD.encode(bytes)));

        let opened = open(&s, &transport).unwrap();
        assert!(opened.legacy);
        assert_eq!(opened.plaintext.as_str(), r#"{"apiKey":"old"}"#);
    }

    proptest! {
        #[test]
        fn seal_open_roundtrip_any_text(text in ".{0,256}") {
            let s = secret("prop-secret");
            let sealed = seal(&s, &text).unwrap();
            let opened = open(&s, &sealed).unwrap();
            prop_assert_eq!(opened.plaintext.as_str(), text.as_str());
        }
    }
}
