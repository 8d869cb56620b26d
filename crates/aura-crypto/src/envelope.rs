//! Envelope wire format
//!
//! Current (v2):
//! ```text
//! base64( {"iv": <64 hex>, "salt": <32 hex>, "hmac": <64 hex>, "data": <base64 ciphertext>} )
//! ```
//!
//! Legacy (decode only, no integrity tag):
//! ```text
//! base64( "<hex iv>:<base64 ciphertext>" )
//! ```

use aura_core::{VaultError, VaultResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Current-format envelope. All four fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub iv: String,
    pub salt: String,
    pub hmac: String,
    pub data: String,
}

/// Older two-field shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEnvelope {
    pub iv: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Current(Envelope),
    Legacy(LegacyEnvelope),
}

/// Serialize an envelope to its transport string.
pub fn encode(envelope: &Envelope) -> VaultResult<String> {
    let json = serde_json::to_vec(envelope)?;
    Ok(STANDARD.encode(json))
}

/// Parse a transport string.
///
/// The structured record is tried first; the legacy `iv:data` split is only
/// attempted when that fails.
pub fn decode(transport: &str) -> VaultResult<Decoded> {
    let raw = STANDARD
        .decode(transport.trim())
        .map_err(|e| VaultError::Decode(format!("base64: {e}")))?;

    match serde_json::from_slice::<Envelope>(&raw) {
        Ok(envelope) => Ok(Decoded::Current(envelope)),
        Err(structured_err) => match parse_legacy(&raw) {
            Some(legacy) => Ok(Decoded::Legacy(legacy)),
            None => Err(VaultError::Decode(format!(
                "neither envelope nor legacy shape: {structured_err}"
            ))),
        },
    }
}

fn parse_legacy(raw: &[u8]) -> Option<LegacyEnvelope> {
    let text = std::str::from_utf8(raw).ok()?;
    let (iv, data) = text.split_once(':')?;

    if data.is_empty() || data.contains(':') {
        return None;
    }
    // Any hex IV is accepted; the hex check alone rules out JSON text.
    if iv.is_empty() || !iv.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(LegacyEnvelope {
        iv: iv.to_string(),
        data: data.to_string(),
    })
}
