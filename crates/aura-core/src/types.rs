use serde::{Deserialize, Serialize};

/// Where the device secret in use came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrigin {
    /// Read back from the secure store
    Stored,
    /// Generated on this call and written to the secure store
    Created,
    /// Generated in memory only; the secure store was unusable.
    /// Anything sealed under it is lost when the process exits.
    Ephemeral,
}

impl KeyOrigin {
    pub fn is_persistent(self) -> bool {
        !matches!(self, KeyOrigin::Ephemeral)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyOrigin::Stored => "stored",
            KeyOrigin::Created => "created",
            KeyOrigin::Ephemeral => "ephemeral",
        }
    }
}

impl std::fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of sealing a payload.
///
/// `Degraded` carries plain base64 of the serialized payload and offers no
/// confidentiality; callers handling secrets should refuse to persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sealed {
    Protected(String),
    Degraded(String),
}

impl Sealed {
    pub fn is_protected(&self) -> bool {
        matches!(self, Sealed::Protected(_))
    }

    /// The transport string regardless of protection level
    pub fn as_str(&self) -> &str {
        match self {
            Sealed::Protected(s) | Sealed::Degraded(s) => s,
        }
    }

    pub fn into_protected(self) -> Option<String> {
        match self {
            Sealed::Protected(s) => Some(s),
            Sealed::Degraded(_) => None,
        }
    }
}
