use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::Record;

/// Entity tag as sent in `ETag`, `If-Match` and `If-None-Match`.
///
/// Always held in its quoted wire form: `"<hex>"` for strong tags,
/// `W/"<millis>"` for weak ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Strong tag: SHA-256 of `data`, first 16 bytes, hex, quoted.
    pub fn strong(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let hash = hasher.finalize();
        Self(format!("\"{}\"", hex::encode(&hash[..16])))
    }

    /// Weak tag derived from a modification time in unix milliseconds.
    pub fn weak(modified_ms: i64) -> Self {
        Self(format!("W/\"{modified_ms}\""))
    }

    /// Normalise a client-presented tag.
    ///
    /// Accepts `"abc"`, `W/"abc"`, and the bare `abc` form. Returns `None`
    /// for an empty value.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let (weak, opaque) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let quoted = if opaque.len() >= 2 && opaque.starts_with('"') && opaque.ends_with('"') {
            opaque.to_string()
        } else {
            format!("\"{}\"", opaque.trim_matches('"'))
        };
        Some(Self(if weak { format!("W/{quoted}") } else { quoted }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a store derives fingerprints from its records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintStrategy {
    /// Hash of the serialised record. Canonical.
    #[default]
    Strong,
    /// Last-modified time only. Cheaper, detects change but not content.
    Weak,
}

impl FingerprintStrategy {
    pub fn compute(self, record: &Record) -> Result<Fingerprint, serde_json::Error> {
        match self {
            FingerprintStrategy::Strong => {
                let bytes = serde_json::to_vec(record)?;
                Ok(Fingerprint::strong(&bytes))
            }
            FingerprintStrategy::Weak => Ok(Fingerprint::weak(record.updated_at.timestamp_millis())),
        }
    }
}

impl fmt::Display for FingerprintStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintStrategy::Strong => f.write_str("strong"),
            FingerprintStrategy::Weak => f.write_str("weak"),
        }
    }
}
