//! OpenPGP fingerprint normalisation and display.

use serde::{Deserialize, Serialize};

use super::QrParseError;

/// Number of hex characters in a v4 OpenPGP fingerprint.
pub const FINGERPRINT_LEN: usize = 40;

/// Normalised fingerprint: exactly 40 upper-case hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Normalises `raw` and checks its length.
    pub fn parse(raw: &str) -> Result<Self, QrParseError> {
        let normalized = normalize(raw);
        if normalized.len() != FINGERPRINT_LEN {
            return Err(QrParseError::BadFingerprintLength);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable form: blocks of four, five blocks per line.
    pub fn formatted(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + self.0.len() / 4);
        for (i, block) in self.0.as_bytes().chunks(4).enumerate() {
            if i > 0 {
                out.push(if i % 5 == 0 { '\n' } else { ' ' });
            }
            // chunks of ASCII hex are always valid UTF-8
            out.push_str(std::str::from_utf8(block).unwrap_or_default());
        }
        out
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drops everything that is not a hex digit and upper-cases the rest.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
