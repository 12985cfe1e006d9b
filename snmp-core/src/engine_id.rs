use crate::error::{SnmpError, SnmpResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum SnmpEngineID length in octets (RFC 3411)
pub const ENGINE_ID_MIN_LEN: usize = 5;

/// Maximum SnmpEngineID length in octets (RFC 3411)
pub const ENGINE_ID_MAX_LEN: usize = 32;

/// Authoritative SNMP engine identifier
///
/// Keys are localized against this value, so two engines sharing a
/// passphrase still end up with different operational keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineId {
    bytes: Vec<u8>,
}

impl EngineId {
    /// Create an engine ID from raw octets
    ///
    /// # Errors
    /// Returns `SnmpError::InvalidData` if the length is outside 5..=32
    pub fn from_slice(bytes: &[u8]) -> SnmpResult<Self> {
        if !(ENGINE_ID_MIN_LEN..=ENGINE_ID_MAX_LEN).contains(&bytes.len()) {
            return Err(SnmpError::InvalidData(format!(
                "Engine ID must be {}..={} bytes, got {}",
                ENGINE_ID_MIN_LEN,
                ENGINE_ID_MAX_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Parse an engine ID from hex text
    ///
    /// Accepts an optional `0x` prefix and `:` or whitespace separators,
    /// e.g. `"80001f8880e9bd0c1d12667a5100000000"` or `"80:00:1f:88"`.
    pub fn from_hex(s: &str) -> SnmpResult<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let digits: Vec<u8> = s
            .bytes()
            .filter(|b| *b != b':' && !b.is_ascii_whitespace())
            .collect();
        let bytes = hex::decode(digits)
            .map_err(|e| SnmpError::InvalidData(format!("Invalid engine ID hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Get the engine ID as slice
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in octets
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a validated engine ID
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercase hex rendering without separators
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl TryFrom<String> for EngineId {
    type Error = SnmpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<EngineId> for String {
    fn from(value: EngineId) -> Self {
        value.to_hex()
    }
}

impl AsRef<[u8]> for EngineId {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineId({})", self.to_hex())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
