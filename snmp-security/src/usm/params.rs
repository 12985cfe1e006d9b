//! Security level and USM security parameters

use snmp_core::{SnmpError, SnmpResult};
use std::fmt;

/// Security level carried in msgFlags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityLevel {
    NoAuthNoPriv = 1,
    AuthNoPriv = 2,
    AuthPriv = 3,
}

impl SecurityLevel {
    /// Get level ID
    pub const fn id(&self) -> u8 {
        *self as u8
    }

    /// Get level from ID
    ///
    /// # Errors
    /// `SnmpError::Protocol` for any value other than 1, 2 or 3
    pub fn from_id(id: u8) -> SnmpResult<Self> {
        match id {
            1 => Ok(Self::NoAuthNoPriv),
            2 => Ok(Self::AuthNoPriv),
            3 => Ok(Self::AuthPriv),
            _ => Err(SnmpError::Protocol(format!("unknown security level {}", id))),
        }
    }

    /// Check if the level requires authentication
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::AuthNoPriv | Self::AuthPriv)
    }

    /// Check if the level requires encryption
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::AuthPriv)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAuthNoPriv => write!(f, "noAuthNoPriv"),
            Self::AuthNoPriv => write!(f, "authNoPriv"),
            Self::AuthPriv => write!(f, "authPriv"),
        }
    }
}

/// UsmSecurityParameters (RFC 3414 section 2.4)
///
/// `engine_id` is kept as raw bytes since discovery messages carry an empty
/// or malformed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsmSecurityParameters {
    /// msgAuthoritativeEngineID
    pub engine_id: Vec<u8>,
    /// msgAuthoritativeEngineBoots
    pub engine_boots: u32,
    /// msgAuthoritativeEngineTime
    pub engine_time: u32,
    /// msgUserName
    pub user_name: Vec<u8>,
    /// msgAuthenticationParameters
    pub auth_parameters: Vec<u8>,
    /// msgPrivacyParameters
    pub priv_parameters: Vec<u8>,
}
