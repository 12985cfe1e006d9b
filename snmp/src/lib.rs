//! snmp - SNMPv3 User-based Security Model core
//!
//! This library provides the security and state caching core of an SNMPv3
//! engine: key localization, message authentication and privacy, and the
//! tick-driven caches that correlate requests with responses.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `snmp-core`: Error handling, engine ids and the identifier generator
//! - `snmp-cache`: Expiring caches (message ids, state references)
//! - `snmp-security`: Key localization, authentication, privacy and the USM model
//!
//! BER encoding and transport are left to the calling layer, which plugs in
//! through `usm::MessageCodec`.
//!
//! # Usage
//!
//! ```no_run
//! use snmp::security::{AuthProtocol, PrivProtocol, UsmUserEntry};
//!
//! let user = UsmUserEntry::builder(b"admin")
//!     .set_auth(AuthProtocol::HmacSha256, b"auth-passphrase")
//!     .set_privacy(PrivProtocol::Aes128, b"priv-passphrase")
//!     .build();
//! ```

// Re-export core types
pub use snmp_core::{
    CacheError, EngineId, Handle, IdGenerator, SecurityError, SnmpError, SnmpResult,
};

// Re-export caches
pub mod cache {
    pub use snmp_cache::*;
}

// Re-export security services
pub mod security {
    pub use snmp_security::*;
}

// Re-export the security model
pub mod usm {
    pub use snmp_security::usm::*;
}
