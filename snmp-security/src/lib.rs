//! Security module for the SNMPv3 User-based Security Model
//!
//! This crate provides passphrase hashing and key localization, HMAC
//! authentication, DES/3DES/AES privacy and the USM security model that
//! secures outgoing and verifies incoming messages.

pub mod auth;
pub mod config;
pub mod constants;
pub mod hash;
pub mod key;
pub mod localkey;
pub mod privacy;
pub mod usm;

pub use auth::AuthProtocol;
pub use config::{UsmConfig, UsmConfigBuilder};
pub use hash::HashAlgorithm;
pub use key::{LocalizedKey, MasterKey};
pub use localkey::{hash_passphrase, localize_extended, localize_key, password_to_key, KeyExtension};
pub use privacy::{PrivProtocol, PrivacyService};
pub use usm::{
    ExchangeState, LocalEngine, MessageCodec, PduClass, ProcessedMessage, SecurityLevel,
    UsmSecurityModel, UsmSecurityParameters, UsmStatistics, UsmUser, UsmUserEntry,
};
