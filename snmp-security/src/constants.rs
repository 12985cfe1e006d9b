//! USM protocol identifiers and timing constants
//!
//! Object identifiers are those registered for the USM authentication and
//! privacy protocols (SNMP-USER-BASED-SM-MIB, SNMP-USM-HMAC-SHA2-MIB,
//! SNMP-USM-AES-MIB) plus the vendor arcs used by the AES-192/256 drafts.

/// usmNoAuthProtocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 1, 1}
pub const USM_NO_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 1];

/// usmHMACMD5AuthProtocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 1, 2}
pub const USM_HMAC_MD5_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 2];

/// usmHMACSHAAuthProtocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 1, 3}
pub const USM_HMAC_SHA_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 3];

/// usmHMAC128SHA224AuthProtocol
pub const USM_HMAC128_SHA224_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 4];

/// usmHMAC192SHA256AuthProtocol
pub const USM_HMAC192_SHA256_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 5];

/// usmHMAC256SHA384AuthProtocol
pub const USM_HMAC256_SHA384_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 6];

/// usmHMAC384SHA512AuthProtocol
pub const USM_HMAC384_SHA512_AUTH_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 1, 7];

/// usmNoPrivProtocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 2, 1}
pub const USM_NO_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 2, 1];

/// usmDESPrivProtocol (CBC-DES)
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 2, 2}
pub const USM_DES_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 2, 2];

/// usm3DESEDEPrivProtocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 2, 3}
pub const USM_3DES_EDE_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 2, 3];

/// usmAesCfb128Protocol
///
/// OID: {1, 3, 6, 1, 6, 3, 10, 1, 2, 4}
pub const USM_AES_CFB128_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 6, 3, 10, 1, 2, 4];

/// AES-192 with key extension by re-hashing (Blumenthal draft)
pub const USM_AES_CFB192_BLUMENTHAL_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 12, 6, 1, 1];

/// AES-256 with key extension by re-hashing (Blumenthal draft)
pub const USM_AES_CFB256_BLUMENTHAL_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 12, 6, 1, 2];

/// AES-192 with key extension by password-to-key (Reeder draft)
pub const USM_AES_CFB192_REEDER_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 4, 1, 14832, 1, 3];

/// AES-256 with key extension by password-to-key (Reeder draft)
pub const USM_AES_CFB256_REEDER_PRIV_PROTOCOL: &[u32] = &[1, 3, 6, 1, 4, 1, 14832, 1, 4];

/// Time window for authenticated messages, in seconds (RFC 3414 3.2.7)
pub const TIME_WINDOW_SECS: u32 = 150;

/// Lifetime of a remote engine timeline entry without updates, in seconds
pub const TIMELINE_LIFETIME_SECS: u32 = 300;

/// Largest usable snmpEngineBoots value; an engine at this value is
/// never in the time window
pub const MAX_ENGINE_BOOTS: u32 = 2_147_483_647;
