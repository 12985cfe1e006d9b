//! Password to key and key localization (RFC 3414 section 2.6, A.2)
//!
//! A passphrase is first stretched into a master key `Ku` by hashing 1 MiB of
//! the repeated passphrase. The master key is then bound to one authoritative
//! engine: `Kul = H(Ku || engineID || Ku)`. Privacy protocols that need more
//! bytes than the digest yields extend `Kul` as selected by `KeyExtension`.

use crate::hash::HashAlgorithm;
use crate::key::{LocalizedKey, MasterKey};
use serde::{Deserialize, Serialize};
use snmp_core::SecurityError;
use std::fmt;

/// Bytes fed through the digest when hashing a passphrase
pub const PASSPHRASE_STRETCH: usize = 1_048_576;

const WINDOW: usize = 64;

/// How localized key material is extended past one digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyExtension {
    /// Append `H(current)` until long enough (draft-blumenthal-aes-usm)
    #[serde(rename = "standard")]
    Blumenthal,
    /// Append `localize(hash_passphrase(current))` until long enough
    /// (draft-reeder-snmpv3-usm-3desede)
    #[serde(rename = "legacy-reeder")]
    Reeder,
}

impl fmt::Display for KeyExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blumenthal => write!(f, "standard"),
            Self::Reeder => write!(f, "legacy-reeder"),
        }
    }
}

/// Stretch a passphrase into a master key
///
/// # Arguments
/// * `passphrase` - Password bytes (any non-zero length)
/// * `hash` - Digest to use
///
/// # Errors
/// `SecurityError::AuthenticationError` if the passphrase is empty
pub fn hash_passphrase(passphrase: &[u8], hash: HashAlgorithm) -> Result<MasterKey, SecurityError> {
    if passphrase.is_empty() {
        return Err(SecurityError::AuthenticationError(
            "empty passphrase".to_string(),
        ));
    }
    // Any 64-byte window starting below passphrase.len() is contiguous here
    let ring: Vec<u8> = passphrase
        .iter()
        .copied()
        .cycle()
        .take(passphrase.len() + WINDOW)
        .collect();
    let digest = hash.digest_windows(&ring, passphrase.len(), PASSPHRASE_STRETCH / WINDOW);
    Ok(MasterKey::new(digest))
}

/// Bind key material to an authoritative engine: `H(key || engine_id || key)`
pub fn localize_key(key: &[u8], engine_id: &[u8], hash: HashAlgorithm) -> LocalizedKey {
    LocalizedKey::new(hash.digest(&[key, engine_id, key]))
}

/// `localize_key(hash_passphrase(passphrase), engine_id)`
///
/// # Errors
/// `SecurityError::AuthenticationError` if the passphrase is empty
pub fn password_to_key(
    passphrase: &[u8],
    engine_id: &[u8],
    hash: HashAlgorithm,
) -> Result<LocalizedKey, SecurityError> {
    let master = hash_passphrase(passphrase, hash)?;
    Ok(localize_key(master.as_bytes(), engine_id, hash))
}

/// Localize `key` and extend or truncate the result to exactly `size` bytes
///
/// # Arguments
/// * `key` - Master key material
/// * `engine_id` - Authoritative engine id
/// * `hash` - Digest of the authentication protocol in use
/// * `size` - Required key length
/// * `mode` - Extension procedure, only consulted when `size` exceeds the
///   digest length
///
/// # Errors
/// `SecurityError::AuthenticationError` if the Reeder procedure is asked to
/// hash empty material
pub fn localize_extended(
    key: &[u8],
    engine_id: &[u8],
    hash: HashAlgorithm,
    size: usize,
    mode: KeyExtension,
) -> Result<LocalizedKey, SecurityError> {
    let localized = localize_key(key, engine_id, hash);
    let mut material = localized.as_bytes().to_vec();
    while material.len() < size {
        let block = match mode {
            KeyExtension::Blumenthal => hash.digest(&[&material]),
            KeyExtension::Reeder => {
                let master = hash_passphrase(&material, hash)?;
                localize_key(master.as_bytes(), engine_id, hash)
                    .as_bytes()
                    .to_vec()
            }
        };
        material.extend_from_slice(&block);
    }
    material.truncate(size);
    log::debug!(
        "localized {} key to {} bytes ({} extension)",
        hash,
        material.len(),
        mode
    );
    Ok(LocalizedKey::new(material))
}
