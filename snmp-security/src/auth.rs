//! Message authentication (RFC 3414 section 6, RFC 7860)
//!
//! The MAC covers the whole serialized message with the authentication
//! parameters field zeroed. Outgoing messages are serialized with a zero
//! placeholder of the digest length, then the truncated HMAC is written over
//! the placeholder. Incoming messages are verified by zeroing the received
//! MAC in place and recomputing.

use crate::constants::{
    USM_HMAC128_SHA224_AUTH_PROTOCOL, USM_HMAC192_SHA256_AUTH_PROTOCOL,
    USM_HMAC256_SHA384_AUTH_PROTOCOL, USM_HMAC384_SHA512_AUTH_PROTOCOL,
    USM_HMAC_MD5_AUTH_PROTOCOL, USM_HMAC_SHA_AUTH_PROTOCOL,
};
use crate::hash::HashAlgorithm;
use crate::key::{LocalizedKey, MasterKey};
use crate::localkey;
use serde::{Deserialize, Serialize};
use snmp_core::SecurityError;
use std::fmt;
use subtle::ConstantTimeEq;

/// HMAC authentication protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthProtocol {
    /// HMAC-MD5-96
    HmacMd5,
    /// HMAC-SHA-96
    HmacSha,
    /// HMAC-128-SHA-224
    HmacSha224,
    /// HMAC-192-SHA-256
    HmacSha256,
    /// HMAC-256-SHA-384
    HmacSha384,
    /// HMAC-384-SHA-512
    HmacSha512,
}

impl AuthProtocol {
    /// Digest used by this protocol
    pub const fn hash(&self) -> HashAlgorithm {
        match self {
            Self::HmacMd5 => HashAlgorithm::Md5,
            Self::HmacSha => HashAlgorithm::Sha1,
            Self::HmacSha224 => HashAlgorithm::Sha224,
            Self::HmacSha256 => HashAlgorithm::Sha256,
            Self::HmacSha384 => HashAlgorithm::Sha384,
            Self::HmacSha512 => HashAlgorithm::Sha512,
        }
    }

    /// Length of the truncated MAC carried in msgAuthenticationParameters
    pub const fn digest_length(&self) -> usize {
        match self {
            Self::HmacMd5 | Self::HmacSha => 12,
            Self::HmacSha224 => 16,
            Self::HmacSha256 => 24,
            Self::HmacSha384 => 32,
            Self::HmacSha512 => 48,
        }
    }

    /// Length of a localized authentication key
    pub const fn key_length(&self) -> usize {
        self.hash().output_len()
    }

    /// Registered object identifier
    pub const fn oid(&self) -> &'static [u32] {
        match self {
            Self::HmacMd5 => USM_HMAC_MD5_AUTH_PROTOCOL,
            Self::HmacSha => USM_HMAC_SHA_AUTH_PROTOCOL,
            Self::HmacSha224 => USM_HMAC128_SHA224_AUTH_PROTOCOL,
            Self::HmacSha256 => USM_HMAC192_SHA256_AUTH_PROTOCOL,
            Self::HmacSha384 => USM_HMAC256_SHA384_AUTH_PROTOCOL,
            Self::HmacSha512 => USM_HMAC384_SHA512_AUTH_PROTOCOL,
        }
    }

    /// Look up a protocol by object identifier
    ///
    /// # Errors
    /// `SecurityError::UnsupportedAuthProtocol` for any other OID
    pub fn from_oid(oid: &[u32]) -> Result<Self, SecurityError> {
        [
            Self::HmacMd5,
            Self::HmacSha,
            Self::HmacSha224,
            Self::HmacSha256,
            Self::HmacSha384,
            Self::HmacSha512,
        ]
        .into_iter()
        .find(|protocol| protocol.oid() == oid)
        .ok_or_else(|| SecurityError::UnsupportedAuthProtocol(format_oid(oid)))
    }

    /// Stretch a passphrase with this protocol's digest
    pub fn hash_passphrase(&self, passphrase: &[u8]) -> Result<MasterKey, SecurityError> {
        localkey::hash_passphrase(passphrase, self.hash())
    }

    /// Localize a master key with this protocol's digest
    pub fn localize_key(&self, key: &MasterKey, engine_id: &[u8]) -> LocalizedKey {
        localkey::localize_key(key.as_bytes(), engine_id, self.hash())
    }

    /// Authenticate an outgoing message
    ///
    /// # Arguments
    /// * `key` - Localized authentication key
    /// * `whole_msg` - Serialized message containing a zero placeholder of
    ///   `digest_length()` bytes in msgAuthenticationParameters
    ///
    /// # Returns
    /// The message with the MAC written over the first such placeholder
    ///
    /// # Errors
    /// `SecurityError::PlaceholderNotFound` if no zero run of the digest
    /// length exists
    pub fn authenticate_outgoing(
        &self,
        key: &LocalizedKey,
        whole_msg: &[u8],
    ) -> Result<Vec<u8>, SecurityError> {
        let digest_length = self.digest_length();
        let placeholder = vec![0u8; digest_length];
        let position =
            find_subslice(whole_msg, &placeholder).ok_or(SecurityError::PlaceholderNotFound)?;

        let mac = self.hash().hmac(key.as_bytes(), whole_msg)?;
        let mut authenticated = whole_msg.to_vec();
        authenticated[position..position + digest_length].copy_from_slice(&mac[..digest_length]);
        Ok(authenticated)
    }

    /// Verify an incoming message
    ///
    /// # Arguments
    /// * `key` - Localized authentication key
    /// * `auth_parameters` - MAC received in msgAuthenticationParameters
    /// * `whole_msg` - Serialized message as received
    ///
    /// # Returns
    /// The message with the MAC replaced by zeros
    ///
    /// # Errors
    /// - `SecurityError::BadMacLength` if the MAC has the wrong length
    /// - `SecurityError::DigestNotFound` if the MAC does not occur in the message
    /// - `SecurityError::AuthenticationFailure` if the MAC does not verify
    pub fn authenticate_incoming(
        &self,
        key: &LocalizedKey,
        auth_parameters: &[u8],
        whole_msg: &[u8],
    ) -> Result<Vec<u8>, SecurityError> {
        let digest_length = self.digest_length();
        if auth_parameters.len() != digest_length {
            return Err(SecurityError::BadMacLength {
                expected: digest_length,
                actual: auth_parameters.len(),
            });
        }
        let position =
            find_subslice(whole_msg, auth_parameters).ok_or(SecurityError::DigestNotFound)?;

        let mut zeroed = whole_msg.to_vec();
        zeroed[position..position + digest_length].fill(0);

        let mac = self.hash().hmac(key.as_bytes(), &zeroed)?;
        if bool::from(mac[..digest_length].ct_eq(auth_parameters)) {
            Ok(zeroed)
        } else {
            Err(SecurityError::AuthenticationFailure)
        }
    }
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HmacMd5 => write!(f, "HMAC-MD5-96"),
            Self::HmacSha => write!(f, "HMAC-SHA-96"),
            Self::HmacSha224 => write!(f, "HMAC-128-SHA-224"),
            Self::HmacSha256 => write!(f, "HMAC-192-SHA-256"),
            Self::HmacSha384 => write!(f, "HMAC-256-SHA-384"),
            Self::HmacSha512 => write!(f, "HMAC-384-SHA-512"),
        }
    }
}

pub(crate) fn format_oid(oid: &[u32]) -> String {
    oid.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
