//! Hash algorithm selection
//!
//! USM derives keys and MACs from a small closed set of digests. Each variant
//! dispatches to the matching RustCrypto implementation.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use snmp_core::SecurityError;
use std::fmt;

/// Digest used for key localization and HMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest output length in bytes
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Hash the concatenation of `parts`
    pub fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            Self::Md5 => digest_parts::<Md5>(parts),
            Self::Sha1 => digest_parts::<Sha1>(parts),
            Self::Sha224 => digest_parts::<Sha224>(parts),
            Self::Sha256 => digest_parts::<Sha256>(parts),
            Self::Sha384 => digest_parts::<Sha384>(parts),
            Self::Sha512 => digest_parts::<Sha512>(parts),
        }
    }

    /// Hash `rounds` consecutive 64-byte windows of `ring`
    ///
    /// Window `n` starts at `(n * 64) % period`. `ring` must hold at least
    /// `period + 64` bytes.
    pub(crate) fn digest_windows(&self, ring: &[u8], period: usize, rounds: usize) -> Vec<u8> {
        match self {
            Self::Md5 => windows::<Md5>(ring, period, rounds),
            Self::Sha1 => windows::<Sha1>(ring, period, rounds),
            Self::Sha224 => windows::<Sha224>(ring, period, rounds),
            Self::Sha256 => windows::<Sha256>(ring, period, rounds),
            Self::Sha384 => windows::<Sha384>(ring, period, rounds),
            Self::Sha512 => windows::<Sha512>(ring, period, rounds),
        }
    }

    /// Full-length HMAC of `data` under `key`
    ///
    /// # Errors
    /// Returns `SecurityError::AuthenticationError` if the MAC backend rejects
    /// the key
    pub fn hmac(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, SecurityError> {
        match self {
            Self::Md5 => hmac_digest::<Hmac<Md5>>(key, data),
            Self::Sha1 => hmac_digest::<Hmac<Sha1>>(key, data),
            Self::Sha224 => hmac_digest::<Hmac<Sha224>>(key, data),
            Self::Sha256 => hmac_digest::<Hmac<Sha256>>(key, data),
            Self::Sha384 => hmac_digest::<Hmac<Sha384>>(key, data),
            Self::Sha512 => hmac_digest::<Hmac<Sha512>>(key, data),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA-1"),
            Self::Sha224 => write!(f, "SHA-224"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha384 => write!(f, "SHA-384"),
            Self::Sha512 => write!(f, "SHA-512"),
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

fn windows<D: Digest>(ring: &[u8], period: usize, rounds: usize) -> Vec<u8> {
    let mut hasher = D::new();
    let mut offset = 0;
    for _ in 0..rounds {
        hasher.update(&ring[offset..offset + 64]);
        offset = (offset + 64) % period;
    }
    hasher.finalize().to_vec()
}

fn hmac_digest<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SecurityError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|_| SecurityError::AuthenticationError("invalid HMAC key length".to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
