//! Message privacy (RFC 3414 section 8, RFC 3826, 3DES and AES-192/256 drafts)
//!
//! # Salt and IV
//! - DES / 3DES: salt = engine boots (BE) || 32-bit local counter,
//!   IV = salt XOR pre-IV, where the pre-IV is the last 8 bytes of the
//!   localized key. CBC mode, plaintext zero padded to the 8-byte block.
//! - AES: salt = 64-bit local counter, IV = boots (BE) || time (BE) || salt.
//!   CFB-128 mode, no padding.
//!
//! The salt is carried in msgPrivacyParameters. Counters start at a random
//! value and wrap to zero.

use crate::auth::AuthProtocol;
use crate::constants::{
    USM_3DES_EDE_PRIV_PROTOCOL, USM_AES_CFB128_PRIV_PROTOCOL,
    USM_AES_CFB192_BLUMENTHAL_PRIV_PROTOCOL, USM_AES_CFB192_REEDER_PRIV_PROTOCOL,
    USM_AES_CFB256_BLUMENTHAL_PRIV_PROTOCOL, USM_AES_CFB256_REEDER_PRIV_PROTOCOL,
    USM_DES_PRIV_PROTOCOL,
};
use crate::key::{LocalizedKey, MasterKey};
use crate::localkey::{self, KeyExtension};
use aes::{Aes128, Aes192, Aes256};
use cipher::generic_array::GenericArray;
use cipher::{
    AsyncStreamCipher, Block, BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser,
    InvalidLength, KeyInit, KeyIvInit,
};
use des::{Des, TdesEde3};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use snmp_core::SecurityError;
use std::fmt;

/// Length of msgPrivacyParameters for every supported protocol
pub const SALT_LENGTH: usize = 8;

const DES_BLOCK: usize = 8;

/// Privacy protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivProtocol {
    /// CBC-DES
    Des,
    /// 3DES-EDE in CBC mode
    #[serde(rename = "3des")]
    TripleDes,
    /// CFB128-AES-128
    Aes128,
    /// CFB128-AES-192
    Aes192,
    /// CFB128-AES-256
    Aes256,
}

impl PrivProtocol {
    /// Length of the localized privacy key
    pub const fn key_length(&self) -> usize {
        match self {
            Self::Des => 16,
            Self::TripleDes => 32,
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Whether localization needs an explicit key extension mode
    pub const fn requires_key_extension(&self) -> bool {
        matches!(self, Self::Aes192 | Self::Aes256)
    }

    /// Registered object identifier
    ///
    /// AES-192/256 are registered under different arcs depending on the key
    /// extension procedure. `extension` is ignored for the other protocols.
    pub const fn oid(&self, extension: KeyExtension) -> &'static [u32] {
        match (self, extension) {
            (Self::Des, _) => USM_DES_PRIV_PROTOCOL,
            (Self::TripleDes, _) => USM_3DES_EDE_PRIV_PROTOCOL,
            (Self::Aes128, _) => USM_AES_CFB128_PRIV_PROTOCOL,
            (Self::Aes192, KeyExtension::Blumenthal) => USM_AES_CFB192_BLUMENTHAL_PRIV_PROTOCOL,
            (Self::Aes192, KeyExtension::Reeder) => USM_AES_CFB192_REEDER_PRIV_PROTOCOL,
            (Self::Aes256, KeyExtension::Blumenthal) => USM_AES_CFB256_BLUMENTHAL_PRIV_PROTOCOL,
            (Self::Aes256, KeyExtension::Reeder) => USM_AES_CFB256_REEDER_PRIV_PROTOCOL,
        }
    }

    /// Key extension procedure used to localize keys for this protocol
    ///
    /// DES and AES-128 keys never need extension, 3DES always follows the
    /// Reeder procedure.
    ///
    /// # Errors
    /// `SecurityError::UnsupportedPrivProtocol` if AES-192/256 is used
    /// without a configured mode
    pub fn key_extension(
        &self,
        configured: Option<KeyExtension>,
    ) -> Result<KeyExtension, SecurityError> {
        match self {
            Self::Des | Self::Aes128 => Ok(configured.unwrap_or(KeyExtension::Blumenthal)),
            Self::TripleDes => Ok(KeyExtension::Reeder),
            Self::Aes192 | Self::Aes256 => configured.ok_or_else(|| {
                SecurityError::UnsupportedPrivProtocol(format!(
                    "{} requires a key extension mode",
                    self
                ))
            }),
        }
    }

    /// Localize a privacy master key
    ///
    /// # Arguments
    /// * `auth` - Authentication protocol of the same user; its digest is used
    /// * `key` - Privacy master key (hashed privacy passphrase)
    /// * `engine_id` - Authoritative engine id
    /// * `extension` - Configured key extension mode
    pub fn localize_key(
        &self,
        auth: AuthProtocol,
        key: &MasterKey,
        engine_id: &[u8],
        extension: Option<KeyExtension>,
    ) -> Result<LocalizedKey, SecurityError> {
        let mode = self.key_extension(extension)?;
        localkey::localize_extended(key.as_bytes(), engine_id, auth.hash(), self.key_length(), mode)
    }
}

impl fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Des => write!(f, "CBC-DES"),
            Self::TripleDes => write!(f, "3DES-EDE"),
            Self::Aes128 => write!(f, "CFB128-AES-128"),
            Self::Aes192 => write!(f, "CFB128-AES-192"),
            Self::Aes256 => write!(f, "CFB128-AES-256"),
        }
    }
}

/// Encryption engine holding the local salt counters
///
/// # Salt Uniqueness
/// Each `encrypt` call advances the counter of its protocol family, so a
/// salt is not reused before the counter wraps.
#[derive(Debug, Clone)]
pub struct PrivacyService {
    des_salt: u32,
    aes_salt: u64,
}

impl PrivacyService {
    /// Create a service with randomly seeded salt counters
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_salts(rng.next_u32(), rng.next_u64())
    }

    /// Create a service with fixed salt counters
    pub fn with_salts(des_salt: u32, aes_salt: u64) -> Self {
        Self { des_salt, aes_salt }
    }

    /// Encrypt a serialized scoped PDU
    ///
    /// # Arguments
    /// * `protocol` - Privacy protocol
    /// * `key` - Localized privacy key
    /// * `engine_boots` / `engine_time` - Authoritative engine clock
    /// * `plaintext` - Serialized scoped PDU
    ///
    /// # Returns
    /// `(ciphertext, salt)`; the salt goes into msgPrivacyParameters
    ///
    /// # Errors
    /// `SecurityError::EncryptionError` if the key has the wrong length
    pub fn encrypt(
        &mut self,
        protocol: PrivProtocol,
        key: &LocalizedKey,
        engine_boots: u32,
        engine_time: u32,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), SecurityError> {
        check_key_length(protocol, key)
            .map_err(|_| SecurityError::EncryptionError(bad_key_message(protocol, key.len())))?;
        let key = key.as_bytes();

        match protocol {
            PrivProtocol::Des | PrivProtocol::TripleDes => {
                let salt = self.next_des_salt(engine_boots);
                let (cipher_key, pre_iv) = key.split_at(key.len() - DES_BLOCK);
                let iv = xor_block(&salt, pre_iv);

                let mut data = plaintext.to_vec();
                let remainder = data.len() % DES_BLOCK;
                if remainder != 0 {
                    data.resize(data.len() + DES_BLOCK - remainder, 0);
                }
                let result = match protocol {
                    PrivProtocol::Des => cbc_encrypt::<Des>(cipher_key, iv, &mut data),
                    _ => cbc_encrypt::<TdesEde3>(cipher_key, iv, &mut data),
                };
                result.map_err(|_| SecurityError::EncryptionError(bad_key_message(protocol, key.len())))?;
                Ok((data, salt.to_vec()))
            }
            PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
                let salt = self.next_aes_salt();
                let iv = aes_iv(engine_boots, engine_time, &salt);

                let mut data = plaintext.to_vec();
                let result = match protocol {
                    PrivProtocol::Aes128 => cfb_encrypt::<Aes128>(key, &iv, &mut data),
                    PrivProtocol::Aes192 => cfb_encrypt::<Aes192>(key, &iv, &mut data),
                    _ => cfb_encrypt::<Aes256>(key, &iv, &mut data),
                };
                result.map_err(|_| SecurityError::EncryptionError(bad_key_message(protocol, key.len())))?;
                Ok((data, salt.to_vec()))
            }
        }
    }

    /// Decrypt an encrypted scoped PDU
    ///
    /// DES and 3DES output keeps the zero padding added by the sender.
    ///
    /// # Errors
    /// - `SecurityError::DecryptionError` if the salt is not 8 bytes or a
    ///   DES ciphertext is not block aligned
    /// - `SecurityError::UnsupportedPrivProtocol` if the cipher rejects the key
    pub fn decrypt(
        &self,
        protocol: PrivProtocol,
        key: &LocalizedKey,
        engine_boots: u32,
        engine_time: u32,
        salt: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, SecurityError> {
        if salt.len() != SALT_LENGTH {
            return Err(SecurityError::DecryptionError(format!(
                "bad salt length: expected {}, got {}",
                SALT_LENGTH,
                salt.len()
            )));
        }
        check_key_length(protocol, key)?;
        let key = key.as_bytes();

        match protocol {
            PrivProtocol::Des | PrivProtocol::TripleDes => {
                if ciphertext.len() % DES_BLOCK != 0 {
                    return Err(SecurityError::DecryptionError(format!(
                        "ciphertext length {} is not a multiple of {}",
                        ciphertext.len(),
                        DES_BLOCK
                    )));
                }
                let (cipher_key, pre_iv) = key.split_at(key.len() - DES_BLOCK);
                let iv = xor_block(salt, pre_iv);

                let mut data = ciphertext.to_vec();
                let result = match protocol {
                    PrivProtocol::Des => cbc_decrypt::<Des>(cipher_key, iv, &mut data),
                    _ => cbc_decrypt::<TdesEde3>(cipher_key, iv, &mut data),
                };
                result.map_err(|_| {
                    SecurityError::UnsupportedPrivProtocol(bad_key_message(protocol, key.len()))
                })?;
                Ok(data)
            }
            PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
                let iv = aes_iv(engine_boots, engine_time, salt);
                let mut data = ciphertext.to_vec();
                let result = match protocol {
                    PrivProtocol::Aes128 => cfb_decrypt::<Aes128>(key, &iv, &mut data),
                    PrivProtocol::Aes192 => cfb_decrypt::<Aes192>(key, &iv, &mut data),
                    _ => cfb_decrypt::<Aes256>(key, &iv, &mut data),
                };
                result.map_err(|_| {
                    SecurityError::UnsupportedPrivProtocol(bad_key_message(protocol, key.len()))
                })?;
                Ok(data)
            }
        }
    }

    fn next_des_salt(&mut self, engine_boots: u32) -> [u8; SALT_LENGTH] {
        let mut salt = [0u8; SALT_LENGTH];
        salt[..4].copy_from_slice(&engine_boots.to_be_bytes());
        salt[4..].copy_from_slice(&self.des_salt.to_be_bytes());
        self.des_salt = self.des_salt.wrapping_add(1);
        salt
    }

    fn next_aes_salt(&mut self) -> [u8; SALT_LENGTH] {
        let salt = self.aes_salt.to_be_bytes();
        self.aes_salt = self.aes_salt.wrapping_add(1);
        salt
    }
}

impl Default for PrivacyService {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key_length(protocol: PrivProtocol, key: &LocalizedKey) -> Result<(), SecurityError> {
    if key.len() != protocol.key_length() {
        return Err(SecurityError::UnsupportedPrivProtocol(bad_key_message(
            protocol,
            key.len(),
        )));
    }
    Ok(())
}

fn bad_key_message(protocol: PrivProtocol, key_length: usize) -> String {
    format!(
        "{} key of {} bytes rejected, expected {}",
        protocol,
        key_length,
        protocol.key_length()
    )
}

fn xor_block(salt: &[u8], pre_iv: &[u8]) -> [u8; DES_BLOCK] {
    let mut iv = [0u8; DES_BLOCK];
    for (out, (s, p)) in iv.iter_mut().zip(salt.iter().zip(pre_iv)) {
        *out = s ^ p;
    }
    iv
}

fn aes_iv(engine_boots: u32, engine_time: u32, salt: &[u8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
    iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
    iv[8..].copy_from_slice(salt);
    iv
}

fn cbc_encrypt<C>(key: &[u8], iv: [u8; DES_BLOCK], data: &mut [u8]) -> Result<(), InvalidLength>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let mut blocks = to_blocks::<C>(data);
    cbc::Encryptor::<C>::new_from_slices(key, &iv)?.encrypt_blocks_mut(&mut blocks);
    from_blocks::<C>(&blocks, data);
    Ok(())
}

fn cbc_decrypt<C>(key: &[u8], iv: [u8; DES_BLOCK], data: &mut [u8]) -> Result<(), InvalidLength>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let mut blocks = to_blocks::<C>(data);
    cbc::Decryptor::<C>::new_from_slices(key, &iv)?.decrypt_blocks_mut(&mut blocks);
    from_blocks::<C>(&blocks, data);
    Ok(())
}

// `data` is block aligned: padded by `encrypt`, length checked by `decrypt`
fn to_blocks<C: BlockSizeUser>(data: &[u8]) -> Vec<Block<C>> {
    data.chunks_exact(C::block_size())
        .map(GenericArray::clone_from_slice)
        .collect()
}

fn from_blocks<C: BlockSizeUser>(blocks: &[Block<C>], data: &mut [u8]) {
    for (chunk, block) in data.chunks_exact_mut(C::block_size()).zip(blocks) {
        chunk.copy_from_slice(block);
    }
}

fn cfb_encrypt<C>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<(), InvalidLength>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    cfb_mode::Encryptor::<C>::new_from_slices(key, iv)?.encrypt(data);
    Ok(())
}

fn cfb_decrypt<C>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<(), InvalidLength>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    cfb_mode::Decryptor::<C>::new_from_slices(key, iv)?.decrypt(data);
    Ok(())
}
