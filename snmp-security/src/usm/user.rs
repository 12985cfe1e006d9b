//! USM user table
//!
//! Users are configured once with their passphrases, which are stretched
//! into master keys immediately. Keys localized to a given authoritative
//! engine are derived on demand and cached per `(engine id, user name)`
//! once the caller trusts the engine id.

use crate::auth::AuthProtocol;
use crate::key::{LocalizedKey, MasterKey};
use crate::localkey::KeyExtension;
use crate::privacy::PrivProtocol;
use crate::usm::params::SecurityLevel;
use snmp_cache::ExpirationIndex;
use snmp_core::{SecurityError, SnmpError, SnmpResult};
use std::collections::HashMap;
use zeroize::Zeroizing;

/// Configured user holding master keys
#[derive(Debug, Clone)]
pub struct UsmUserEntry {
    user_name: Vec<u8>,
    security_name: Vec<u8>,
    auth: Option<(AuthProtocol, MasterKey)>,
    privacy: Option<(PrivProtocol, MasterKey)>,
}

impl UsmUserEntry {
    /// Create a user builder
    pub fn builder(user_name: &[u8]) -> UsmUserBuilder {
        UsmUserBuilder::new(user_name)
    }

    pub fn user_name(&self) -> &[u8] {
        &self.user_name
    }

    pub fn security_name(&self) -> &[u8] {
        &self.security_name
    }

    pub fn auth_protocol(&self) -> Option<AuthProtocol> {
        self.auth.as_ref().map(|(protocol, _)| *protocol)
    }

    pub fn priv_protocol(&self) -> Option<PrivProtocol> {
        self.privacy.as_ref().map(|(protocol, _)| *protocol)
    }

    /// Derive the keys for one authoritative engine
    fn localize(
        &self,
        engine_id: &[u8],
        extension: Option<KeyExtension>,
    ) -> Result<UsmUser, SecurityError> {
        let auth = self
            .auth
            .as_ref()
            .map(|(protocol, key)| (*protocol, protocol.localize_key(key, engine_id)));
        let privacy = match (&self.privacy, &self.auth) {
            (Some((protocol, key)), Some((auth_protocol, _))) => Some((
                *protocol,
                protocol.localize_key(*auth_protocol, key, engine_id, extension)?,
            )),
            (Some(_), None) => return Err(SecurityError::NoAuthentication),
            (None, _) => None,
        };
        Ok(UsmUser {
            user_name: self.user_name.clone(),
            security_name: self.security_name.clone(),
            auth,
            privacy,
        })
    }
}

/// Builder for `UsmUserEntry`
pub struct UsmUserBuilder {
    user_name: Vec<u8>,
    security_name: Option<Vec<u8>>,
    auth: Option<(AuthProtocol, Zeroizing<Vec<u8>>)>,
    privacy: Option<(PrivProtocol, Zeroizing<Vec<u8>>)>,
}

impl UsmUserBuilder {
    /// Create a builder for a user without authentication or privacy
    pub fn new(user_name: &[u8]) -> Self {
        Self {
            user_name: user_name.to_vec(),
            security_name: None,
            auth: None,
            privacy: None,
        }
    }

    /// Set the security name (defaults to the user name)
    pub fn set_security_name(mut self, security_name: &[u8]) -> Self {
        self.security_name = Some(security_name.to_vec());
        self
    }

    /// Set the authentication protocol and passphrase
    pub fn set_auth(mut self, protocol: AuthProtocol, passphrase: &[u8]) -> Self {
        self.auth = Some((protocol, Zeroizing::new(passphrase.to_vec())));
        self
    }

    /// Set the privacy protocol and passphrase
    pub fn set_privacy(mut self, protocol: PrivProtocol, passphrase: &[u8]) -> Self {
        self.privacy = Some((protocol, Zeroizing::new(passphrase.to_vec())));
        self
    }

    /// Hash the passphrases and build the entry
    ///
    /// # Errors
    /// - `SecurityError::UnsupportedSecurityLevel` if privacy is set without
    ///   authentication
    /// - `SecurityError::AuthenticationError` for an empty passphrase
    pub fn build(self) -> SnmpResult<UsmUserEntry> {
        if self.privacy.is_some() && self.auth.is_none() {
            return Err(SecurityError::UnsupportedSecurityLevel(
                "privacy requires authentication".to_string(),
            )
            .into());
        }
        let auth = match &self.auth {
            Some((protocol, passphrase)) => Some((*protocol, protocol.hash_passphrase(passphrase)?)),
            None => None,
        };
        let privacy = match (&self.privacy, &self.auth) {
            (Some((protocol, passphrase)), Some((auth_protocol, _))) => {
                Some((*protocol, auth_protocol.hash_passphrase(passphrase)?))
            }
            _ => None,
        };
        Ok(UsmUserEntry {
            security_name: self
                .security_name
                .clone()
                .unwrap_or_else(|| self.user_name.clone()),
            user_name: self.user_name.clone(),
            auth,
            privacy,
        })
    }
}

/// User with keys localized to one authoritative engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsmUser {
    pub user_name: Vec<u8>,
    pub security_name: Vec<u8>,
    pub auth: Option<(AuthProtocol, LocalizedKey)>,
    pub privacy: Option<(PrivProtocol, LocalizedKey)>,
}

impl UsmUser {
    /// The empty user used by engine id discovery
    pub fn anonymous() -> Self {
        Self {
            user_name: Vec::new(),
            security_name: Vec::new(),
            auth: None,
            privacy: None,
        }
    }

    /// Authentication protocol and key
    ///
    /// # Errors
    /// `SecurityError::NoAuthentication` if the user has none
    pub fn auth_key(&self) -> Result<(AuthProtocol, &LocalizedKey), SecurityError> {
        self.auth
            .as_ref()
            .map(|(protocol, key)| (*protocol, key))
            .ok_or(SecurityError::NoAuthentication)
    }

    /// Privacy protocol and key
    ///
    /// # Errors
    /// `SecurityError::NoEncryption` if the user has none
    pub fn priv_key(&self) -> Result<(PrivProtocol, &LocalizedKey), SecurityError> {
        self.privacy
            .as_ref()
            .map(|(protocol, key)| (*protocol, key))
            .ok_or(SecurityError::NoEncryption)
    }

    /// Check that the user's services cover an outgoing security level
    ///
    /// # Errors
    /// `SecurityError::UnsupportedSecurityLevel` naming the missing service
    pub fn check_level(&self, level: SecurityLevel) -> Result<(), SecurityError> {
        let missing = match level {
            SecurityLevel::AuthPriv if self.auth.is_none() => {
                Some("authPriv wanted while auth not expected")
            }
            SecurityLevel::AuthPriv if self.privacy.is_none() => {
                Some("authPriv wanted while priv not expected")
            }
            SecurityLevel::AuthNoPriv if self.auth.is_none() => {
                Some("authNoPriv wanted while auth not expected")
            }
            _ => None,
        };
        match missing {
            Some(reason) => Err(SecurityError::UnsupportedSecurityLevel(reason.to_string())),
            None => Ok(()),
        }
    }

    fn check_key_lengths(&self) -> SnmpResult<()> {
        if let Some((protocol, key)) = &self.auth {
            if key.len() != protocol.key_length() {
                return Err(SnmpError::InvalidData(format!(
                    "{} key must be {} bytes, got {}",
                    protocol,
                    protocol.key_length(),
                    key.len()
                )));
            }
        }
        if let Some((protocol, key)) = &self.privacy {
            if key.len() != protocol.key_length() {
                return Err(SnmpError::InvalidData(format!(
                    "{} key must be {} bytes, got {}",
                    protocol,
                    protocol.key_length(),
                    key.len()
                )));
            }
        }
        Ok(())
    }
}

/// Users by security name, with localized keys cached per engine
///
/// # Localized Keys
/// Users added with `add_localized_user` stay until removed. Keys derived
/// from a configured user are cached for `lifetime_ticks` after their last
/// use and derived again when needed.
pub struct UserTable {
    key_extension: Option<KeyExtension>,
    entries: HashMap<Vec<u8>, UsmUserEntry>,
    user_names: HashMap<Vec<u8>, Vec<u8>>,
    configured: HashMap<(Vec<u8>, Vec<u8>), UsmUser>,
    localized: ExpirationIndex<(Vec<u8>, Vec<u8>), UsmUser>,
    clock: u64,
    lifetime_ticks: u64,
}

impl UserTable {
    /// Create an empty table
    ///
    /// # Arguments
    /// * `key_extension` - Mode used to localize AES-192/256 privacy keys
    /// * `lifetime_ticks` - Ticks an unused derived key stays cached
    pub fn new(key_extension: Option<KeyExtension>, lifetime_ticks: u64) -> Self {
        Self {
            key_extension,
            entries: HashMap::new(),
            user_names: HashMap::new(),
            configured: HashMap::new(),
            localized: ExpirationIndex::new(),
            clock: 0,
            lifetime_ticks: lifetime_ticks.max(1),
        }
    }

    /// Add or replace a user
    ///
    /// Cached localized keys of a replaced user are dropped.
    ///
    /// # Errors
    /// `SecurityError::UnsupportedPrivProtocol` if the privacy protocol needs
    /// a key extension mode and none is configured
    pub fn add_user(&mut self, entry: UsmUserEntry) -> SnmpResult<()> {
        if let Some(protocol) = entry.priv_protocol() {
            protocol.key_extension(self.key_extension)?;
        }
        self.remove_user(&entry.security_name);
        if let Some(previous) = self.user_names.get(&entry.user_name).cloned() {
            self.remove_user(&previous);
        }
        log::debug!(
            "added user {} (auth {:?}, priv {:?})",
            String::from_utf8_lossy(&entry.user_name),
            entry.auth_protocol(),
            entry.priv_protocol()
        );
        self.user_names
            .insert(entry.user_name.clone(), entry.security_name.clone());
        self.entries.insert(entry.security_name.clone(), entry);
        Ok(())
    }

    /// Add a user with keys already localized to `engine_id`
    ///
    /// # Errors
    /// `SnmpError::InvalidData` if a key length does not match its protocol
    pub fn add_localized_user(&mut self, engine_id: &[u8], user: UsmUser) -> SnmpResult<()> {
        user.check_key_lengths()?;
        self.configured
            .insert((engine_id.to_vec(), user.user_name.clone()), user);
        Ok(())
    }

    /// Remove a user and every key localized for it
    pub fn remove_user(&mut self, security_name: &[u8]) -> Option<UsmUserEntry> {
        let entry = self.entries.remove(security_name)?;
        self.user_names.remove(&entry.user_name);
        self.configured
            .retain(|(_, user_name), _| user_name != &entry.user_name);
        self.localized
            .retain(|(_, user_name), _| user_name != &entry.user_name);
        Some(entry)
    }

    /// Look up a user by security name for an outgoing message
    ///
    /// # Errors
    /// `SecurityError::UnknownSecurityName` if no such user is configured
    pub fn user_for_security_name(
        &mut self,
        security_name: &[u8],
        engine_id: &[u8],
    ) -> Result<UsmUser, SecurityError> {
        if let Some(entry) = self.entries.get(security_name) {
            let user_name = entry.user_name.clone();
            return self.user_for_user_name(&user_name, engine_id);
        }
        self.configured
            .iter()
            .find(|((engine, _), user)| {
                engine.as_slice() == engine_id && user.security_name == security_name
            })
            .map(|(_, user)| user.clone())
            .ok_or(SecurityError::UnknownSecurityName)
    }

    /// Look up a user by msgUserName and cache its localized keys
    ///
    /// # Errors
    /// `SecurityError::UnknownSecurityName` if no such user is configured
    pub fn user_for_user_name(
        &mut self,
        user_name: &[u8],
        engine_id: &[u8],
    ) -> Result<UsmUser, SecurityError> {
        let user = self.lookup_user_name(user_name, engine_id)?;
        self.cache_localized(engine_id, &user);
        Ok(user)
    }

    /// Look up a user by msgUserName without touching the cache
    ///
    /// Keys of a configured user not cached for `engine_id` are derived into
    /// the returned value only. Incoming messages use this before their MAC
    /// is verified.
    ///
    /// # Errors
    /// `SecurityError::UnknownSecurityName` if no such user is configured
    pub fn lookup_user_name(
        &self,
        user_name: &[u8],
        engine_id: &[u8],
    ) -> Result<UsmUser, SecurityError> {
        let key = (engine_id.to_vec(), user_name.to_vec());
        if let Some(user) = self.configured.get(&key).or_else(|| self.localized.get(&key)) {
            return Ok(user.clone());
        }
        self.user_names
            .get(user_name)
            .and_then(|security_name| self.entries.get(security_name))
            .ok_or(SecurityError::UnknownSecurityName)?
            .localize(engine_id, self.key_extension)
    }

    /// Cache keys derived for `engine_id` and restart their lifetime
    ///
    /// Users added with `add_localized_user` and users without a configured
    /// entry are left alone.
    pub fn cache_localized(&mut self, engine_id: &[u8], user: &UsmUser) {
        let key = (engine_id.to_vec(), user.user_name.clone());
        if self.configured.contains_key(&key) || !self.user_names.contains_key(&user.user_name) {
            return;
        }
        if self.localized.remove(&key).is_none() {
            log::debug!(
                "localized keys of user {} for engine {:02x?}",
                String::from_utf8_lossy(&user.user_name),
                engine_id
            );
        }
        let expire_at = self.clock + self.lifetime_ticks;
        // The key was removed above, so the insert cannot collide
        let _ = self.localized.insert(key, user.clone(), expire_at);
    }

    /// Advance the cache clock and drop derived keys unused for the lifetime
    ///
    /// # Returns
    /// Number of dropped entries
    pub fn tick(&mut self) -> usize {
        self.clock += 1;
        self.localized.expire(self.clock).len()
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached localized users
    pub fn localized_count(&self) -> usize {
        self.configured.len() + self.localized.len()
    }
}
