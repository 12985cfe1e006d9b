//! User-based Security Model (RFC 3414 section 3)
//!
//! `UsmSecurityModel` secures outgoing messages, verifies incoming ones and
//! keeps the per-exchange state needed to correlate responses. Serialization
//! is delegated to a `MessageCodec`.
//!
//! # Outgoing
//! The scoped PDU is encrypted first, the message is then encoded with a zero
//! MAC placeholder and finally authenticated in place.
//!
//! # Incoming
//! The checks run in RFC order: engine id, user, security level, MAC, time
//! window, decryption. Each discard increments its `UsmStatistics` counter.

use crate::config::UsmConfig;
use crate::privacy::PrivacyService;
use crate::usm::codec::{MessageCodec, OutgoingMessage, PduClass, ScopedPduData};
use crate::usm::params::{SecurityLevel, UsmSecurityParameters};
use crate::usm::state::ExchangeState;
use crate::usm::statistics::UsmStatistics;
use crate::usm::timeline::{EngineTimeline, LocalEngine};
use crate::usm::user::{UserTable, UsmUser, UsmUserEntry};
use snmp_cache::MessageCache;
use snmp_core::{EngineId, Handle, SecurityError, SnmpError, SnmpResult};

/// Data cached for a request until its response arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingRequest {
    pub security_name: Vec<u8>,
    pub engine_id: Vec<u8>,
    pub security_level: SecurityLevel,
    pub state: ExchangeState,
}

/// Security data kept for answering an incoming request
#[derive(Debug, Clone)]
pub struct ResponseState {
    msg_id: Handle,
    engine_id: Vec<u8>,
    security_level: SecurityLevel,
    user: UsmUser,
}

/// Verified incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage {
    pub msg_id: Handle,
    pub security_level: SecurityLevel,
    pub security_parameters: UsmSecurityParameters,
    pub security_name: Vec<u8>,
    /// Plaintext scoped PDU
    pub scoped_pdu: Vec<u8>,
    pub pdu_class: PduClass,
    /// Set for confirmed-class PDUs; pass to `generate_response`
    pub state_reference: Option<Handle>,
}

/// Request matched to its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRequest {
    pub msg_id: Handle,
    pub send_pdu_handle: Handle,
    pub request: OutstandingRequest,
}

/// Handles dropped by one `receive_timer_tick`
///
/// Every listed message id has moved to `ExchangeState::Expired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerTick {
    pub expired_requests: Vec<Handle>,
    pub expired_state_references: Vec<Handle>,
    /// Number of remote engine timelines dropped
    pub expired_timelines: usize,
    /// Number of cached localized users dropped
    pub expired_localized_users: usize,
}

/// SNMPv3 User-based Security Model
pub struct UsmSecurityModel<C: MessageCodec> {
    config: UsmConfig,
    local: LocalEngine,
    users: UserTable,
    cache: MessageCache<OutstandingRequest, ResponseState>,
    timeline: EngineTimeline,
    privacy: PrivacyService,
    statistics: UsmStatistics,
    codec: C,
}

impl<C: MessageCodec> UsmSecurityModel<C> {
    /// Create a security model
    ///
    /// # Arguments
    /// * `config` - Cache, timer and key extension settings
    /// * `local` - This engine's id and clock
    /// * `codec` - Message serialization of the calling layer
    ///
    /// # Errors
    /// `SnmpError::InvalidData` if the configuration does not validate
    pub fn new(config: UsmConfig, local: LocalEngine, codec: C) -> SnmpResult<Self> {
        config.validate()?;
        Ok(Self {
            users: UserTable::new(config.key_extension, config.timeline_lifetime_ticks()),
            cache: MessageCache::new(config.cache_config())?,
            timeline: EngineTimeline::new(
                config.timeline_lifetime_ticks(),
                config.timer_resolution_ms,
            ),
            privacy: PrivacyService::new(),
            statistics: UsmStatistics::new(),
            config,
            local,
            codec,
        })
    }

    /// Replace the privacy service, e.g. to fix the salt counters
    pub fn set_privacy_service(&mut self, privacy: PrivacyService) {
        self.privacy = privacy;
    }

    pub fn config(&self) -> &UsmConfig {
        &self.config
    }

    pub fn local_engine(&self) -> &LocalEngine {
        &self.local
    }

    pub fn local_engine_mut(&mut self) -> &mut LocalEngine {
        &mut self.local
    }

    pub fn timeline(&self) -> &EngineTimeline {
        &self.timeline
    }

    pub fn statistics(&self) -> &UsmStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut UsmStatistics {
        &mut self.statistics
    }

    pub fn users(&self) -> &UserTable {
        &self.users
    }

    /// Add or replace a user
    pub fn add_user(&mut self, entry: UsmUserEntry) -> SnmpResult<()> {
        self.users.add_user(entry)
    }

    /// Add a user whose keys are already localized to `engine_id`
    pub fn add_localized_user(&mut self, engine_id: &[u8], user: UsmUser) -> SnmpResult<()> {
        self.users.add_localized_user(engine_id, user)
    }

    pub fn remove_user(&mut self, security_name: &[u8]) -> Option<UsmUserEntry> {
        self.users.remove_user(security_name)
    }

    /// Secure and encode an outgoing request (RFC 3414 3.1.1b)
    ///
    /// # Arguments
    /// * `security_name` - Sending user; empty for engine id discovery
    /// * `engine_id` - Authoritative engine; may be empty for discovery
    /// * `level` - Requested security level
    /// * `scoped_pdu` - Serialized plaintext scoped PDU
    /// * `send_pdu_handle` - Caller's handle for the request
    ///
    /// # Returns
    /// `(whole message, message id)`
    ///
    /// # Errors
    /// - `SecurityError::UnknownSecurityName` for an unknown user
    /// - `SecurityError::UnsupportedSecurityLevel` if the user lacks a service
    ///   the level needs
    /// - `SecurityError::UnknownEngineId` for an authenticated request to a
    ///   malformed engine id
    /// - `CacheError::DuplicateHandle` if a handle is already outstanding
    pub fn generate_request(
        &mut self,
        security_name: &[u8],
        engine_id: &[u8],
        level: SecurityLevel,
        scoped_pdu: &[u8],
        send_pdu_handle: Handle,
    ) -> SnmpResult<(Vec<u8>, Handle)> {
        if level.is_authenticated() && EngineId::from_slice(engine_id).is_err() {
            return Err(SecurityError::UnknownEngineId.into());
        }
        let user = if security_name.is_empty() {
            UsmUser::anonymous()
        } else {
            self.users.user_for_security_name(security_name, engine_id)?
        };
        user.check_level(level)?;

        let (boots, time) = self.clock_for(engine_id);
        let msg_id = self.cache.new_message_id();
        let whole_msg =
            self.secure_outgoing(msg_id, &user, level, engine_id, boots, time, scoped_pdu)?;

        let request = OutstandingRequest {
            security_name: user.security_name,
            engine_id: engine_id.to_vec(),
            security_level: level,
            state: ExchangeState::Idle.after_cached(),
        };
        self.cache
            .push_by_message_id(msg_id, send_pdu_handle, request)?;
        Ok((whole_msg, msg_id))
    }

    /// Secure and encode the response to an incoming request
    /// (RFC 3414 3.1.1a)
    ///
    /// The response uses the user, keys and security level of the request
    /// cached under `state_reference`, which is consumed.
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if the state reference was consumed or expired
    pub fn generate_response(
        &mut self,
        state_reference: Handle,
        scoped_pdu: &[u8],
    ) -> SnmpResult<Vec<u8>> {
        let state = self.cache.pop_by_state_reference(state_reference)?;
        let (boots, time) = self.clock_for(&state.engine_id);
        self.secure_outgoing(
            state.msg_id,
            &state.user,
            state.security_level,
            &state.engine_id,
            boots,
            time,
            scoped_pdu,
        )
    }

    /// Verify and decrypt an incoming message (RFC 3414 3.2)
    ///
    /// # Errors
    /// - `SnmpError::Codec` if the codec cannot split the message
    /// - `SnmpError::Protocol` for an unknown security level value
    /// - `SnmpError::Security` for every discard counted in `UsmStatistics`
    pub fn process_incoming(&mut self, whole_msg: &[u8]) -> SnmpResult<ProcessedMessage> {
        let incoming = self.codec.decode(whole_msg)?;
        let level = SecurityLevel::from_id(incoming.security_level)?;
        let params = incoming.security_parameters;

        if EngineId::from_slice(&params.engine_id).is_err() {
            self.statistics.increment_unknown_engine_ids();
            log::warn!(
                "discarded message {}: unknown engine id {:02x?}",
                incoming.msg_id,
                params.engine_id
            );
            return Err(SecurityError::UnknownEngineId.into());
        }

        let user = if params.user_name.is_empty() {
            UsmUser::anonymous()
        } else {
            match self
                .users
                .lookup_user_name(&params.user_name, &params.engine_id)
            {
                Ok(user) => user,
                Err(SecurityError::UnknownSecurityName) => {
                    self.statistics.increment_unknown_user_names();
                    log::warn!(
                        "discarded message {}: unknown user {}",
                        incoming.msg_id,
                        String::from_utf8_lossy(&params.user_name)
                    );
                    return Err(SecurityError::UnknownSecurityName.into());
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Err(e) = user.check_level(level) {
            self.statistics.increment_unsupported_sec_levels();
            log::warn!("discarded message {}: {}", incoming.msg_id, e);
            return Err(e.into());
        }

        if level.is_authenticated() {
            let (protocol, key) = user.auth_key()?;
            if let Err(e) = protocol.authenticate_incoming(key, &params.auth_parameters, whole_msg)
            {
                self.statistics.increment_wrong_digests();
                log::warn!("discarded message {}: {}", incoming.msg_id, e);
                return Err(e.into());
            }

            let window = self.config.time_window_secs;
            let in_window = if self.is_local(&params.engine_id) {
                self.local
                    .in_time_window(params.engine_boots, params.engine_time, window)
            } else {
                self.timeline.check_and_update(
                    &params.engine_id,
                    params.engine_boots,
                    params.engine_time,
                    window,
                )
            };
            if !in_window {
                self.statistics.increment_not_in_time_windows();
                log::warn!(
                    "discarded message {}: boots {} time {} not in time window",
                    incoming.msg_id,
                    params.engine_boots,
                    params.engine_time
                );
                return Err(SecurityError::NotInTimeWindow.into());
            }
            self.users.cache_localized(&params.engine_id, &user);
        }

        let scoped_pdu = match (level.is_encrypted(), incoming.scoped_pdu) {
            (true, ScopedPduData::Encrypted(ciphertext)) => {
                let (protocol, key) = user.priv_key()?;
                match self.privacy.decrypt(
                    protocol,
                    key,
                    params.engine_boots,
                    params.engine_time,
                    &params.priv_parameters,
                    &ciphertext,
                ) {
                    Ok(plaintext) => plaintext,
                    Err(e) => {
                        self.statistics.increment_decryption_errors();
                        log::warn!("discarded message {}: {}", incoming.msg_id, e);
                        return Err(e.into());
                    }
                }
            }
            (true, ScopedPduData::Plaintext(_)) => {
                self.statistics.increment_decryption_errors();
                return Err(SecurityError::DecryptionError(
                    "expected encrypted scoped PDU".to_string(),
                )
                .into());
            }
            (false, ScopedPduData::Plaintext(plaintext)) => plaintext,
            (false, ScopedPduData::Encrypted(_)) => {
                return Err(SnmpError::Protocol(format!(
                    "encrypted scoped PDU at security level {}",
                    level
                )));
            }
        };

        let pdu_class = self.codec.pdu_class(&scoped_pdu)?;
        let state_reference = if pdu_class == PduClass::Confirmed {
            let state_reference = self.cache.new_state_reference();
            let state = ResponseState {
                msg_id: incoming.msg_id,
                engine_id: params.engine_id.clone(),
                security_level: level,
                user: user.clone(),
            };
            self.cache.push_by_state_reference(state_reference, state)?;
            Some(state_reference)
        } else {
            None
        };

        Ok(ProcessedMessage {
            msg_id: incoming.msg_id,
            security_level: level,
            security_parameters: params,
            security_name: user.security_name,
            scoped_pdu,
            pdu_class,
            state_reference,
        })
    }

    /// Consume the request a response answers
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if the request was matched, released or expired
    pub fn match_response(&mut self, msg_id: Handle) -> SnmpResult<MatchedRequest> {
        let (send_pdu_handle, mut request) = self.cache.pop_by_message_id(msg_id)?;
        request.state = request.state.after_response();
        Ok(MatchedRequest {
            msg_id,
            send_pdu_handle,
            request,
        })
    }

    /// Drop an outstanding request before its response arrives
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if the request is no longer outstanding
    pub fn release(&mut self, msg_id: Handle) -> SnmpResult<ExchangeState> {
        let (_, request) = self.cache.pop_by_message_id(msg_id)?;
        log::debug!("released message id {}", msg_id);
        Ok(request.state.after_release())
    }

    /// Drop an outstanding request by the caller's send PDU handle
    ///
    /// # Returns
    /// The message id and the new state
    pub fn release_by_send_pdu_handle(
        &mut self,
        send_pdu_handle: Handle,
    ) -> SnmpResult<(Handle, ExchangeState)> {
        let (msg_id, request) = self.cache.pop_by_send_pdu_handle(send_pdu_handle)?;
        log::debug!(
            "released message id {} (send handle {})",
            msg_id,
            send_pdu_handle
        );
        Ok((msg_id, request.state.after_release()))
    }

    /// State of the exchange under `msg_id`
    pub fn exchange_state(&self, msg_id: Handle) -> ExchangeState {
        if self.cache.contains_message_id(msg_id) {
            ExchangeState::Idle.after_cached()
        } else {
            ExchangeState::Idle
        }
    }

    /// Number of requests awaiting a response
    pub fn outstanding_requests(&self) -> usize {
        self.cache.message_count()
    }

    /// Number of incoming requests awaiting `generate_response`
    pub fn pending_responses(&self) -> usize {
        self.cache.state_reference_count()
    }

    /// Advance all clocks by one timer resolution
    pub fn receive_timer_tick(&mut self) -> TimerTick {
        let expired = self.cache.tick();
        let expired_timelines = self.timeline.tick();
        let expired_localized_users = self.users.tick();
        self.local.advance_ms(self.config.timer_resolution_ms);
        for msg_id in &expired.message_ids {
            log::debug!(
                "message id {} {}",
                msg_id,
                ExchangeState::Idle.after_cached().after_expiry()
            );
        }
        TimerTick {
            expired_requests: expired.message_ids,
            expired_state_references: expired.state_references,
            expired_timelines,
            expired_localized_users,
        }
    }

    fn is_local(&self, engine_id: &[u8]) -> bool {
        self.local.engine_id().as_slice() == engine_id
    }

    /// Boots and time to put in a message to `engine_id`
    fn clock_for(&self, engine_id: &[u8]) -> (u32, u32) {
        if self.is_local(engine_id) {
            (self.local.boots(), self.local.time())
        } else {
            self.timeline.estimate(engine_id).unwrap_or((0, 0))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn secure_outgoing(
        &mut self,
        msg_id: Handle,
        user: &UsmUser,
        level: SecurityLevel,
        engine_id: &[u8],
        boots: u32,
        time: u32,
        scoped_pdu: &[u8],
    ) -> SnmpResult<Vec<u8>> {
        let mut params = UsmSecurityParameters {
            engine_id: engine_id.to_vec(),
            engine_boots: boots,
            engine_time: time,
            user_name: user.user_name.clone(),
            ..UsmSecurityParameters::default()
        };

        let scoped_pdu = if level.is_encrypted() {
            let (protocol, key) = user.priv_key()?;
            let (ciphertext, salt) = self
                .privacy
                .encrypt(protocol, key, boots, time, scoped_pdu)?;
            params.priv_parameters = salt;
            ScopedPduData::Encrypted(ciphertext)
        } else {
            ScopedPduData::Plaintext(scoped_pdu.to_vec())
        };

        let auth = if level.is_authenticated() {
            let (protocol, key) = user.auth_key()?;
            params.auth_parameters = vec![0u8; protocol.digest_length()];
            Some((protocol, key))
        } else {
            None
        };

        let whole_msg = self.codec.encode(&OutgoingMessage {
            msg_id,
            security_level: level,
            security_parameters: params,
            scoped_pdu,
        })?;

        match auth {
            Some((protocol, key)) => Ok(protocol.authenticate_outgoing(key, &whole_msg)?),
            None => Ok(whole_msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthProtocol;
    use crate::privacy::PrivProtocol;
    use crate::usm::codec::IncomingMessage;
    use snmp_core::CacheError;

    const MANAGER: &[u8] = b"\x80\x00\x1f\x88\x01mgr";
    const AGENT: &[u8] = b"\x80\x00\x1f\x88\x01agent";

    /// Fixed layout: auth params first so the placeholder is found at offset 2
    struct FlatCodec;

    impl MessageCodec for FlatCodec {
        fn encode(&self, message: &OutgoingMessage) -> SnmpResult<Vec<u8>> {
            let params = &message.security_parameters;
            let mut out = vec![0x30, params.auth_parameters.len() as u8];
            out.extend_from_slice(&params.auth_parameters);
            out.extend_from_slice(&message.msg_id.to_be_bytes());
            out.push(message.security_level.id());
            out.push(u8::from(message.scoped_pdu.is_encrypted()));
            out.extend_from_slice(&params.engine_boots.to_be_bytes());
            out.extend_from_slice(&params.engine_time.to_be_bytes());
            for field in [
                &params.engine_id,
                &params.user_name,
                &params.priv_parameters,
            ] {
                out.push(field.len() as u8);
                out.extend_from_slice(field);
            }
            out.extend_from_slice(message.scoped_pdu.as_bytes());
            Ok(out)
        }

        fn decode(&self, whole_msg: &[u8]) -> SnmpResult<IncomingMessage> {
            let truncated = || SnmpError::Codec("truncated message".to_string());
            let mut pos = 0;
            let mut take = |n: usize| -> SnmpResult<Vec<u8>> {
                let bytes = whole_msg.get(pos..pos + n).ok_or_else(truncated)?.to_vec();
                pos += n;
                Ok(bytes)
            };
            take(1)?;
            let auth_len = take(1)?[0] as usize;
            let auth_parameters = take(auth_len)?;
            let msg_id = u32::from_be_bytes(take(4)?.try_into().map_err(|_| truncated())?);
            let header = take(2)?;
            let engine_boots = u32::from_be_bytes(take(4)?.try_into().map_err(|_| truncated())?);
            let engine_time = u32::from_be_bytes(take(4)?.try_into().map_err(|_| truncated())?);
            let mut fields = Vec::new();
            for _ in 0..3 {
                let len = take(1)?[0] as usize;
                fields.push(take(len)?);
            }
            let body = whole_msg.get(pos..).ok_or_else(truncated)?.to_vec();
            let priv_parameters = fields.pop().unwrap_or_default();
            let user_name = fields.pop().unwrap_or_default();
            let engine_id = fields.pop().unwrap_or_default();
            Ok(IncomingMessage {
                msg_id,
                security_level: header[0],
                security_parameters: UsmSecurityParameters {
                    engine_id,
                    engine_boots,
                    engine_time,
                    user_name,
                    auth_parameters,
                    priv_parameters,
                },
                scoped_pdu: if header[1] == 1 {
                    ScopedPduData::Encrypted(body)
                } else {
                    ScopedPduData::Plaintext(body)
                },
            })
        }

        fn pdu_class(&self, scoped_pdu: &[u8]) -> SnmpResult<PduClass> {
            match scoped_pdu.first().copied() {
                Some(0xA0 | 0xA1 | 0xA3 | 0xA5 | 0xA6) => Ok(PduClass::Confirmed),
                Some(0xA2 | 0xA8) => Ok(PduClass::Response),
                Some(0xA4 | 0xA7) => Ok(PduClass::Unconfirmed),
                _ => Err(SnmpError::Codec("unknown PDU type".to_string())),
            }
        }
    }

    fn model(local: &[u8]) -> UsmSecurityModel<FlatCodec> {
        let config = UsmConfig::builder().set_cache_ttl(3).build().unwrap();
        let local = LocalEngine::new(EngineId::from_slice(local).unwrap(), 1);
        let mut model = UsmSecurityModel::new(config, local, FlatCodec).unwrap();
        model
            .add_user(
                UsmUserEntry::builder(b"admin")
                    .set_auth(AuthProtocol::HmacSha256, b"auth-passphrase")
                    .set_privacy(PrivProtocol::Aes128, b"priv-passphrase")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
            .add_user(
                UsmUserEntry::builder(b"monitor")
                    .set_auth(AuthProtocol::HmacMd5, b"monitor-passphrase")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_request_is_cached_until_matched() {
        let mut manager = model(MANAGER);
        let (_, msg_id) = manager
            .generate_request(b"admin", AGENT, SecurityLevel::AuthPriv, &[0xA0, 1], 7)
            .unwrap();
        assert_eq!(manager.exchange_state(msg_id), ExchangeState::AwaitingCache);
        assert_eq!(manager.outstanding_requests(), 1);

        let matched = manager.match_response(msg_id).unwrap();
        assert_eq!(matched.send_pdu_handle, 7);
        assert_eq!(matched.request.state, ExchangeState::Matched);
        assert_eq!(matched.request.security_name, b"admin");
        assert_eq!(manager.exchange_state(msg_id), ExchangeState::Idle);
        assert!(matches!(
            manager.match_response(msg_id),
            Err(SnmpError::Cache(CacheError::CacheMiss(_)))
        ));
    }

    #[test]
    fn test_level_policy() {
        let mut manager = model(MANAGER);
        let result =
            manager.generate_request(b"monitor", AGENT, SecurityLevel::AuthPriv, &[0xA0], 1);
        assert!(matches!(
            result,
            Err(SnmpError::Security(SecurityError::UnsupportedSecurityLevel(_)))
        ));
        let result =
            manager.generate_request(b"ghost", AGENT, SecurityLevel::NoAuthNoPriv, &[0xA0], 1);
        assert!(matches!(
            result,
            Err(SnmpError::Security(SecurityError::UnknownSecurityName))
        ));
        assert_eq!(manager.outstanding_requests(), 0);
    }

    #[test]
    fn test_discovery_request() {
        let mut manager = model(MANAGER);
        let (wire, _) = manager
            .generate_request(b"", b"", SecurityLevel::NoAuthNoPriv, &[0xA0], 1)
            .unwrap();
        let mut agent = model(AGENT);
        let result = agent.process_incoming(&wire);
        assert!(matches!(
            result,
            Err(SnmpError::Security(SecurityError::UnknownEngineId))
        ));
        assert_eq!(agent.statistics().unknown_engine_ids, 1);

        let result = manager.generate_request(b"admin", b"", SecurityLevel::AuthNoPriv, &[0xA0], 2);
        assert!(matches!(
            result,
            Err(SnmpError::Security(SecurityError::UnknownEngineId))
        ));
    }

    #[test]
    fn test_release_and_expiry() {
        let mut manager = model(MANAGER);
        let (_, first) = manager
            .generate_request(b"monitor", AGENT, SecurityLevel::AuthNoPriv, &[0xA0], 1)
            .unwrap();
        let (_, second) = manager
            .generate_request(b"monitor", AGENT, SecurityLevel::AuthNoPriv, &[0xA0], 2)
            .unwrap();

        assert_eq!(manager.release(first).unwrap(), ExchangeState::ReleasedEarly);
        assert!(matches!(
            manager.release(first),
            Err(SnmpError::Cache(CacheError::CacheMiss(id))) if id == first
        ));

        assert!(manager.receive_timer_tick().expired_requests.is_empty());
        assert!(manager.receive_timer_tick().expired_requests.is_empty());
        assert_eq!(manager.receive_timer_tick().expired_requests, vec![second]);
        assert_eq!(manager.exchange_state(second), ExchangeState::Idle);
        assert!(manager.release_by_send_pdu_handle(2).is_err());
    }

    #[test]
    fn test_duplicate_send_handle() {
        let mut manager = model(MANAGER);
        manager
            .generate_request(b"monitor", AGENT, SecurityLevel::AuthNoPriv, &[0xA0], 9)
            .unwrap();
        let err = manager
            .generate_request(b"monitor", AGENT, SecurityLevel::AuthNoPriv, &[0xA0], 9)
            .unwrap_err();
        assert!(err.is_retryable());
        let (msg_id, state) = manager.release_by_send_pdu_handle(9).unwrap();
        assert_eq!(state, ExchangeState::ReleasedEarly);
        assert_eq!(manager.exchange_state(msg_id), ExchangeState::Idle);
    }

    #[test]
    fn test_forged_messages_leave_no_localized_keys() {
        let mut manager = model(MANAGER);
        let mut agent = model(AGENT);
        for i in 0..50u8 {
            let engine_id = [0x80, 0, 0x1f, 0x88, 0x04, i];
            let level = SecurityLevel::AuthNoPriv;
            let (mut wire, _) = manager
                .generate_request(b"monitor", &engine_id, level, &[0xA7], u32::from(i))
                .unwrap();
            wire[2] ^= 0xFF;
            assert!(agent.process_incoming(&wire).is_err());
            assert!(!agent.timeline().contains(&engine_id));
        }
        assert_eq!(agent.statistics().wrong_digests, 50);
        assert_eq!(agent.users().localized_count(), 0);

        let engine_id = [0x80, 0, 0x1f, 0x88, 0x04, 0xFF];
        let (wire, _) = manager
            .generate_request(b"monitor", &engine_id, SecurityLevel::AuthNoPriv, &[0xA7], 99)
            .unwrap();
        agent.process_incoming(&wire).unwrap();
        assert_eq!(agent.users().localized_count(), 1);

        let lifetime = agent.config().timeline_lifetime_ticks();
        let dropped: usize = (0..lifetime)
            .map(|_| agent.receive_timer_tick().expired_localized_users)
            .sum();
        assert_eq!(dropped, 1);
        assert_eq!(agent.users().localized_count(), 0);
    }

    #[test]
    fn test_timer_advances_local_clock() {
        let mut agent = model(AGENT);
        for _ in 0..4 {
            agent.receive_timer_tick();
        }
        assert_eq!(agent.local_engine().time(), 2);
    }

    #[test]
    fn test_unknown_security_level_value() {
        let mut manager = model(MANAGER);
        let (mut wire, _) = manager
            .generate_request(b"", AGENT, SecurityLevel::NoAuthNoPriv, &[0xA0], 1)
            .unwrap();
        // auth params empty: header(2) + msg id(4), then the level byte
        wire[6] = 7;
        let mut agent = model(AGENT);
        assert!(matches!(
            agent.process_incoming(&wire),
            Err(SnmpError::Protocol(_))
        ));
        assert_eq!(agent.statistics().total_discarded(), 0);
    }
}
