//! Message-id and state-reference caches under one clock
//!
//! The message processing layer caches two kinds of state:
//!
//! - **message id**: an outstanding request waiting for its response,
//!   also reachable through the caller's send PDU handle
//! - **state reference**: data kept for an incoming request until the
//!   response to it is generated
//!
//! Both kinds share a clock and a TTL but keep independent maps and
//! expiration buckets, and each kind draws its handles from its own
//! `IdGenerator`.

use crate::expiring::{ExpirationIndex, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use snmp_core::nextid::{DEFAULT_INCREMENT, DEFAULT_MAXIMUM};
use snmp_core::{CacheError, Handle, IdGenerator, SnmpError, SnmpResult};
use std::collections::HashMap;
use std::fmt;

/// Cache sizing and handle range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in ticks
    pub ttl: u64,
    /// Exclusive upper bound for generated handles
    pub id_maximum: u32,
    /// Identifier generator bank size
    pub id_increment: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            id_maximum: DEFAULT_MAXIMUM,
            id_increment: DEFAULT_INCREMENT,
        }
    }
}

impl CacheConfig {
    /// Check the handle range
    ///
    /// `ttl` and `id_increment` are clamped by the cache, only an empty handle
    /// range is rejected.
    ///
    /// # Errors
    /// `SnmpError::InvalidData` if `id_maximum` is 0
    pub fn validate(&self) -> SnmpResult<()> {
        if self.id_maximum == 0 {
            return Err(SnmpError::InvalidData(
                "id_maximum must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Handles evicted by one `MessageCache::tick`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiredHandles {
    pub message_ids: Vec<Handle>,
    pub state_references: Vec<Handle>,
}

impl ExpiredHandles {
    pub fn len(&self) -> usize {
        self.message_ids.len() + self.state_references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty() && self.state_references.is_empty()
    }
}

struct Outstanding<M> {
    send_pdu_handle: Handle,
    info: M,
}

/// Two-kind expiring cache
///
/// `M` is the per-request payload cached by message id, `S` the per-incoming
/// request payload cached by state reference.
pub struct MessageCache<M, S> {
    clock: u64,
    ttl: u64,
    message_ids: IdGenerator,
    state_references: IdGenerator,
    by_message_id: ExpirationIndex<Handle, Outstanding<M>>,
    by_state_reference: ExpirationIndex<Handle, S>,
    by_send_pdu_handle: HashMap<Handle, Handle>,
}

impl<M, S> MessageCache<M, S> {
    /// Create a cache with freshly seeded identifier generators
    ///
    /// # Errors
    /// `SnmpError::InvalidData` if the configuration does not validate
    pub fn new(config: CacheConfig) -> SnmpResult<Self> {
        config.validate()?;
        Ok(Self::with_generators(
            config.ttl,
            IdGenerator::new(config.id_maximum, config.id_increment),
            IdGenerator::new(config.id_maximum, config.id_increment),
        ))
    }

    /// Create a cache with caller-supplied generators
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime in ticks (0 is raised to 1)
    /// * `message_ids` - Generator for message ids
    /// * `state_references` - Generator for state references
    pub fn with_generators(
        ttl: u64,
        message_ids: IdGenerator,
        state_references: IdGenerator,
    ) -> Self {
        Self {
            clock: 0,
            ttl: ttl.max(1),
            message_ids,
            state_references,
            by_message_id: ExpirationIndex::new(),
            by_state_reference: ExpirationIndex::new(),
            by_send_pdu_handle: HashMap::new(),
        }
    }

    /// Draw a fresh message id
    pub fn new_message_id(&mut self) -> Handle {
        self.message_ids.next_id()
    }

    /// Draw a fresh state reference
    pub fn new_state_reference(&mut self) -> Handle {
        self.state_references.next_id()
    }

    /// Cache an outstanding request
    ///
    /// # Arguments
    /// * `msg_id` - Message id carried by the request
    /// * `send_pdu_handle` - Caller's handle for the same request
    /// * `info` - Data needed to process the response
    ///
    /// # Errors
    /// `CacheError::DuplicateHandle` if either handle is already outstanding.
    /// Nothing is stored in that case.
    pub fn push_by_message_id(
        &mut self,
        msg_id: Handle,
        send_pdu_handle: Handle,
        info: M,
    ) -> Result<(), CacheError> {
        if self.by_message_id.contains(&msg_id) {
            return Err(CacheError::DuplicateHandle(msg_id));
        }
        if self.by_send_pdu_handle.contains_key(&send_pdu_handle) {
            return Err(CacheError::DuplicateHandle(send_pdu_handle));
        }
        let expire_at = self.clock + self.ttl;
        let outstanding = Outstanding {
            send_pdu_handle,
            info,
        };
        if self
            .by_message_id
            .insert(msg_id, outstanding, expire_at)
            .is_err()
        {
            return Err(CacheError::DuplicateHandle(msg_id));
        }
        self.by_send_pdu_handle.insert(send_pdu_handle, msg_id);
        log::debug!(
            "cached message id {} (send handle {}) until tick {}",
            msg_id,
            send_pdu_handle,
            expire_at
        );
        Ok(())
    }

    /// Remove an outstanding request by message id
    ///
    /// # Returns
    /// The send PDU handle and the cached data
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if the id is not outstanding
    pub fn pop_by_message_id(&mut self, msg_id: Handle) -> Result<(Handle, M), CacheError> {
        let outstanding = self
            .by_message_id
            .remove(&msg_id)
            .ok_or(CacheError::CacheMiss(msg_id))?;
        self.by_send_pdu_handle.remove(&outstanding.send_pdu_handle);
        Ok((outstanding.send_pdu_handle, outstanding.info))
    }

    /// Remove an outstanding request by the caller's send PDU handle
    ///
    /// # Returns
    /// The message id and the cached data
    ///
    /// # Errors
    /// `CacheError::CacheMiss` with the send PDU handle if it is not outstanding
    pub fn pop_by_send_pdu_handle(
        &mut self,
        send_pdu_handle: Handle,
    ) -> Result<(Handle, M), CacheError> {
        let msg_id = self
            .by_send_pdu_handle
            .remove(&send_pdu_handle)
            .ok_or(CacheError::CacheMiss(send_pdu_handle))?;
        let outstanding = self
            .by_message_id
            .remove(&msg_id)
            .ok_or(CacheError::CacheMiss(send_pdu_handle))?;
        Ok((msg_id, outstanding.info))
    }

    /// Message id of the request sent under `send_pdu_handle`
    pub fn message_id_for(&self, send_pdu_handle: Handle) -> Option<Handle> {
        self.by_send_pdu_handle.get(&send_pdu_handle).copied()
    }

    /// Cache state for an incoming request
    ///
    /// # Errors
    /// `CacheError::DuplicateHandle` if the reference is already cached
    pub fn push_by_state_reference(
        &mut self,
        state_reference: Handle,
        info: S,
    ) -> Result<(), CacheError> {
        let expire_at = self.clock + self.ttl;
        self.by_state_reference
            .insert(state_reference, info, expire_at)
            .map_err(|_| CacheError::DuplicateHandle(state_reference))?;
        log::debug!(
            "cached state reference {} until tick {}",
            state_reference,
            expire_at
        );
        Ok(())
    }

    /// Remove the state cached for an incoming request
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if the reference is not cached
    pub fn pop_by_state_reference(&mut self, state_reference: Handle) -> Result<S, CacheError> {
        self.by_state_reference
            .remove(&state_reference)
            .ok_or(CacheError::CacheMiss(state_reference))
    }

    /// Advance the shared clock and evict both kinds scheduled for the new tick
    pub fn tick(&mut self) -> ExpiredHandles {
        self.clock += 1;

        let mut expired = ExpiredHandles::default();
        for (msg_id, outstanding) in self.by_message_id.expire(self.clock) {
            self.by_send_pdu_handle.remove(&outstanding.send_pdu_handle);
            expired.message_ids.push(msg_id);
        }
        expired.state_references = self
            .by_state_reference
            .expire(self.clock)
            .into_iter()
            .map(|(state_reference, _)| state_reference)
            .collect();

        if !expired.is_empty() {
            log::debug!(
                "tick {}: expired {} message ids, {} state references",
                self.clock,
                expired.message_ids.len(),
                expired.state_references.len()
            );
        }
        expired
    }

    pub fn contains_message_id(&self, msg_id: Handle) -> bool {
        self.by_message_id.contains(&msg_id)
    }

    pub fn contains_state_reference(&self, state_reference: Handle) -> bool {
        self.by_state_reference.contains(&state_reference)
    }

    /// Number of outstanding requests
    pub fn message_count(&self) -> usize {
        self.by_message_id.len()
    }

    /// Number of cached incoming-request states
    pub fn state_reference_count(&self) -> usize {
        self.by_state_reference.len()
    }

    /// Number of entries in the send PDU handle index
    pub fn send_pdu_handle_count(&self) -> usize {
        self.by_send_pdu_handle.len()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }
}

impl<M, S> Default for MessageCache<M, S> {
    fn default() -> Self {
        Self::with_generators(DEFAULT_TTL, IdGenerator::default(), IdGenerator::default())
    }
}

impl<M, S> fmt::Debug for MessageCache<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCache")
            .field("clock", &self.clock)
            .field("ttl", &self.ttl)
            .field("message_ids", &self.by_message_id.len())
            .field("state_references", &self.by_state_reference.len())
            .finish()
    }
}
