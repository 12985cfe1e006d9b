//! Engine clocks (RFC 3414 section 2.3 and 3.2.7)
//!
//! `LocalEngine` is this engine's own snmpEngineID, snmpEngineBoots and
//! snmpEngineTime, used when acting as the authoritative engine.
//! `EngineTimeline` holds the notion of each remote authoritative engine's
//! clock learned from authenticated messages. Entries expire when not
//! refreshed within the configured lifetime.

use crate::constants::MAX_ENGINE_BOOTS;
use snmp_cache::ExpirationIndex;
use snmp_core::EngineId;

/// Local authoritative engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEngine {
    engine_id: EngineId,
    boots: u32,
    elapsed_ms: u64,
}

impl LocalEngine {
    /// Create a local engine whose clock starts at zero
    pub fn new(engine_id: EngineId, boots: u32) -> Self {
        Self {
            engine_id,
            boots,
            elapsed_ms: 0,
        }
    }

    pub fn engine_id(&self) -> &EngineId {
        &self.engine_id
    }

    /// snmpEngineBoots
    pub fn boots(&self) -> u32 {
        self.boots
    }

    /// snmpEngineTime in seconds since the last boot
    pub fn time(&self) -> u32 {
        u32::try_from(self.elapsed_ms / 1000).unwrap_or(u32::MAX)
    }

    /// Advance snmpEngineTime
    ///
    /// Wraps boots and restarts the clock when time passes its maximum
    /// (RFC 3414 2.2.2).
    pub fn advance_ms(&mut self, ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
        if self.elapsed_ms / 1000 > u64::from(MAX_ENGINE_BOOTS) {
            self.boots = self.boots.saturating_add(1).min(MAX_ENGINE_BOOTS);
            self.elapsed_ms = 0;
        }
    }

    /// Record a reboot: boots increments and time restarts at zero
    pub fn reboot(&mut self) {
        self.boots = self.boots.saturating_add(1).min(MAX_ENGINE_BOOTS);
        self.elapsed_ms = 0;
    }

    /// Check a message addressed to this engine against the time window
    /// (RFC 3414 3.2.7a)
    pub fn in_time_window(&self, msg_boots: u32, msg_time: u32, window_secs: u32) -> bool {
        self.boots != MAX_ENGINE_BOOTS
            && self.boots == msg_boots
            && self.time().abs_diff(msg_time) <= window_secs
    }
}

/// Cached clock of one remote authoritative engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// snmpEngineBoots
    pub boots: u32,
    /// snmpEngineTime when the entry was last updated
    pub time: u32,
    /// Largest snmpEngineTime received for the current boots value
    pub latest_received_time: u32,
    /// Timeline tick of the last update
    pub updated_at: u64,
}

/// Per remote engine clock estimates with tick-driven expiry
pub struct EngineTimeline {
    clock: u64,
    lifetime_ticks: u64,
    resolution_ms: u64,
    entries: ExpirationIndex<Vec<u8>, TimelineEntry>,
}

impl EngineTimeline {
    /// # Arguments
    /// * `lifetime_ticks` - Ticks without update after which an entry is dropped
    /// * `resolution_ms` - Length of one tick
    pub fn new(lifetime_ticks: u64, resolution_ms: u64) -> Self {
        Self {
            clock: 0,
            lifetime_ticks: lifetime_ticks.max(1),
            resolution_ms: resolution_ms.max(1),
            entries: ExpirationIndex::new(),
        }
    }

    pub fn get(&self, engine_id: &[u8]) -> Option<&TimelineEntry> {
        self.entries.get(&engine_id.to_vec())
    }

    pub fn contains(&self, engine_id: &[u8]) -> bool {
        self.entries.contains(&engine_id.to_vec())
    }

    /// Seconds since the entry was last updated
    pub fn idle_secs(&self, entry: &TimelineEntry) -> u32 {
        let idle_ms = self.clock.saturating_sub(entry.updated_at) * self.resolution_ms;
        u32::try_from(idle_ms / 1000).unwrap_or(u32::MAX)
    }

    /// Current estimate of a remote engine's boots and time
    pub fn estimate(&self, engine_id: &[u8]) -> Option<(u32, u32)> {
        self.get(engine_id)
            .map(|entry| (entry.boots, entry.time.saturating_add(self.idle_secs(entry))))
    }

    /// Store a new clock for `engine_id` and restart its lifetime
    pub fn update(&mut self, engine_id: &[u8], boots: u32, time: u32) {
        let key = engine_id.to_vec();
        self.entries.remove(&key);
        let entry = TimelineEntry {
            boots,
            time,
            latest_received_time: time,
            updated_at: self.clock,
        };
        let expire_at = self.clock + self.lifetime_ticks;
        // The key was removed above, so the insert cannot collide
        let _ = self.entries.insert(key, entry, expire_at);
        log::debug!(
            "timeline for engine {:02x?}: boots {} time {}",
            engine_id,
            boots,
            time
        );
    }

    /// Apply RFC 3414 3.2.7b to an authenticated message from a remote
    /// authoritative engine
    ///
    /// An engine without an entry is learned from the message. Otherwise the
    /// entry is advanced when the message is newer (3.2.7b.1) and the message
    /// is checked against the estimate taken before the update (3.2.7b.2).
    ///
    /// # Returns
    /// `true` if the message is inside the time window
    pub fn check_and_update(
        &mut self,
        engine_id: &[u8],
        msg_boots: u32,
        msg_time: u32,
        window_secs: u32,
    ) -> bool {
        let Some(entry) = self.get(engine_id).copied() else {
            self.update(engine_id, msg_boots, msg_time);
            return msg_boots != MAX_ENGINE_BOOTS;
        };
        let estimated_time = entry.time.saturating_add(self.idle_secs(&entry));

        if msg_boots > entry.boots
            || (msg_boots == entry.boots && msg_time > entry.latest_received_time)
        {
            self.update(engine_id, msg_boots, msg_time);
        }

        !(entry.boots == MAX_ENGINE_BOOTS
            || msg_boots < entry.boots
            || (msg_boots == entry.boots && estimated_time.abs_diff(msg_time) > window_secs))
    }

    /// Advance the timeline clock and drop entries not refreshed in time
    ///
    /// # Returns
    /// Number of dropped entries
    pub fn tick(&mut self) -> usize {
        self.clock += 1;
        let expired = self.entries.expire(self.clock);
        for (engine_id, _) in &expired {
            log::debug!("timeline for engine {:02x?} expired", engine_id);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
