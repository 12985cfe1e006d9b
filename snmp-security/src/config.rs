//! Security model configuration

use crate::constants::{TIMELINE_LIFETIME_SECS, TIME_WINDOW_SECS};
use crate::localkey::KeyExtension;
use serde::{Deserialize, Serialize};
use snmp_cache::{CacheConfig, DEFAULT_TTL};
use snmp_core::nextid::{DEFAULT_INCREMENT, DEFAULT_MAXIMUM};
use snmp_core::{SnmpError, SnmpResult};

/// Default timer tick length in milliseconds
pub const DEFAULT_TIMER_RESOLUTION_MS: u64 = 500;

/// USM configuration
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsmConfig {
    /// Lifetime of cached message state, in ticks
    pub cache_ttl: u64,
    /// Exclusive upper bound for message ids and state references
    pub id_maximum: u32,
    /// Identifier generator bank size
    pub id_increment: u32,
    /// Length of one `receive_timer_tick`, in milliseconds
    pub timer_resolution_ms: u64,
    /// Accepted clock skew for authenticated messages, in seconds
    pub time_window_secs: u32,
    /// Lifetime of a remote engine timeline entry, in seconds
    pub timeline_lifetime_secs: u32,
    /// Key extension for AES-192/256 privacy keys
    pub key_extension: Option<KeyExtension>,
}

impl UsmConfig {
    /// Create a configuration builder
    pub fn builder() -> UsmConfigBuilder {
        UsmConfigBuilder::new()
    }

    /// Cache settings derived from this configuration
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.cache_ttl,
            id_maximum: self.id_maximum,
            id_increment: self.id_increment,
        }
    }

    /// Convert a duration in seconds to timer ticks (at least one)
    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        let resolution = self.timer_resolution_ms.max(1);
        (u64::from(secs) * 1000 / resolution).max(1)
    }

    /// Timeline entry lifetime in ticks
    pub fn timeline_lifetime_ticks(&self) -> u64 {
        self.secs_to_ticks(self.timeline_lifetime_secs)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `SnmpError::InvalidData` naming the first offending field
    pub fn validate(&self) -> SnmpResult<()> {
        if self.cache_ttl == 0 {
            return Err(SnmpError::InvalidData(
                "cache_ttl must be positive".to_string(),
            ));
        }
        if self.id_maximum == 0 {
            return Err(SnmpError::InvalidData(
                "id_maximum must be positive".to_string(),
            ));
        }
        if self.id_increment == 0 || self.id_increment > self.id_maximum {
            return Err(SnmpError::InvalidData(format!(
                "id_increment must be in 1..={}, got {}",
                self.id_maximum, self.id_increment
            )));
        }
        if self.timer_resolution_ms == 0 {
            return Err(SnmpError::InvalidData(
                "timer_resolution_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for UsmConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            id_maximum: DEFAULT_MAXIMUM,
            id_increment: DEFAULT_INCREMENT,
            timer_resolution_ms: DEFAULT_TIMER_RESOLUTION_MS,
            time_window_secs: TIME_WINDOW_SECS,
            timeline_lifetime_secs: TIMELINE_LIFETIME_SECS,
            key_extension: None,
        }
    }
}

/// Builder for `UsmConfig`
pub struct UsmConfigBuilder {
    config: UsmConfig,
}

impl UsmConfigBuilder {
    /// Create a builder holding the default configuration
    pub fn new() -> Self {
        Self {
            config: UsmConfig::default(),
        }
    }

    /// Set the cache entry lifetime in ticks
    pub fn set_cache_ttl(mut self, ticks: u64) -> Self {
        self.config.cache_ttl = ticks;
        self
    }

    /// Set the identifier range and bank size
    pub fn set_id_range(mut self, maximum: u32, increment: u32) -> Self {
        self.config.id_maximum = maximum;
        self.config.id_increment = increment;
        self
    }

    /// Set the timer tick length
    pub fn set_timer_resolution_ms(mut self, resolution: u64) -> Self {
        self.config.timer_resolution_ms = resolution;
        self
    }

    /// Set the accepted clock skew
    pub fn set_time_window_secs(mut self, secs: u32) -> Self {
        self.config.time_window_secs = secs;
        self
    }

    /// Set the remote timeline lifetime
    pub fn set_timeline_lifetime_secs(mut self, secs: u32) -> Self {
        self.config.timeline_lifetime_secs = secs;
        self
    }

    /// Set the AES-192/256 key extension mode
    pub fn set_key_extension(mut self, mode: KeyExtension) -> Self {
        self.config.key_extension = Some(mode);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> SnmpResult<UsmConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for UsmConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
