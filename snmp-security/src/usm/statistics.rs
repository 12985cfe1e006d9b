//! USM statistics (usmStats group of SNMP-USER-BASED-SM-MIB)

/// Counters for silently discarded incoming messages
///
/// Updated by `UsmSecurityModel::process_incoming` whenever a message is
/// dropped for one of the reasons RFC 3414 counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsmStatistics {
    /// usmStatsUnsupportedSecLevels
    pub unsupported_sec_levels: u64,
    /// usmStatsNotInTimeWindows
    pub not_in_time_windows: u64,
    /// usmStatsUnknownUserNames
    pub unknown_user_names: u64,
    /// usmStatsUnknownEngineIDs
    pub unknown_engine_ids: u64,
    /// usmStatsWrongDigests
    pub wrong_digests: u64,
    /// usmStatsDecryptionErrors
    pub decryption_errors: u64,
}

impl UsmStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn increment_unsupported_sec_levels(&mut self) {
        self.unsupported_sec_levels += 1;
    }

    pub fn increment_not_in_time_windows(&mut self) {
        self.not_in_time_windows += 1;
    }

    pub fn increment_unknown_user_names(&mut self) {
        self.unknown_user_names += 1;
    }

    pub fn increment_unknown_engine_ids(&mut self) {
        self.unknown_engine_ids += 1;
    }

    pub fn increment_wrong_digests(&mut self) {
        self.wrong_digests += 1;
    }

    pub fn increment_decryption_errors(&mut self) {
        self.decryption_errors += 1;
    }

    /// Total number of discarded messages
    pub fn total_discarded(&self) -> u64 {
        self.unsupported_sec_levels
            + self.not_in_time_windows
            + self.unknown_user_names
            + self.unknown_engine_ids
            + self.wrong_digests
            + self.decryption_errors
    }
}
