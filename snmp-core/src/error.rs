use thiserror::Error;

/// Main error type for SNMP security core operations
#[derive(Error, Debug)]
pub enum SnmpError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl SnmpError {
    /// Whether retrying with fresh inputs (a new handle) may succeed
    ///
    /// Only handle collisions qualify. Security failures are never retryable
    /// with the same inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SnmpError::Cache(CacheError::DuplicateHandle(_)))
    }

    /// Whether this error belongs to the "drop and count" security family
    pub fn is_security(&self) -> bool {
        matches!(self, SnmpError::Security(_))
    }
}

/// Security service failures
///
/// None of these messages carry key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("authentication failure")]
    AuthenticationFailure,

    #[error("authentication error: {0}")]
    AuthenticationError(String),

    #[error("bad MAC length: expected {expected}, got {actual}")]
    BadMacLength { expected: usize, actual: usize },

    #[error("cannot locate digest placeholder")]
    PlaceholderNotFound,

    #[error("cannot locate digest in message")]
    DigestNotFound,

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("unsupported privacy protocol: {0}")]
    UnsupportedPrivProtocol(String),

    #[error("unsupported authentication protocol: {0}")]
    UnsupportedAuthProtocol(String),

    #[error("unsupported security level: {0}")]
    UnsupportedSecurityLevel(String),

    #[error("not in time window")]
    NotInTimeWindow,

    #[error("unknown security name")]
    UnknownSecurityName,

    #[error("unknown engine ID")]
    UnknownEngineId,

    #[error("no authentication configured")]
    NoAuthentication,

    #[error("no encryption configured")]
    NoEncryption,
}

/// Cache bookkeeping failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    #[error("duplicate handle {0}")]
    DuplicateHandle(u32),

    #[error("cache miss for handle {0}")]
    CacheMiss(u32),
}

/// Result type alias for SNMP security core operations
pub type SnmpResult<T> = Result<T, SnmpError>;
