//! Expiring caches for request/response correlation
//!
//! Entries are keyed by a handle, scheduled for expiration at
//! `clock + ttl` and evicted when the caller-driven clock reaches that tick.
//!
//! - `ExpiringCache`: a single handle space
//! - `MessageCache`: message ids and state references under one shared clock,
//!   with the identifier generators for both kinds

pub mod expiring;
pub mod message;

pub use expiring::{ExpirationIndex, ExpiringCache, DEFAULT_TTL};
pub use message::{CacheConfig, ExpiredHandles, MessageCache};
