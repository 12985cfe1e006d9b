//! Core types and utilities for the SNMPv3 security core
//!
//! This crate provides the error taxonomy, the correlation handle type,
//! authoritative engine identifiers and the identifier generator used
//! throughout the workspace.

pub mod error;
pub mod engine_id;
pub mod nextid;

pub use engine_id::EngineId;
pub use error::{CacheError, SecurityError, SnmpError, SnmpResult};
pub use nextid::IdGenerator;

/// Correlation handle (message id or state reference)
pub type Handle = u32;
