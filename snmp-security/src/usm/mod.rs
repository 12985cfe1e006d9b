//! User-based Security Model
//!
//! - `params`: security level and UsmSecurityParameters
//! - `codec`: seam to the message serialization layer
//! - `user`: user table and key localization cache
//! - `timeline`: local and remote engine clocks
//! - `state`: request lifecycle
//! - `statistics`: discard counters
//! - `model`: the security model tying them together

pub mod codec;
pub mod model;
pub mod params;
pub mod state;
pub mod statistics;
pub mod timeline;
pub mod user;

pub use codec::{IncomingMessage, MessageCodec, OutgoingMessage, PduClass, ScopedPduData};
pub use model::{
    MatchedRequest, OutstandingRequest, ProcessedMessage, ResponseState, TimerTick,
    UsmSecurityModel,
};
pub use params::{SecurityLevel, UsmSecurityParameters};
pub use state::ExchangeState;
pub use statistics::UsmStatistics;
pub use timeline::{EngineTimeline, LocalEngine, TimelineEntry};
pub use user::{UserTable, UsmUser, UsmUserBuilder, UsmUserEntry};
