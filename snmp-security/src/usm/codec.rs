//! Seam to the message serialization layer
//!
//! The security model never parses BER. The calling layer supplies a
//! `MessageCodec` that serializes a whole message from its parts and splits
//! a received message back into them.

use crate::usm::params::{SecurityLevel, UsmSecurityParameters};
use snmp_core::{Handle, SnmpResult};

/// PDU class of a scoped PDU (RFC 3411 section 2.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduClass {
    /// Get, GetNext, GetBulk, Set, Inform
    Confirmed,
    /// Response, Report
    Response,
    /// Trap, SNMPv2-Trap
    Unconfirmed,
}

/// msgData: plaintext or encrypted scoped PDU bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedPduData {
    Plaintext(Vec<u8>),
    Encrypted(Vec<u8>),
}

impl ScopedPduData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Plaintext(bytes) | Self::Encrypted(bytes) => bytes,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

/// Message parts handed to `MessageCodec::encode`
///
/// When authenticating, `security_parameters.auth_parameters` holds a zero
/// placeholder of the MAC length. The codec must copy it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub msg_id: Handle,
    pub security_level: SecurityLevel,
    pub security_parameters: UsmSecurityParameters,
    pub scoped_pdu: ScopedPduData,
}

/// Message parts returned by `MessageCodec::decode`
///
/// `security_level` is the raw msgFlags level and is validated by the
/// security model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub msg_id: Handle,
    pub security_level: u8,
    pub security_parameters: UsmSecurityParameters,
    pub scoped_pdu: ScopedPduData,
}

/// Message serialization supplied by the calling layer
pub trait MessageCodec {
    /// Serialize a whole message
    fn encode(&self, message: &OutgoingMessage) -> SnmpResult<Vec<u8>>;

    /// Split a received message into its parts
    fn decode(&self, whole_msg: &[u8]) -> SnmpResult<IncomingMessage>;

    /// Classify a plaintext scoped PDU
    fn pdu_class(&self, scoped_pdu: &[u8]) -> SnmpResult<PduClass>;
}
