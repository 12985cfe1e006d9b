#![allow(dead_code)]

//! Length-prefixed message codec for exercising the security model
//!
//! Layout (big endian):
//! `0x30 | u16 auth len | auth | u32 msg id | u8 level | u8 encrypted |
//! u32 boots | u32 time | u16 len engine id | u16 len user | u16 len priv |
//! u16 len scoped PDU`, each `u16 len` followed by its bytes. The MAC comes
//! first so its placeholder is always the first zero run of its length.

use snmp_core::{SnmpError, SnmpResult};
use snmp_security::usm::{
    IncomingMessage, MessageCodec, OutgoingMessage, PduClass, ScopedPduData,
    UsmSecurityParameters,
};

pub const GET_REQUEST: u8 = 0xA0;
pub const RESPONSE: u8 = 0xA2;
pub const SNMPV2_TRAP: u8 = 0xA7;

pub struct LengthPrefixedCodec;

fn put_field(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u16).to_be_bytes());
    out.extend_from_slice(field);
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> SnmpResult<&'a [u8]> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + n)
            .ok_or_else(|| SnmpError::Codec(format!("truncated at offset {}", self.pos)))?;
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> SnmpResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> SnmpResult<u16> {
        let bytes = self.bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> SnmpResult<u32> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn field(&mut self) -> SnmpResult<Vec<u8>> {
        let len = self.u16()? as usize;
        Ok(self.bytes(len)?.to_vec())
    }
}

impl MessageCodec for LengthPrefixedCodec {
    fn encode(&self, message: &OutgoingMessage) -> SnmpResult<Vec<u8>> {
        let params = &message.security_parameters;
        let mut out = vec![0x30];
        put_field(&mut out, &params.auth_parameters);
        out.extend_from_slice(&message.msg_id.to_be_bytes());
        out.push(message.security_level.id());
        out.push(u8::from(message.scoped_pdu.is_encrypted()));
        out.extend_from_slice(&params.engine_boots.to_be_bytes());
        out.extend_from_slice(&params.engine_time.to_be_bytes());
        put_field(&mut out, &params.engine_id);
        put_field(&mut out, &params.user_name);
        put_field(&mut out, &params.priv_parameters);
        put_field(&mut out, message.scoped_pdu.as_bytes());
        Ok(out)
    }

    fn decode(&self, whole_msg: &[u8]) -> SnmpResult<IncomingMessage> {
        let mut reader = Reader {
            buf: whole_msg,
            pos: 0,
        };
        if reader.u8()? != 0x30 {
            return Err(SnmpError::Codec("bad message tag".to_string()));
        }
        let auth_parameters = reader.field()?;
        let msg_id = reader.u32()?;
        let security_level = reader.u8()?;
        let encrypted = reader.u8()? == 1;
        let engine_boots = reader.u32()?;
        let engine_time = reader.u32()?;
        let engine_id = reader.field()?;
        let user_name = reader.field()?;
        let priv_parameters = reader.field()?;
        let data = reader.field()?;
        Ok(IncomingMessage {
            msg_id,
            security_level,
            security_parameters: UsmSecurityParameters {
                engine_id,
                engine_boots,
                engine_time,
                user_name,
                auth_parameters,
                priv_parameters,
            },
            scoped_pdu: if encrypted {
                ScopedPduData::Encrypted(data)
            } else {
                ScopedPduData::Plaintext(data)
            },
        })
    }

    fn pdu_class(&self, scoped_pdu: &[u8]) -> SnmpResult<PduClass> {
        match scoped_pdu.first().copied() {
            Some(0xA0 | 0xA1 | 0xA3 | 0xA5 | 0xA6) => Ok(PduClass::Confirmed),
            Some(0xA2 | 0xA8) => Ok(PduClass::Response),
            Some(0xA4 | 0xA7) => Ok(PduClass::Unconfirmed),
            other => Err(SnmpError::Codec(format!("unknown PDU type {:?}", other))),
        }
    }
}
