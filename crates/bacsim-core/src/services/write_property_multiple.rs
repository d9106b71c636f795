//! WritePropertyMultiple codec.
//!
//! Mirrors the ReadPropertyMultiple request structure with a per-entry
//! priority and value. A fully successful request is answered with a
//! SimpleAck; any failures come back as a ComplexAck carrying flat
//! (object, property, class, code) records.

use alloc::vec::Vec;

use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{context_marker, decode_value, encode_value};
use crate::types::{ObjectId, PropertyId, Value};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WRITE_PROPERTY_MULTIPLE: u8 = 0x11;

const PROPERTY_LIST_MARKER: u8 = context_marker(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteEntry<'a> {
    pub property_id: PropertyId,
    pub priority: u8,
    pub value: Value<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteAccessSpec<'a> {
    pub object_id: ObjectId,
    pub entries: Vec<WriteEntry<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyMultipleRequest<'a> {
    pub specs: Vec<WriteAccessSpec<'a>>,
}

impl<'a> WritePropertyMultipleRequest<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_WRITE_PROPERTY_MULTIPLE).encode(w)?;
        for spec in &self.specs {
            if spec.entries.len() > u8::MAX as usize {
                return Err(EncodeError::InvalidLength);
            }
            spec.object_id.encode(w)?;
            w.write_u8(PROPERTY_LIST_MARKER)?;
            w.write_u8(spec.entries.len() as u8)?;
            for entry in &spec.entries {
                w.write_be_u16(entry.property_id.to_u16())?;
                w.write_u8(entry.priority)?;
                encode_value(w, &entry.value)?;
            }
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let mut specs = Vec::new();
        while !r.is_empty() {
            let object_id = ObjectId::decode(r)?;
            if r.read_u8()? != PROPERTY_LIST_MARKER {
                return Err(DecodeError::InvalidTag);
            }
            let count = r.read_u8()? as usize;
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                entries.push(WriteEntry {
                    property_id: PropertyId::from_u16(r.read_be_u16()?),
                    priority: r.read_u8()?,
                    value: decode_value(r)?,
                });
            }
            specs.push(WriteAccessSpec { object_id, entries });
        }
        if specs.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        Ok(Self { specs })
    }
}

/// One failed write: eight bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFailure {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub class: u8,
    pub code: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePropertyMultipleAck {
    pub failures: Vec<WriteFailure>,
}

impl WritePropertyMultipleAck {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, SERVICE_WRITE_PROPERTY_MULTIPLE).encode(w)?;
        for failure in &self.failures {
            failure.object_id.encode(w)?;
            w.write_be_u16(failure.property_id.to_u16())?;
            w.write_u8(failure.class)?;
            w.write_u8(failure.code)?;
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut failures = Vec::new();
        while !r.is_empty() {
            failures.push(WriteFailure {
                object_id: ObjectId::decode(r)?,
                property_id: PropertyId::from_u16(r.read_be_u16()?),
                class: r.read_u8()?,
                code: r.read_u8()?,
            });
        }
        Ok(Self { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        WriteAccessSpec, WriteEntry, WriteFailure, WritePropertyMultipleAck,
        WritePropertyMultipleRequest,
    };
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::services::errors::ServiceError;
    use crate::types::{ObjectId, ObjectType, PropertyId, Value};
    use alloc::vec;

    #[test]
    fn request_roundtrip() {
        let req = WritePropertyMultipleRequest {
            specs: vec![WriteAccessSpec {
                object_id: ObjectId::new(ObjectType::AnalogValue, 1),
                entries: vec![
                    WriteEntry {
                        property_id: PropertyId::PresentValue,
                        priority: 8,
                        value: Value::Real(21.0),
                    },
                    WriteEntry {
                        property_id: PropertyId::Description,
                        priority: 16,
                        value: Value::CharacterString("setpoint"),
                    },
                ],
            }],
        };

        let mut buf = [0u8; 128];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 2).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(
            WritePropertyMultipleRequest::decode_payload(&mut r).unwrap(),
            req
        );
    }

    #[test]
    fn failure_records_roundtrip() {
        let (class, code) = ServiceError::ObjectNotExist.class_code();
        let ack = WritePropertyMultipleAck {
            failures: vec![WriteFailure {
                object_id: ObjectId::new(ObjectType::AnalogValue, 77),
                property_id: PropertyId::PresentValue,
                class,
                code,
            }],
        };

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w, 4).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(
            WritePropertyMultipleAck::decode_payload(&mut r).unwrap(),
            ack
        );
    }
}
