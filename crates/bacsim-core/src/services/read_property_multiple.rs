//! ReadPropertyMultiple codec.
//!
//! The request is a sequence of read-access specifications, each an object
//! identifier followed by a context-3 property list. The acknowledgement
//! inlines per-object and per-property errors so that one bad reference
//! never fails the whole exchange.

use alloc::vec::Vec;

use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{context_marker, decode_value, encode_value};
use crate::types::{ObjectId, PropertyId, Value};
use crate::{DecodeError, EncodeError};

pub const SERVICE_READ_PROPERTY_MULTIPLE: u8 = 0x10;

/// Starts each per-object section of the acknowledgement.
pub const MARK_OBJECT: u8 = 0x02;
/// Starts each per-property entry inside a property list.
pub const MARK_PROPERTY: u8 = 0x00;
/// Introduces an inline (class, code) error.
pub const MARK_ERROR: u8 = 0x01;
/// Introduces the length-prefixed property-result block.
pub const MARK_PROPERTY_LIST: u8 = 0x03;

const PROPERTY_LIST_MARKER: u8 = context_marker(3);

/// One object plus the properties requested from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAccessSpec {
    pub object_id: ObjectId,
    pub properties: Vec<PropertyId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPropertyMultipleRequest {
    pub specs: Vec<ReadAccessSpec>,
}

impl ReadPropertyMultipleRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_READ_PROPERTY_MULTIPLE).encode(w)?;
        for spec in &self.specs {
            if spec.properties.len() > u8::MAX as usize {
                return Err(EncodeError::InvalidLength);
            }
            spec.object_id.encode(w)?;
            w.write_u8(PROPERTY_LIST_MARKER)?;
            w.write_u8(spec.properties.len() as u8)?;
            for property in &spec.properties {
                w.write_be_u16(property.to_u16())?;
            }
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut specs = Vec::new();
        while !r.is_empty() {
            let object_id = ObjectId::decode(r)?;
            if r.read_u8()? != PROPERTY_LIST_MARKER {
                return Err(DecodeError::InvalidTag);
            }
            let count = r.read_u8()? as usize;
            let mut properties = Vec::with_capacity(count);
            for _ in 0..count {
                properties.push(PropertyId::from_u16(r.read_be_u16()?));
            }
            specs.push(ReadAccessSpec {
                object_id,
                properties,
            });
        }
        if specs.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        Ok(Self { specs })
    }
}

/// Outcome of reading a single property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyResult<'a> {
    Value(Value<'a>),
    Error { class: u8, code: u8 },
}

/// Outcome for one requested object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectResult<'a> {
    Missing { class: u8, code: u8 },
    Properties(Vec<(PropertyId, PropertyResult<'a>)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMultipleAck<'a> {
    pub results: Vec<(ObjectId, ObjectResult<'a>)>,
}

impl<'a> ReadPropertyMultipleAck<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, SERVICE_READ_PROPERTY_MULTIPLE).encode(w)?;

        for (object_id, result) in &self.results {
            w.write_u8(MARK_OBJECT)?;
            object_id.encode(w)?;
            match result {
                ObjectResult::Missing { class, code } => {
                    w.write_u8(MARK_ERROR)?;
                    w.write_u8(*class)?;
                    w.write_u8(*code)?;
                }
                ObjectResult::Properties(entries) => {
                    let mut scratch = [0u8; 255];
                    let mut block = Writer::new(&mut scratch);
                    for (property_id, entry) in entries {
                        block
                            .write_u8(MARK_PROPERTY)
                            .and_then(|()| block.write_be_u16(property_id.to_u16()))
                            .map_err(|_| EncodeError::InvalidLength)?;
                        match entry {
                            PropertyResult::Value(value) => encode_value(&mut block, value)
                                .map_err(|_| EncodeError::InvalidLength)?,
                            PropertyResult::Error { class, code } => block
                                .write_u8(MARK_ERROR)
                                .and_then(|()| block.write_u8(*class))
                                .and_then(|()| block.write_u8(*code))
                                .map_err(|_| EncodeError::InvalidLength)?,
                        }
                    }
                    w.write_u8(MARK_PROPERTY_LIST)?;
                    w.write_u8(block.position() as u8)?;
                    w.write_all(block.as_written())?;
                }
            }
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let mut results = Vec::new();
        while !r.is_empty() {
            if r.read_u8()? != MARK_OBJECT {
                return Err(DecodeError::InvalidTag);
            }
            let object_id = ObjectId::decode(r)?;
            match r.read_u8()? {
                MARK_ERROR => {
                    results.push((
                        object_id,
                        ObjectResult::Missing {
                            class: r.read_u8()?,
                            code: r.read_u8()?,
                        },
                    ));
                }
                MARK_PROPERTY_LIST => {
                    let len = r.read_u8()? as usize;
                    let mut block = Reader::new(r.read_exact(len)?);
                    let mut entries = Vec::new();
                    while !block.is_empty() {
                        if block.read_u8()? != MARK_PROPERTY {
                            return Err(DecodeError::InvalidTag);
                        }
                        let property_id = PropertyId::from_u16(block.read_be_u16()?);
                        let entry = if block.peek_u8()? == MARK_ERROR {
                            let _marker = block.read_u8()?;
                            PropertyResult::Error {
                                class: block.read_u8()?,
                                code: block.read_u8()?,
                            }
                        } else {
                            PropertyResult::Value(decode_value(&mut block)?)
                        };
                        entries.push((property_id, entry));
                    }
                    results.push((object_id, ObjectResult::Properties(entries)));
                }
                _ => return Err(DecodeError::InvalidTag),
            }
        }
        Ok(Self { results })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ObjectResult, PropertyResult, ReadAccessSpec, ReadPropertyMultipleAck,
        ReadPropertyMultipleRequest,
    };
    use crate::apdu::ComplexAckHeader;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::services::errors::ServiceError;
    use crate::types::{ObjectId, ObjectType, PropertyId, Value};
    use alloc::vec;

    #[test]
    fn request_roundtrip_two_objects() {
        let req = ReadPropertyMultipleRequest {
            specs: vec![
                ReadAccessSpec {
                    object_id: ObjectId::new(ObjectType::AnalogInput, 1),
                    properties: vec![PropertyId::PresentValue, PropertyId::ObjectName],
                },
                ReadAccessSpec {
                    object_id: ObjectId::new(ObjectType::BinaryOutput, 2),
                    properties: vec![PropertyId::PresentValue],
                },
            ],
        };

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 3).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(
            ReadPropertyMultipleRequest::decode_payload(&mut r).unwrap(),
            req
        );
    }

    #[test]
    fn ack_roundtrip_with_inline_errors() {
        let (class, code) = ServiceError::PropertyNotExist.class_code();
        let ack = ReadPropertyMultipleAck {
            results: vec![
                (
                    ObjectId::new(ObjectType::AnalogInput, 1),
                    ObjectResult::Properties(vec![
                        (
                            PropertyId::PresentValue,
                            PropertyResult::Value(Value::Real(22.5)),
                        ),
                        (
                            PropertyId::Unknown(999),
                            PropertyResult::Error { class, code },
                        ),
                    ]),
                ),
                (
                    ObjectId::new(ObjectType::AnalogInput, 9),
                    ObjectResult::Missing {
                        class: ServiceError::ObjectNotExist.class() as u8,
                        code: ServiceError::ObjectNotExist.code(),
                    },
                ),
            ],
        };

        let mut buf = [0u8; 128];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w, 7).unwrap();

        let mut r = Reader::new(w.as_written());
        let header = ComplexAckHeader::decode(&mut r).unwrap();
        assert_eq!(header.invoke_id, 7);
        assert_eq!(
            ReadPropertyMultipleAck::decode_payload(&mut r).unwrap(),
            ack
        );
    }

    #[test]
    fn empty_request_is_rejected() {
        let mut r = Reader::new(&[]);
        assert!(ReadPropertyMultipleRequest::decode_payload(&mut r).is_err());
    }
}
