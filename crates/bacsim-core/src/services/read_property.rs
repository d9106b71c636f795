use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{decode_value, encode_value};
use crate::types::{ObjectId, PropertyId, Value};
use crate::{DecodeError, EncodeError};

pub const SERVICE_READ_PROPERTY: u8 = 0x0C;

/// Marker byte preceding the value in a ReadProperty acknowledgement.
pub const VALUE_MARKER: u8 = 0x0C;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
}

impl ReadPropertyRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_READ_PROPERTY).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u16(self.property_id.to_u16())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            property_id: PropertyId::from_u16(r.read_be_u16()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadPropertyAck<'a> {
    pub value: Value<'a>,
}

impl<'a> ReadPropertyAck<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, SERVICE_READ_PROPERTY).encode(w)?;
        w.write_u8(VALUE_MARKER)?;
        encode_value(w, &self.value)
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        if r.read_u8()? != VALUE_MARKER {
            return Err(DecodeError::InvalidTag);
        }
        Ok(Self {
            value: decode_value(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY};
    use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType, PropertyId, Value};

    #[test]
    fn request_roundtrip() {
        let req = ReadPropertyRequest {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            property_id: PropertyId::PresentValue,
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 5).unwrap();

        let mut r = Reader::new(w.as_written());
        let header = ConfirmedRequestHeader::decode(&mut r).unwrap();
        assert_eq!(header.invoke_id, 5);
        assert_eq!(header.service_choice, SERVICE_READ_PROPERTY);
        assert_eq!(ReadPropertyRequest::decode_payload(&mut r).unwrap(), req);
    }

    #[test]
    fn ack_carries_tagged_value() {
        let ack = ReadPropertyAck {
            value: Value::Real(22.5),
        };
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w, 9).unwrap();

        let mut r = Reader::new(w.as_written());
        let header = ComplexAckHeader::decode(&mut r).unwrap();
        assert_eq!(header.invoke_id, 9);
        let dec = ReadPropertyAck::decode_payload(&mut r).unwrap();
        assert_eq!(dec.value, Value::Real(22.5));
    }
}
