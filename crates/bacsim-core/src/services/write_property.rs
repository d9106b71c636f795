use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{decode_value, encode_value};
use crate::types::{ObjectId, PropertyId, Value};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WRITE_PROPERTY: u8 = 0x0D;

/// Priority slot meaning "default" (slot 16 clears the priority array).
pub const PRIORITY_DEFAULT: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WritePropertyRequest<'a> {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub priority: u8,
    pub value: Value<'a>,
}

impl<'a> WritePropertyRequest<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_WRITE_PROPERTY).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u16(self.property_id.to_u16())?;
        w.write_u8(self.priority)?;
        encode_value(w, &self.value)
    }

    /// Decodes the payload. The priority byte is carried through unchecked;
    /// range validation is the store's responsibility so that an
    /// out-of-range slot yields the property-level error, not a framing
    /// drop.
    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            property_id: PropertyId::from_u16(r.read_be_u16()?),
            priority: r.read_u8()?,
            value: decode_value(r)?,
        })
    }
}
