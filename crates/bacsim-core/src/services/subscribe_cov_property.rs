use alloc::vec::Vec;

use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::context_marker;
use crate::types::{ObjectId, PropertyId};
use crate::{DecodeError, EncodeError};

pub const SERVICE_SUBSCRIBE_COV_PROPERTY: u8 = 0x48;

const PROPERTY_LIST_MARKER: u8 = context_marker(3);

/// Subscription restricted to a set of monitored properties. An absent list
/// means every property, like plain SubscribeCOV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeCovPropertyRequest {
    pub object_id: ObjectId,
    pub lifetime_seconds: u32,
    pub confirmed: bool,
    pub properties: Vec<PropertyId>,
}

impl SubscribeCovPropertyRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        if self.properties.len() > u8::MAX as usize {
            return Err(EncodeError::InvalidLength);
        }
        ConfirmedRequestHeader::new(invoke_id, SERVICE_SUBSCRIBE_COV_PROPERTY).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u32(self.lifetime_seconds)?;
        w.write_u8(u8::from(self.confirmed))?;
        if !self.properties.is_empty() {
            w.write_u8(PROPERTY_LIST_MARKER)?;
            w.write_u8(self.properties.len() as u8)?;
            for property in &self.properties {
                w.write_be_u16(property.to_u16())?;
            }
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = ObjectId::decode(r)?;
        let lifetime_seconds = r.read_be_u32()?;
        let confirmed = (r.read_u8()? & 0x01) != 0;

        let mut properties = Vec::new();
        if !r.is_empty() {
            if r.read_u8()? != PROPERTY_LIST_MARKER {
                return Err(DecodeError::InvalidTag);
            }
            let count = r.read_u8()? as usize;
            properties.reserve(count);
            for _ in 0..count {
                properties.push(PropertyId::from_u16(r.read_be_u16()?));
            }
        }

        Ok(Self {
            object_id,
            lifetime_seconds,
            confirmed,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SubscribeCovPropertyRequest;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType, PropertyId};
    use crate::DecodeError;
    use alloc::vec;

    #[test]
    fn roundtrip_with_property_list() {
        let req = SubscribeCovPropertyRequest {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            lifetime_seconds: 300,
            confirmed: true,
            properties: vec![PropertyId::PresentValue, PropertyId::StatusFlags],
        };

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 30).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(
            SubscribeCovPropertyRequest::decode_payload(&mut r).unwrap(),
            req
        );
    }

    #[test]
    fn roundtrip_without_property_list() {
        let req = SubscribeCovPropertyRequest {
            object_id: ObjectId::new(ObjectType::BinaryValue, 4),
            lifetime_seconds: 0,
            confirmed: false,
            properties: vec![],
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 1).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(
            SubscribeCovPropertyRequest::decode_payload(&mut r).unwrap(),
            req
        );
    }

    #[test]
    fn bad_list_marker_is_rejected() {
        // objid, lifetime, confirmed, then a stray application tag.
        let payload = [0x00, 0x40, 0x00, 0x01, 0, 0, 0, 60, 0, 0x41];
        let mut r = Reader::new(&payload);
        assert_eq!(
            SubscribeCovPropertyRequest::decode_payload(&mut r).unwrap_err(),
            DecodeError::InvalidTag
        );
    }
}
