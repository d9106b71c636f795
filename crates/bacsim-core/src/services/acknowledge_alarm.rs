use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_ACKNOWLEDGE_ALARM: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeAlarmRequest {
    pub object_id: ObjectId,
    pub alarm_code: u32,
    pub alarm_type: u32,
    pub timestamp: u32,
}

impl AcknowledgeAlarmRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_ACKNOWLEDGE_ALARM).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u32(self.alarm_code)?;
        w.write_be_u32(self.alarm_type)?;
        w.write_be_u32(self.timestamp)
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            alarm_code: r.read_be_u32()?,
            alarm_type: r.read_be_u32()?,
            timestamp: r.read_be_u32()?,
        })
    }
}
