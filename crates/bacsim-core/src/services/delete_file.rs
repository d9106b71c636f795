use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_DELETE_FILE: u8 = 0x16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteFileRequest {
    pub object_id: ObjectId,
}

impl DeleteFileRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_DELETE_FILE).encode(w)?;
        self.object_id.encode(w)
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
        })
    }
}
