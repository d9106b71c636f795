use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_ATOMIC_READ_FILE: u8 = 0x14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicReadFileRequest {
    pub object_id: ObjectId,
    pub start: u32,
    pub count: u32,
}

impl AtomicReadFileRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_ATOMIC_READ_FILE).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u32(self.start)?;
        w.write_be_u32(self.count)
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            start: r.read_be_u32()?,
            count: r.read_be_u32()?,
        })
    }
}

/// Acknowledgement payload: the start offset echoed back, the byte count
/// actually returned, then the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicReadFileAck<'a> {
    pub start: u32,
    pub data: &'a [u8],
}

impl<'a> AtomicReadFileAck<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, SERVICE_ATOMIC_READ_FILE).encode(w)?;
        w.write_be_u32(self.start)?;
        w.write_be_u32(self.data.len() as u32)?;
        w.write_all(self.data)
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let start = r.read_be_u32()?;
        let count = r.read_be_u32()? as usize;
        Ok(Self {
            start,
            data: r.read_exact(count)?,
        })
    }
}
