use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_ATOMIC_WRITE_FILE: u8 = 0x15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicWriteFileRequest<'a> {
    pub object_id: ObjectId,
    pub start: u32,
    pub data: &'a [u8],
}

impl<'a> AtomicWriteFileRequest<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_ATOMIC_WRITE_FILE).encode(w)?;
        self.object_id.encode(w)?;
        w.write_be_u32(self.start)?;
        w.write_be_u32(self.data.len() as u32)?;
        w.write_all(self.data)
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let object_id = ObjectId::decode(r)?;
        let start = r.read_be_u32()?;
        let len = r.read_be_u32()? as usize;
        Ok(Self {
            object_id,
            start,
            data: r.read_exact(len)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AtomicWriteFileRequest;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType};
    use crate::DecodeError;

    #[test]
    fn request_roundtrip() {
        let req = AtomicWriteFileRequest {
            object_id: ObjectId::new(ObjectType::File, 1),
            start: 0,
            data: &[0xDE, 0xAD, 0xBE, 0xEF],
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 12).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(AtomicWriteFileRequest::decode_payload(&mut r).unwrap(), req);
    }

    #[test]
    fn length_beyond_buffer_is_rejected() {
        let payload = [
            0x03, 0x40, 0x00, 0x01, // file 13:1
            0, 0, 0, 0, // start
            0, 0, 0, 9, // claims nine bytes
            1, 2, 3,
        ];
        let mut r = Reader::new(&payload);
        assert_eq!(
            AtomicWriteFileRequest::decode_payload(&mut r).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }
}
