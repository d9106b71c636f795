//! I-Am device announcement.
//!
//! The announcement frame is pinned byte-for-byte: a unicast BVLC header, a
//! padded NPDU (`01 04 00 00 00 00 00 FF`), the two-byte `00 08` service
//! prefix, then the tagged device identifier, accepted APDU size,
//! segmentation support, and vendor id. It is built and parsed here in one
//! piece and never routed through the generic APDU codec.

use crate::bvlc::{BvlcFunction, BVLC_MAGIC};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{TAG_DATE_TIME, TAG_ENUMERATED, TAG_UNSIGNED16};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

/// Service selector byte inside the announcement frame.
pub const SERVICE_I_AM: u8 = 0x08;

/// Total size of an I-Am datagram.
pub const I_AM_FRAME_LEN: usize = 27;

/// Segmentation-support value announced by this server (none).
pub const SEGMENTATION_NONE: u8 = 0x00;

/// Maximum APDU length the server accepts.
pub const MAX_APDU_ACCEPTED: u16 = 1024;

const NPDU_PREAMBLE: [u8; 8] = [0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IAm {
    pub device_id: ObjectId,
    pub max_apdu: u16,
    pub segmentation: u8,
    pub vendor_id: u16,
}

impl IAm {
    pub const fn announce(device_id: ObjectId, vendor_id: u16) -> Self {
        Self {
            device_id,
            max_apdu: MAX_APDU_ACCEPTED,
            segmentation: SEGMENTATION_NONE,
            vendor_id,
        }
    }

    /// Writes the complete 27-byte datagram, BVLC header included.
    pub fn encode_frame(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(BVLC_MAGIC)?;
        w.write_u8(BvlcFunction::OriginalUnicastNpdu.to_u8())?;
        w.write_be_u16(I_AM_FRAME_LEN as u16)?;
        w.write_all(&NPDU_PREAMBLE)?;
        w.write_u8(0x00)?;
        w.write_u8(SERVICE_I_AM)?;
        w.write_u8(TAG_DATE_TIME)?; // object-id shares the 0xC4 tag byte
        self.device_id.encode(w)?;
        w.write_u8(TAG_UNSIGNED16)?;
        w.write_be_u16(self.max_apdu)?;
        w.write_u8(TAG_ENUMERATED)?;
        w.write_u8(self.segmentation)?;
        w.write_u8(TAG_UNSIGNED16)?;
        w.write_be_u16(self.vendor_id)
    }

    /// Parses a complete I-Am datagram.
    pub fn decode_frame(frame: &[u8]) -> Result<Self, DecodeError> {
        if frame.len() != I_AM_FRAME_LEN {
            return Err(DecodeError::LengthMismatch);
        }

        let mut r = Reader::new(frame);
        if r.read_u8()? != BVLC_MAGIC {
            return Err(DecodeError::BadMagic);
        }
        if BvlcFunction::from_u8(r.read_u8()?) != BvlcFunction::OriginalUnicastNpdu {
            return Err(DecodeError::InvalidValue);
        }
        if r.read_be_u16()? as usize != I_AM_FRAME_LEN {
            return Err(DecodeError::LengthMismatch);
        }
        let preamble = r.read_exact(NPDU_PREAMBLE.len())?;
        if preamble[0] != 0x01 {
            return Err(DecodeError::UnsupportedVersion);
        }
        if r.read_u8()? != 0x00 || r.read_u8()? != SERVICE_I_AM {
            return Err(DecodeError::InvalidValue);
        }

        if r.read_u8()? != TAG_DATE_TIME {
            return Err(DecodeError::InvalidTag);
        }
        let device_id = ObjectId::decode(&mut r)?;
        if r.read_u8()? != TAG_UNSIGNED16 {
            return Err(DecodeError::InvalidTag);
        }
        let max_apdu = r.read_be_u16()?;
        if r.read_u8()? != TAG_ENUMERATED {
            return Err(DecodeError::InvalidTag);
        }
        let segmentation = r.read_u8()?;
        if r.read_u8()? != TAG_UNSIGNED16 {
            return Err(DecodeError::InvalidTag);
        }
        let vendor_id = r.read_be_u16()?;

        Ok(Self {
            device_id,
            max_apdu,
            segmentation,
            vendor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{IAm, I_AM_FRAME_LEN};
    use crate::encoding::writer::Writer;
    use crate::types::{ObjectId, ObjectType};

    #[test]
    fn frame_matches_fixture() {
        let iam = IAm::announce(ObjectId::new(ObjectType::Device, 1001), 0);
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        iam.encode_frame(&mut w).unwrap();

        assert_eq!(
            w.as_written(),
            &[
                0x81, 0x0A, 0x00, 0x1B, // BVLC, inclusive length 27
                0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, // NPDU preamble
                0x00, 0x08, // service prefix
                0xC4, 0x02, 0x00, 0x03, 0xE9, // device 8:1001
                0x22, 0x04, 0x00, // max APDU 1024
                0x91, 0x00, // segmentation none
                0x22, 0x00, 0x00, // vendor id 0
            ]
        );
        assert_eq!(w.position(), I_AM_FRAME_LEN);
    }

    #[test]
    fn frame_roundtrip() {
        let iam = IAm::announce(ObjectId::new(ObjectType::Device, 1234), 260);
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        iam.encode_frame(&mut w).unwrap();

        let dec = IAm::decode_frame(w.as_written()).unwrap();
        assert_eq!(dec, iam);
        assert_eq!(dec.device_id.object_type(), ObjectType::Device);
        assert_eq!(dec.device_id.instance(), 1234);
    }
}
