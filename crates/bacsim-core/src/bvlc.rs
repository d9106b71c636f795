use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// First byte of every BACnet/IP datagram.
pub const BVLC_MAGIC: u8 = 0x81;

/// Size of the BVLC header in bytes.
pub const BVLC_HEADER_LEN: usize = 4;

/// BVLC function codes.
///
/// Only the two original-NPDU functions are serviced; everything else is
/// surfaced as [`Unknown`](Self::Unknown) so the caller can log and drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvlcFunction {
    OriginalUnicastNpdu,
    OriginalBroadcastNpdu,
    Unknown(u8),
}

impl BvlcFunction {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x0A => Self::OriginalUnicastNpdu,
            0x0B => Self::OriginalBroadcastNpdu,
            v => Self::Unknown(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::OriginalUnicastNpdu => 0x0A,
            Self::OriginalBroadcastNpdu => 0x0B,
            Self::Unknown(v) => v,
        }
    }
}

/// BVLC header: magic, function code, and the total datagram length
/// (inclusive of the four header bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvlcHeader {
    pub function: BvlcFunction,
    pub length: u16,
}

impl BvlcHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(BVLC_MAGIC)?;
        w.write_u8(self.function.to_u8())?;
        w.write_be_u16(self.length)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != BVLC_MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let function = BvlcFunction::from_u8(r.read_u8()?);
        let length = r.read_be_u16()?;
        if (length as usize) < BVLC_HEADER_LEN {
            return Err(DecodeError::InvalidLength);
        }
        Ok(Self { function, length })
    }
}

/// Splits a received datagram into its BVLC function and NPDU body.
///
/// The declared length must equal the datagram length exactly.
pub fn split_frame(datagram: &[u8]) -> Result<(BvlcFunction, &[u8]), DecodeError> {
    let mut r = Reader::new(datagram);
    let header = BvlcHeader::decode(&mut r)?;
    if header.length as usize != datagram.len() {
        return Err(DecodeError::LengthMismatch);
    }
    Ok((header.function, r.read_remaining()))
}

/// Wraps an NPDU+APDU body into a complete BVLC datagram.
#[cfg(feature = "alloc")]
pub fn wrap_frame(function: BvlcFunction, body: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let total = BVLC_HEADER_LEN
        .checked_add(body.len())
        .ok_or(EncodeError::InvalidLength)?;
    if total > u16::MAX as usize {
        return Err(EncodeError::InvalidLength);
    }

    let mut frame = alloc::vec![0u8; total];
    let mut w = Writer::new(&mut frame);
    BvlcHeader {
        function,
        length: total as u16,
    }
    .encode(&mut w)?;
    w.write_all(body)?;
    Ok(frame)
}

#[cfg(test)]
#[cfg(feature = "alloc")]
mod tests {
    use super::{split_frame, wrap_frame, BvlcFunction, BvlcHeader, BVLC_MAGIC};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::DecodeError;

    #[test]
    fn header_roundtrip() {
        let h = BvlcHeader {
            function: BvlcFunction::OriginalBroadcastNpdu,
            length: 12,
        };
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        h.encode(&mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        assert_eq!(BvlcHeader::decode(&mut r).unwrap(), h);
    }

    #[test]
    fn wrap_then_split() {
        let frame = wrap_frame(BvlcFunction::OriginalUnicastNpdu, &[1, 2, 3]).unwrap();
        assert_eq!(frame, &[BVLC_MAGIC, 0x0A, 0x00, 0x07, 1, 2, 3]);
        let (function, body) = split_frame(&frame).unwrap();
        assert_eq!(function, BvlcFunction::OriginalUnicastNpdu);
        assert_eq!(body, &[1, 2, 3]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert_eq!(
            split_frame(&[0x82, 0x0A, 0x00, 0x04]).unwrap_err(),
            DecodeError::BadMagic
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        // Claims 8 bytes but the datagram carries 6.
        assert_eq!(
            split_frame(&[BVLC_MAGIC, 0x0A, 0x00, 0x08, 1, 2]).unwrap_err(),
            DecodeError::LengthMismatch
        );
    }

    #[test]
    fn unknown_function_decodes() {
        let (function, _) = split_frame(&[BVLC_MAGIC, 0x05, 0x00, 0x04]).unwrap();
        assert_eq!(function, BvlcFunction::Unknown(0x05));
    }
}
