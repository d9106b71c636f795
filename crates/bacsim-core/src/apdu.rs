use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// APDU type carried in the high nibble of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl ApduType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ConfirmedRequest),
            1 => Some(Self::UnconfirmedRequest),
            2 => Some(Self::SimpleAck),
            3 => Some(Self::ComplexAck),
            4 => Some(Self::SegmentAck),
            5 => Some(Self::Error),
            6 => Some(Self::Reject),
            7 => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Header of a Confirmed-Request APDU.
///
/// Segmented requests are decoded (the flag bits survive) but carry no
/// sequence fields in this profile; the dispatcher drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRequestHeader {
    pub segmented: bool,
    pub more_follows: bool,
    pub segmented_response_accepted: bool,
    pub max_segments: u8,
    pub max_apdu: u8,
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl ConfirmedRequestHeader {
    pub fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segmented: false,
            more_follows: false,
            segmented_response_accepted: false,
            max_segments: 0,
            // Encodes the 1024-byte acceptance window.
            max_apdu: 4,
            invoke_id,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::ConfirmedRequest as u8) << 4;
        if self.segmented {
            b0 |= 0b0000_1000;
        }
        if self.more_follows {
            b0 |= 0b0000_0100;
        }
        if self.segmented_response_accepted {
            b0 |= 0b0000_0010;
        }

        w.write_u8(b0)?;
        w.write_u8((self.max_segments << 4) | (self.max_apdu & 0x0F))?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::ConfirmedRequest as u8 {
            return Err(DecodeError::InvalidValue);
        }
        let seg_apdu = r.read_u8()?;
        Ok(Self {
            segmented: (b0 & 0b0000_1000) != 0,
            more_follows: (b0 & 0b0000_0100) != 0,
            segmented_response_accepted: (b0 & 0b0000_0010) != 0,
            max_segments: seg_apdu >> 4,
            max_apdu: seg_apdu & 0x0F,
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
        })
    }
}

/// Header of an Unconfirmed-Request APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnconfirmedRequestHeader {
    pub service_choice: u8,
}

impl UnconfirmedRequestHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::UnconfirmedRequest as u8) << 4)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::UnconfirmedRequest as u8 {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self {
            service_choice: r.read_u8()?,
        })
    }
}

/// SimpleAck: reserved byte, invoke id, service choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAck {
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl SimpleAck {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::SimpleAck as u8) << 4)?;
        w.write_u8(0)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::SimpleAck as u8 {
            return Err(DecodeError::InvalidValue);
        }
        let _reserved = r.read_u8()?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
        })
    }
}

/// Header of a ComplexAck APDU; the service payload follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexAckHeader {
    pub segmented: bool,
    pub more_follows: bool,
    pub invoke_id: u8,
    pub sequence_number: Option<u8>,
    pub proposed_window_size: Option<u8>,
    pub service_choice: u8,
}

impl ComplexAckHeader {
    pub fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segmented: false,
            more_follows: false,
            invoke_id,
            sequence_number: None,
            proposed_window_size: None,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::ComplexAck as u8) << 4;
        if self.segmented {
            b0 |= 0b0000_1000;
        }
        if self.more_follows {
            b0 |= 0b0000_0100;
        }
        w.write_u8(b0)?;
        w.write_u8(0)?;
        w.write_u8(self.invoke_id)?;
        if self.segmented {
            w.write_u8(self.sequence_number.unwrap_or(0))?;
            w.write_u8(self.proposed_window_size.unwrap_or(1))?;
        }
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::ComplexAck as u8 {
            return Err(DecodeError::InvalidValue);
        }
        let segmented = (b0 & 0b0000_1000) != 0;
        let more_follows = (b0 & 0b0000_0100) != 0;
        let _reserved = r.read_u8()?;
        let invoke_id = r.read_u8()?;
        let (sequence_number, proposed_window_size) = if segmented {
            (Some(r.read_u8()?), Some(r.read_u8()?))
        } else {
            (None, None)
        };
        Ok(Self {
            segmented,
            more_follows,
            invoke_id,
            sequence_number,
            proposed_window_size,
            service_choice: r.read_u8()?,
        })
    }
}

/// SegmentAck: negative/server flags in the control nibble, then sequence
/// number and window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAck {
    pub negative_ack: bool,
    pub sent_by_server: bool,
    pub sequence_number: u8,
    pub window_size: u8,
}

impl SegmentAck {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::SegmentAck as u8) << 4;
        if self.negative_ack {
            b0 |= 0b0000_0010;
        }
        if self.sent_by_server {
            b0 |= 0b0000_0001;
        }
        w.write_u8(b0)?;
        w.write_u8(self.sequence_number)?;
        w.write_u8(self.window_size)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::SegmentAck as u8 {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self {
            negative_ack: (b0 & 0b0000_0010) != 0,
            sent_by_server: (b0 & 0b0000_0001) != 0,
            sequence_number: r.read_u8()?,
            window_size: r.read_u8()?,
        })
    }
}

/// Error PDU: reserved byte, invoke id, service choice, error class, error
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPdu {
    pub invoke_id: u8,
    pub service_choice: u8,
    pub error_class: u8,
    pub error_code: u8,
}

impl ErrorPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::Error as u8) << 4)?;
        w.write_u8(0)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)?;
        w.write_u8(self.error_class)?;
        w.write_u8(self.error_code)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::Error as u8 {
            return Err(DecodeError::InvalidValue);
        }
        let _reserved = r.read_u8()?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
            error_class: r.read_u8()?,
            error_code: r.read_u8()?,
        })
    }
}

/// Reject PDU: invoke id and reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectPdu {
    pub invoke_id: u8,
    pub reason: u8,
}

impl RejectPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::Reject as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::Reject as u8 {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self {
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

/// Abort PDU: server flag in the control nibble, invoke id, reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortPdu {
    pub server: bool,
    pub invoke_id: u8,
    pub reason: u8,
}

impl AbortPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::Abort as u8) << 4;
        if self.server {
            b0 |= 0b0000_0001;
        }
        w.write_u8(b0)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        if (b0 >> 4) != ApduType::Abort as u8 {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self {
            server: (b0 & 0x01) != 0,
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T, E, D>(value: T, encode: E, decode: D)
    where
        T: PartialEq + core::fmt::Debug + Copy,
        E: Fn(&T, &mut Writer<'_>) -> Result<(), EncodeError>,
        D: Fn(&mut Reader<'_>) -> Result<T, DecodeError>,
    {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        encode(&value, &mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        assert_eq!(decode(&mut r).unwrap(), value);
        assert!(r.is_empty());
    }

    #[test]
    fn confirmed_request_header_roundtrip() {
        roundtrip(
            ConfirmedRequestHeader::new(42, 0x0C),
            ConfirmedRequestHeader::encode,
            ConfirmedRequestHeader::decode,
        );
    }

    #[test]
    fn simple_ack_layout() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        SimpleAck {
            invoke_id: 7,
            service_choice: 0x0D,
        }
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0x20, 0x00, 0x07, 0x0D]);
    }

    #[test]
    fn complex_ack_header_roundtrip() {
        roundtrip(
            ComplexAckHeader::new(9, 0x0C),
            ComplexAckHeader::encode,
            ComplexAckHeader::decode,
        );
    }

    #[test]
    fn error_pdu_layout() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        ErrorPdu {
            invoke_id: 3,
            service_choice: 0x0C,
            error_class: 0x02,
            error_code: 0x01,
        }
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0x50, 0x00, 0x03, 0x0C, 0x02, 0x01]);
    }

    #[test]
    fn segment_ack_flags_roundtrip() {
        roundtrip(
            SegmentAck {
                negative_ack: true,
                sent_by_server: true,
                sequence_number: 5,
                window_size: 2,
            },
            SegmentAck::encode,
            SegmentAck::decode,
        );
    }

    #[test]
    fn abort_server_flag_roundtrip() {
        roundtrip(
            AbortPdu {
                server: true,
                invoke_id: 1,
                reason: 4,
            },
            AbortPdu::encode,
            AbortPdu::decode,
        );
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut r = Reader::new(&[0x10, 0x08]);
        assert!(SimpleAck::decode(&mut r).is_err());
    }
}
