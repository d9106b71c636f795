use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// BACnet network layer protocol version (always `0x01`).
pub const NPDU_VERSION: u8 = 0x01;

/// Network-priority bits carried in the low two bits of the control octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkPriority {
    #[default]
    Normal,
    Urgent,
    Critical,
    LifeSafety,
}

impl NetworkPriority {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Normal,
            1 => Self::Urgent,
            2 => Self::Critical,
            _ => Self::LifeSafety,
        }
    }

    pub const fn to_bits(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Urgent => 1,
            Self::Critical => 2,
            Self::LifeSafety => 3,
        }
    }
}

/// A network-layer address: network number plus a MAC of up to 6 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpduAddress {
    pub network: u16,
    pub mac: [u8; 6],
    pub mac_len: u8,
}

/// Decoded NPDU header.
///
/// Control bits are expanded into fields; the control octet is rebuilt on
/// encode. The reader is left positioned at the first APDU byte after
/// [`decode`](Self::decode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Npdu {
    pub network_message: bool,
    pub expecting_reply: bool,
    pub priority: NetworkPriority,
    pub destination: Option<NpduAddress>,
    pub source: Option<NpduAddress>,
    pub hop_count: Option<u8>,
}

impl Npdu {
    /// The minimal header carried on every server reply: version 1, no
    /// routing information, normal priority.
    pub const fn reply() -> Self {
        Self {
            network_message: false,
            expecting_reply: false,
            priority: NetworkPriority::Normal,
            destination: None,
            source: None,
            hop_count: None,
        }
    }

    fn control_octet(&self) -> u8 {
        let mut control = self.priority.to_bits();
        if self.network_message {
            control |= 0x80;
        }
        if self.destination.is_some() {
            control |= 0x20;
        }
        if self.source.is_some() {
            control |= 0x08;
        }
        if self.expecting_reply {
            control |= 0x04;
        }
        control
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(NPDU_VERSION)?;
        w.write_u8(self.control_octet())?;

        if let Some(dest) = self.destination {
            encode_addr(w, dest)?;
        }
        if let Some(src) = self.source {
            encode_addr(w, src)?;
        }
        if self.destination.is_some() {
            w.write_u8(self.hop_count.unwrap_or(255))?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != NPDU_VERSION {
            return Err(DecodeError::UnsupportedVersion);
        }

        let control = r.read_u8()?;
        let has_dest = (control & 0x20) != 0;
        let has_src = (control & 0x08) != 0;

        let destination = if has_dest {
            Some(decode_addr(r)?)
        } else {
            None
        };
        let source = if has_src { Some(decode_addr(r)?) } else { None };
        let hop_count = if has_dest { Some(r.read_u8()?) } else { None };

        Ok(Self {
            network_message: (control & 0x80) != 0,
            expecting_reply: (control & 0x04) != 0,
            priority: NetworkPriority::from_bits(control),
            destination,
            source,
            hop_count,
        })
    }
}

fn encode_addr(w: &mut Writer<'_>, addr: NpduAddress) -> Result<(), EncodeError> {
    if addr.mac_len as usize > addr.mac.len() {
        return Err(EncodeError::InvalidLength);
    }
    w.write_be_u16(addr.network)?;
    w.write_u8(addr.mac_len)?;
    w.write_all(&addr.mac[..addr.mac_len as usize])
}

fn decode_addr(r: &mut Reader<'_>) -> Result<NpduAddress, DecodeError> {
    let network = r.read_be_u16()?;
    let mac_len = r.read_u8()?;
    if mac_len as usize > 6 {
        return Err(DecodeError::InvalidLength);
    }
    let mut mac = [0u8; 6];
    let src = r.read_exact(mac_len as usize)?;
    mac[..mac_len as usize].copy_from_slice(src);
    Ok(NpduAddress {
        network,
        mac,
        mac_len,
    })
}

#[cfg(test)]
mod tests {
    use super::{NetworkPriority, Npdu, NpduAddress};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::DecodeError;

    #[test]
    fn reply_header_is_two_bytes() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        Npdu::reply().encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x01, 0x00]);
    }

    #[test]
    fn roundtrip_with_destination() {
        let p = Npdu {
            expecting_reply: true,
            priority: NetworkPriority::Urgent,
            destination: Some(NpduAddress {
                network: 7,
                mac: [192, 168, 1, 2, 0xBA, 0xC0],
                mac_len: 6,
            }),
            hop_count: Some(255),
            ..Npdu::default()
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        p.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        let dec = Npdu::decode(&mut r).unwrap();
        assert_eq!(dec, p);
        assert!(r.is_empty());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut r = Reader::new(&[0x02, 0x00]);
        assert_eq!(
            Npdu::decode(&mut r).unwrap_err(),
            DecodeError::UnsupportedVersion
        );
    }

    #[test]
    fn truncated_destination_mac_is_rejected() {
        // Destination bit set, DLEN claims 6 bytes but only 2 follow.
        let mut r = Reader::new(&[0x01, 0x20, 0x00, 0x07, 0x06, 0xAA, 0xBB]);
        assert_eq!(Npdu::decode(&mut r).unwrap_err(), DecodeError::UnexpectedEof);
    }

    #[test]
    fn oversized_mac_is_rejected() {
        let mut r = Reader::new(&[0x01, 0x20, 0x00, 0x07, 0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF]);
        assert_eq!(
            Npdu::decode(&mut r).unwrap_err(),
            DecodeError::InvalidLength
        );
    }

    #[test]
    fn priority_bits_roundtrip() {
        for priority in [
            NetworkPriority::Normal,
            NetworkPriority::Urgent,
            NetworkPriority::Critical,
            NetworkPriority::LifeSafety,
        ] {
            assert_eq!(NetworkPriority::from_bits(priority.to_bits()), priority);
        }
    }
}
