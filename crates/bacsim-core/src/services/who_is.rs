use crate::apdu::UnconfirmedRequestHeader;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WHO_IS: u8 = 0x08;

/// Who-Is discovery request: global, or limited to an instance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhoIsRequest {
    pub range: Option<(u32, u32)>,
}

impl WhoIsRequest {
    pub const fn global() -> Self {
        Self { range: None }
    }

    pub const fn limited(low: u32, high: u32) -> Self {
        Self {
            range: Some((low, high)),
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        UnconfirmedRequestHeader {
            service_choice: SERVICE_WHO_IS,
        }
        .encode(w)?;
        if let Some((low, high)) = self.range {
            w.write_be_u32(low)?;
            w.write_be_u32(high)?;
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.is_empty() {
            return Ok(Self::global());
        }
        let low = r.read_be_u32()?;
        let high = r.read_be_u32()?;
        if low > high {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self::limited(low, high))
    }

    /// True when `instance` falls inside the requested range; a global
    /// request matches every instance.
    pub fn matches(&self, instance: u32) -> bool {
        match self.range {
            None => true,
            Some((low, high)) => (low..=high).contains(&instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WhoIsRequest;
    use crate::encoding::{reader::Reader, writer::Writer};

    #[test]
    fn global_who_is_is_two_bytes() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        WhoIsRequest::global().encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x10, 0x08]);
    }

    #[test]
    fn range_roundtrip_and_matching() {
        let req = WhoIsRequest::limited(100, 200);
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w).unwrap();

        // Skip the two header bytes.
        let mut r = Reader::new(&w.as_written()[2..]);
        let dec = WhoIsRequest::decode_payload(&mut r).unwrap();
        assert_eq!(dec, req);
        assert!(dec.matches(100));
        assert!(dec.matches(150));
        assert!(!dec.matches(201));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut payload = [0u8; 8];
        payload[3] = 10; // low = 10
        payload[7] = 1; // high = 1
        let mut r = Reader::new(&payload);
        assert!(WhoIsRequest::decode_payload(&mut r).is_err());
    }
}
