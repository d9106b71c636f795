use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::ObjectType;
use crate::{DecodeError, EncodeError};

/// A packed BACnet object identifier combining an [`ObjectType`] and a 22-bit
/// instance number into a single `u32`.
///
/// The upper 10 bits encode the object type and the lower 22 bits encode the
/// instance number, matching the wire format used both inside service
/// payloads (raw big-endian) and in the I-Am announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

/// Largest valid instance number (22 bits, with the all-ones value reserved).
pub const MAX_INSTANCE: u32 = 0x3F_FFFE;

impl ObjectId {
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self((((object_type.to_u16() as u32) & 0x03FF) << 22) | (instance & 0x3F_FFFF))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16(((self.0 >> 22) & 0x03FF) as u16)
    }

    pub const fn instance(self) -> u32 {
        self.0 & 0x3F_FFFF
    }

    /// Writes the raw 4-byte big-endian form used in service payloads.
    pub fn encode(self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_be_u32(self.0)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self(r.read_be_u32()?))
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}:{}", self.object_type(), self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectId;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::ObjectType;

    #[test]
    fn packs_type_and_instance() {
        let id = ObjectId::new(ObjectType::AnalogInput, 1);
        assert_eq!(id.object_type(), ObjectType::AnalogInput);
        assert_eq!(id.instance(), 1);
        assert_eq!(id.raw(), (1 << 22) | 1);
    }

    #[test]
    fn device_type_occupies_upper_bits() {
        let id = ObjectId::new(ObjectType::Device, 1001);
        assert_eq!(id.raw(), (8 << 22) | 1001);
    }

    #[test]
    fn wire_roundtrip() {
        let id = ObjectId::new(ObjectType::File, 0x3F_0001);
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        id.encode(&mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        assert_eq!(ObjectId::decode(&mut r).unwrap(), id);
    }
}
