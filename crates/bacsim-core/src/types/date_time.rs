use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// Weekday value for "unspecified"; Monday is 1 through Sunday 7.
pub const WEEKDAY_UNSPECIFIED: u8 = 0;

/// Daylight-saving indicator values.
pub const DST_UNKNOWN: u8 = 0;
pub const DST_STANDARD: u8 = 1;
pub const DST_DAYLIGHT: u8 = 2;

/// A combined date-and-time record, carried on the wire as 10 bytes:
/// year (u16 BE), month, day, hour, minute, second, hundredths, weekday,
/// DST indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
    /// 0 = unspecified, 1 = Monday … 7 = Sunday.
    pub weekday: u8,
    /// 0 = unknown, 1 = standard time, 2 = daylight saving.
    pub dst: u8,
}

impl DateTime {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_be_u16(self.year)?;
        w.write_all(&[
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.hundredths,
            self.weekday,
            self.dst,
        ])
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let year = r.read_be_u16()?;
        let b = r.read_exact(8)?;
        let dt = Self {
            year,
            month: b[0],
            day: b[1],
            hour: b[2],
            minute: b[3],
            second: b[4],
            hundredths: b[5],
            weekday: b[6],
            dst: b[7],
        };
        if dt.weekday > 7 || dt.dst > DST_DAYLIGHT {
            return Err(DecodeError::InvalidValue);
        }
        Ok(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::DateTime;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::DecodeError;

    #[test]
    fn ten_byte_roundtrip() {
        let dt = DateTime {
            year: 2025,
            month: 8,
            day: 2,
            hour: 13,
            minute: 45,
            second: 30,
            hundredths: 99,
            weekday: 6,
            dst: 0,
        };

        let mut buf = [0u8; 10];
        let mut w = Writer::new(&mut buf);
        dt.encode(&mut w).unwrap();
        assert_eq!(w.position(), 10);

        let mut r = Reader::new(w.as_written());
        assert_eq!(DateTime::decode(&mut r).unwrap(), dt);
    }

    #[test]
    fn out_of_range_weekday_is_rejected() {
        let bytes = [0x07, 0xE9, 8, 2, 13, 45, 30, 0, 8, 0];
        let mut r = Reader::new(&bytes);
        assert_eq!(
            DateTime::decode(&mut r).unwrap_err(),
            DecodeError::InvalidValue
        );
    }
}
