//! Wall-clock access for event timestamps and the wire date-time record.

use bacsim_core::types::date_time::{DateTime as WireDateTime, DST_UNKNOWN};
use chrono::{DateTime, Datelike, Local, Timelike, Utc};

/// Current instant for subscription bookkeeping.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current local time as the wire record.
pub fn now_wire() -> WireDateTime {
    to_wire(Local::now())
}

/// Converts a zoned instant to the wire record. The weekday is Monday = 1
/// through Sunday = 7; the DST indicator is always "unknown" because the
/// platform time API does not expose it reliably.
pub fn to_wire(t: DateTime<Local>) -> WireDateTime {
    let hundredths = (t.nanosecond() / 10_000_000).min(99) as u8;
    WireDateTime {
        year: t.year().clamp(0, u16::MAX as i32) as u16,
        month: t.month() as u8,
        day: t.day() as u8,
        hour: t.hour() as u8,
        minute: t.minute() as u8,
        second: t.second().min(59) as u8,
        hundredths,
        weekday: t.weekday().number_from_monday() as u8,
        dst: DST_UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::to_wire;
    use bacsim_core::types::date_time::DST_UNKNOWN;
    use chrono::{Local, TimeZone};

    #[test]
    fn known_instant_converts() {
        // 2025-08-02 is a Saturday.
        let t = Local.with_ymd_and_hms(2025, 8, 2, 13, 45, 30).unwrap();
        let wire = to_wire(t);
        assert_eq!(wire.year, 2025);
        assert_eq!(wire.month, 8);
        assert_eq!(wire.day, 2);
        assert_eq!(wire.weekday, 6);
        assert_eq!(wire.dst, DST_UNKNOWN);
    }
}
