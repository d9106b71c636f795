/// Object types exposed by the simulated device.
///
/// Numbering follows this server's wire profile: the scalar types start at
/// 1, the Device type is pinned at 8 (the value announced in I-Am), and
/// unrecognised values decode as [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    Device,
    TrendLog,
    Schedule,
    MultiStateInput,
    MultiStateOutput,
    File,
    NotificationClass,
    EventLog,
    EventEnrollment,
    Unknown(u16),
}

impl ObjectType {
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::AnalogInput => 1,
            Self::AnalogOutput => 2,
            Self::AnalogValue => 3,
            Self::BinaryInput => 4,
            Self::BinaryOutput => 5,
            Self::BinaryValue => 6,
            Self::Device => 8,
            Self::TrendLog => 9,
            Self::Schedule => 10,
            Self::MultiStateInput => 11,
            Self::MultiStateOutput => 12,
            Self::File => 13,
            Self::NotificationClass => 14,
            Self::EventLog => 15,
            Self::EventEnrollment => 16,
            Self::Unknown(v) => v,
        }
    }

    pub const fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::AnalogInput,
            2 => Self::AnalogOutput,
            3 => Self::AnalogValue,
            4 => Self::BinaryInput,
            5 => Self::BinaryOutput,
            6 => Self::BinaryValue,
            8 => Self::Device,
            9 => Self::TrendLog,
            10 => Self::Schedule,
            11 => Self::MultiStateInput,
            12 => Self::MultiStateOutput,
            13 => Self::File,
            14 => Self::NotificationClass,
            15 => Self::EventLog,
            16 => Self::EventEnrollment,
            v => Self::Unknown(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectType;

    #[test]
    fn numbering_roundtrips() {
        for v in 0..32u16 {
            assert_eq!(ObjectType::from_u16(v).to_u16(), v);
        }
    }

    #[test]
    fn device_is_eight() {
        assert_eq!(ObjectType::Device.to_u16(), 8);
        assert_eq!(ObjectType::from_u16(7), ObjectType::Unknown(7));
    }
}
