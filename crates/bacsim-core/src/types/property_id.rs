/// Property identifiers, encoded on the wire as raw big-endian u16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyId {
    ObjectIdentifier,
    ObjectType,
    ObjectName,
    PresentValue,
    Description,
    DeviceType,
    ManufacturerName,
    ModelName,
    FirmwareRevision,
    ApplicationSoftwareVersion,
    Location,
    NumberOfApduRetries,
    SegmentationSupported,
    ApduTimeout,
    EventState,
    OutOfService,
    NotificationClass,
    AlarmValue,
    AcknowledgedTransitions,
    NotifyType,
    EventDetectionEnable,
    AckedTransitions,
    EventTimeStamps,
    TimeOfStateChange,
    TimeOfLastStateChange,
    StatusFlags,
    FileSize,
    FileAccessMethod,
    FileOpeningTag,
    FileClosingTag,
    Priority,
    Unknown(u16),
}

impl PropertyId {
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::ObjectIdentifier => 1,
            Self::ObjectType => 2,
            Self::ObjectName => 3,
            Self::PresentValue => 4,
            Self::Description => 5,
            Self::DeviceType => 6,
            Self::ManufacturerName => 7,
            Self::ModelName => 8,
            Self::FirmwareRevision => 9,
            Self::ApplicationSoftwareVersion => 10,
            Self::Location => 11,
            Self::NumberOfApduRetries => 12,
            Self::SegmentationSupported => 13,
            Self::ApduTimeout => 14,
            Self::EventState => 15,
            Self::OutOfService => 16,
            Self::NotificationClass => 17,
            Self::AlarmValue => 18,
            Self::AcknowledgedTransitions => 19,
            Self::NotifyType => 20,
            Self::EventDetectionEnable => 21,
            Self::AckedTransitions => 22,
            Self::EventTimeStamps => 23,
            Self::TimeOfStateChange => 24,
            Self::TimeOfLastStateChange => 25,
            Self::StatusFlags => 26,
            Self::FileSize => 27,
            Self::FileAccessMethod => 28,
            Self::FileOpeningTag => 29,
            Self::FileClosingTag => 30,
            Self::Priority => 31,
            Self::Unknown(v) => v,
        }
    }

    pub const fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::ObjectIdentifier,
            2 => Self::ObjectType,
            3 => Self::ObjectName,
            4 => Self::PresentValue,
            5 => Self::Description,
            6 => Self::DeviceType,
            7 => Self::ManufacturerName,
            8 => Self::ModelName,
            9 => Self::FirmwareRevision,
            10 => Self::ApplicationSoftwareVersion,
            11 => Self::Location,
            12 => Self::NumberOfApduRetries,
            13 => Self::SegmentationSupported,
            14 => Self::ApduTimeout,
            15 => Self::EventState,
            16 => Self::OutOfService,
            17 => Self::NotificationClass,
            18 => Self::AlarmValue,
            19 => Self::AcknowledgedTransitions,
            20 => Self::NotifyType,
            21 => Self::EventDetectionEnable,
            22 => Self::AckedTransitions,
            23 => Self::EventTimeStamps,
            24 => Self::TimeOfStateChange,
            25 => Self::TimeOfLastStateChange,
            26 => Self::StatusFlags,
            27 => Self::FileSize,
            28 => Self::FileAccessMethod,
            29 => Self::FileOpeningTag,
            30 => Self::FileClosingTag,
            31 => Self::Priority,
            v => Self::Unknown(v),
        }
    }
}
