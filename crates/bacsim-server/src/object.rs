//! The polymorphic object model.
//!
//! Every object shares one base record ([`ObjectCore`]) carrying its
//! identity, the default-slot property map, the per-property priority
//! arrays, the event list, and the COV subscription list. Concrete objects
//! are a closed sum: all scalar types are [`Object::Standard`] over the bare
//! core, and files add their byte buffer in [`Object::File`]. The device is
//! a separate root (see [`crate::Device`]) holding its own core plus the
//! object list.

use std::collections::{BTreeMap, HashMap};

use bacsim_core::services::errors::ServiceError;
use bacsim_core::types::{ObjectId, ObjectType, PropertyId};

use crate::clock;
use crate::cov::CovSubscription;
use crate::value::PropertyValue;

/// Status-flag bits stored in the `StatusFlags` property.
pub const STATUS_FLAG_IN_ALARM: u8 = 1 << 0;
pub const STATUS_FLAG_FAULT: u8 = 1 << 1;
pub const STATUS_FLAG_OVERRIDDEN: u8 = 1 << 2;
pub const STATUS_FLAG_OUT_OF_SERVICE: u8 = 1 << 3;

/// Priority slot that writes the default value and clears slots 0–15.
pub const DEFAULT_PRIORITY: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    Normal,
    Fault,
    OffNormal,
    HighLimit,
    LowLimit,
}

impl EventState {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Fault => 1,
            Self::OffNormal => 2,
            Self::HighLimit => 3,
            Self::LowLimit => 4,
        }
    }

    /// Unrecognised values read as Normal, matching the property default.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Fault,
            2 => Self::OffNormal,
            3 => Self::HighLimit,
            4 => Self::LowLimit,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccessMethod {
    Stream,
    Record,
}

impl FileAccessMethod {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Stream => 0,
            Self::Record => 1,
        }
    }
}

/// An alarm transition recorded on the object.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: ObjectType,
    pub state: EventState,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: String,
    pub notification_class: u32,
}

/// A committed write whose effective value differs from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub property_id: PropertyId,
    pub value: PropertyValue,
    pub priority: u8,
}

/// The capability every addressable object exposes.
pub trait BacnetObject {
    fn object_id(&self) -> ObjectId;
    fn object_name(&self) -> &str;
    fn object_type(&self) -> ObjectType;
    fn read_property(&self, property_id: PropertyId) -> Option<PropertyValue>;
    fn write_property(
        &mut self,
        property_id: PropertyId,
        value: PropertyValue,
        priority: u8,
    ) -> Result<Option<PropertyChange>, ServiceError>;
}

/// Alarm capability layered over the property store.
pub trait Alarmable: BacnetObject {
    fn event_state(&self) -> EventState;
    fn notification_class(&self) -> u32;
    fn status_flags(&self) -> u8;
    /// Records an event, stores the state, and keeps the in-alarm flag in
    /// step with it.
    fn generate_event(&mut self, state: EventState, message: &str);
    /// Returns the object to Normal and clears the in-alarm flag.
    fn acknowledge(&mut self);
}

/// Shared base record for every object.
#[derive(Debug, Clone)]
pub struct ObjectCore {
    id: ObjectId,
    name: String,
    properties: HashMap<PropertyId, PropertyValue>,
    prioritized: HashMap<PropertyId, BTreeMap<u8, PropertyValue>>,
    events: Vec<Event>,
    subscriptions: Vec<CovSubscription>,
}

impl ObjectCore {
    pub fn new(object_type: ObjectType, instance: u32, name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(object_type, instance),
            name: name.into(),
            properties: HashMap::new(),
            prioritized: HashMap::new(),
            events: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Seeds a default-slot property without going through the write path.
    pub fn set_property(&mut self, property_id: PropertyId, value: impl Into<PropertyValue>) {
        self.properties.insert(property_id, value.into());
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn subscriptions(&self) -> &[CovSubscription] {
        &self.subscriptions
    }

    pub fn subscriptions_mut(&mut self) -> &mut [CovSubscription] {
        &mut self.subscriptions
    }

    pub fn add_subscription(&mut self, subscription: CovSubscription) {
        self.subscriptions.push(subscription);
    }

    /// Removes the subscription with the given id; true when one existed.
    pub fn remove_subscription(&mut self, subscription_id: u32) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|s| s.subscription_id != subscription_id);
        self.subscriptions.len() != before
    }
}

impl BacnetObject for ObjectCore {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn object_name(&self) -> &str {
        &self.name
    }

    fn object_type(&self) -> ObjectType {
        self.id.object_type()
    }

    fn read_property(&self, property_id: PropertyId) -> Option<PropertyValue> {
        if let Some(slots) = self.prioritized.get(&property_id) {
            // BTreeMap iterates slots in ascending order: 0 is strongest.
            if let Some((_, value)) = slots.iter().next() {
                return Some(value.clone());
            }
        }
        self.properties.get(&property_id).cloned()
    }

    fn write_property(
        &mut self,
        property_id: PropertyId,
        value: PropertyValue,
        priority: u8,
    ) -> Result<Option<PropertyChange>, ServiceError> {
        if priority > DEFAULT_PRIORITY {
            return Err(ServiceError::InvalidParameterDataType);
        }

        let old = self.read_property(property_id);

        if priority == DEFAULT_PRIORITY {
            self.properties.insert(property_id, value);
            self.prioritized.remove(&property_id);
        } else {
            self.prioritized
                .entry(property_id)
                .or_default()
                .insert(priority, value);
        }

        let new = self.read_property(property_id);
        if old != new {
            Ok(new.map(|value| PropertyChange {
                property_id,
                value,
                priority,
            }))
        } else {
            Ok(None)
        }
    }
}

impl Alarmable for ObjectCore {
    fn event_state(&self) -> EventState {
        match self.read_property(PropertyId::EventState) {
            Some(PropertyValue::Enumerated(v)) => EventState::from_u8(v),
            _ => EventState::Normal,
        }
    }

    fn notification_class(&self) -> u32 {
        match self.read_property(PropertyId::NotificationClass) {
            Some(PropertyValue::Unsigned32(v)) => v,
            _ => 0,
        }
    }

    fn status_flags(&self) -> u8 {
        match self.read_property(PropertyId::StatusFlags) {
            Some(PropertyValue::Unsigned8(v)) => v,
            _ => 0,
        }
    }

    fn generate_event(&mut self, state: EventState, message: &str) {
        self.events.push(Event {
            event_type: self.object_type(),
            state,
            timestamp: clock::now(),
            message: message.to_owned(),
            notification_class: self.notification_class(),
        });

        self.set_property(
            PropertyId::EventState,
            PropertyValue::Enumerated(state.to_u8()),
        );

        let mut flags = self.status_flags();
        if state != EventState::Normal {
            flags |= STATUS_FLAG_IN_ALARM;
        } else {
            flags &= !STATUS_FLAG_IN_ALARM;
        }
        self.set_property(PropertyId::StatusFlags, PropertyValue::Unsigned8(flags));
    }

    fn acknowledge(&mut self) {
        self.set_property(
            PropertyId::EventState,
            PropertyValue::Enumerated(EventState::Normal.to_u8()),
        );
        let flags = self.status_flags() & !STATUS_FLAG_IN_ALARM;
        self.set_property(PropertyId::StatusFlags, PropertyValue::Unsigned8(flags));
    }
}

/// A file object: the base record plus a byte buffer.
///
/// The `FileSize` property tracks the buffer length across every mutation.
#[derive(Debug, Clone)]
pub struct FileObject {
    pub core: ObjectCore,
    data: Vec<u8>,
    access_method: FileAccessMethod,
}

impl FileObject {
    pub fn new(instance: u32, name: impl Into<String>, access_method: FileAccessMethod) -> Self {
        let mut core = ObjectCore::new(ObjectType::File, instance, name);
        core.set_property(PropertyId::FileSize, PropertyValue::Unsigned32(0));
        core.set_property(
            PropertyId::FileAccessMethod,
            PropertyValue::Enumerated(access_method.to_u8()),
        );
        core.set_property(PropertyId::FileOpeningTag, PropertyValue::from(""));
        core.set_property(PropertyId::FileClosingTag, PropertyValue::from(""));
        Self {
            core,
            data: Vec::new(),
            access_method,
        }
    }

    pub fn access_method(&self) -> FileAccessMethod {
        self.access_method
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads up to `count` bytes at `start`; past-EOF reads are empty and
    /// in-range reads are clamped to the buffer.
    pub fn read_data(&self, start: u32, count: u32) -> &[u8] {
        let start = start as usize;
        if start >= self.data.len() {
            return &[];
        }
        let end = start.saturating_add(count as usize).min(self.data.len());
        &self.data[start..end]
    }

    /// Writes `data` at `start`, zero-extending the buffer as needed.
    pub fn write_data(&mut self, start: u32, data: &[u8]) {
        let start = start as usize;
        let end = start + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);
        self.sync_file_size();
    }

    /// Truncates the file to empty.
    pub fn clear(&mut self) {
        self.data.clear();
        self.sync_file_size();
    }

    fn sync_file_size(&mut self) {
        self.core.set_property(
            PropertyId::FileSize,
            PropertyValue::Unsigned32(self.data.len() as u32),
        );
    }
}

/// Closed set of concrete objects held by the device.
#[derive(Debug, Clone)]
pub enum Object {
    Standard(ObjectCore),
    File(FileObject),
}

impl Object {
    /// A scalar object of the given type with no extra state.
    pub fn standard(object_type: ObjectType, instance: u32, name: impl Into<String>) -> Self {
        Self::Standard(ObjectCore::new(object_type, instance, name))
    }

    pub fn file(instance: u32, name: impl Into<String>, access_method: FileAccessMethod) -> Self {
        Self::File(FileObject::new(instance, name, access_method))
    }

    pub fn core(&self) -> &ObjectCore {
        match self {
            Self::Standard(core) => core,
            Self::File(file) => &file.core,
        }
    }

    pub fn core_mut(&mut self) -> &mut ObjectCore {
        match self {
            Self::Standard(core) => core,
            Self::File(file) => &mut file.core,
        }
    }

    pub fn as_file(&self) -> Option<&FileObject> {
        match self {
            Self::File(file) => Some(file),
            Self::Standard(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileObject> {
        match self {
            Self::File(file) => Some(file),
            Self::Standard(_) => None,
        }
    }
}

impl BacnetObject for Object {
    fn object_id(&self) -> ObjectId {
        self.core().object_id()
    }

    fn object_name(&self) -> &str {
        self.core().object_name()
    }

    fn object_type(&self) -> ObjectType {
        self.core().object_type()
    }

    fn read_property(&self, property_id: PropertyId) -> Option<PropertyValue> {
        self.core().read_property(property_id)
    }

    fn write_property(
        &mut self,
        property_id: PropertyId,
        value: PropertyValue,
        priority: u8,
    ) -> Result<Option<PropertyChange>, ServiceError> {
        self.core_mut().write_property(property_id, value, priority)
    }
}
