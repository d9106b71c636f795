//! The device root and object store.
//!
//! One [`Device`] exists per server process. It owns the object list and is
//! itself addressable through the same lookup path, so property services
//! aimed at `(Device, instance)` operate on the device's own core record.

use bacsim_core::services::errors::ServiceError;
use bacsim_core::types::object_id::MAX_INSTANCE;
use bacsim_core::types::{ObjectId, ObjectType, PropertyId};

use crate::object::{BacnetObject, FileObject, Object, ObjectCore, PropertyChange};
use crate::value::PropertyValue;

/// Vendor identifier announced in I-Am.
pub const VENDOR_ID: u16 = 0;

#[derive(Debug, Clone)]
pub struct Device {
    core: ObjectCore,
    objects: Vec<Object>,
}

impl Device {
    /// Creates the device with its well-known default properties.
    pub fn new(instance: u32, name: impl Into<String>, location: impl Into<String>) -> Self {
        debug_assert!((1..=MAX_INSTANCE).contains(&instance));
        let mut core = ObjectCore::new(ObjectType::Device, instance, name);
        core.set_property(PropertyId::Location, location.into());
        core.set_property(PropertyId::DeviceType, "Rust BACnet Server");
        core.set_property(PropertyId::ManufacturerName, "bacsim");
        core.set_property(PropertyId::ModelName, "Simulator v1.0");
        core.set_property(PropertyId::FirmwareRevision, "1.0");
        core.set_property(PropertyId::ApplicationSoftwareVersion, "1.0");
        Self {
            core,
            objects: Vec::new(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.core.object_id()
    }

    pub fn instance(&self) -> u32 {
        self.object_id().instance()
    }

    pub fn name(&self) -> &str {
        self.core.object_name()
    }

    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn find_object(&self, object_id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|o| o.object_id() == object_id)
    }

    pub fn find_object_mut(&mut self, object_id: ObjectId) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.object_id() == object_id)
    }

    /// True when `object_id` names the device itself or a held object.
    pub fn contains(&self, object_id: ObjectId) -> bool {
        object_id == self.core.object_id() || self.find_object(object_id).is_some()
    }

    /// The base record of whichever object `object_id` names, the device's
    /// own included.
    pub fn object_core(&self, object_id: ObjectId) -> Option<&ObjectCore> {
        if object_id == self.core.object_id() {
            Some(&self.core)
        } else {
            self.find_object(object_id).map(Object::core)
        }
    }

    pub fn object_core_mut(&mut self, object_id: ObjectId) -> Option<&mut ObjectCore> {
        if object_id == self.core.object_id() {
            Some(&mut self.core)
        } else {
            self.find_object_mut(object_id).map(Object::core_mut)
        }
    }

    /// Priority-aware property read.
    pub fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue, ServiceError> {
        let core = self
            .object_core(object_id)
            .ok_or(ServiceError::ObjectNotExist)?;
        core.read_property(property_id)
            .ok_or(ServiceError::PropertyNotExist)
    }

    /// Prioritized write. Returns the change event when the effective value
    /// moved.
    pub fn write_property(
        &mut self,
        object_id: ObjectId,
        property_id: PropertyId,
        value: PropertyValue,
        priority: u8,
    ) -> Result<Option<PropertyChange>, ServiceError> {
        let core = self
            .object_core_mut(object_id)
            .ok_or(ServiceError::ObjectNotExist)?;
        core.write_property(property_id, value, priority)
    }

    /// Resolves `object_id` to a file object for the atomic file services.
    pub fn file(&self, object_id: ObjectId) -> Result<&FileObject, ServiceError> {
        let object = self
            .find_object(object_id)
            .ok_or(ServiceError::ObjectNotExist)?;
        object.as_file().ok_or(ServiceError::ObjectNotOfRequiredType)
    }

    pub fn file_mut(&mut self, object_id: ObjectId) -> Result<&mut FileObject, ServiceError> {
        let object = self
            .find_object_mut(object_id)
            .ok_or(ServiceError::ObjectNotExist)?;
        object
            .as_file_mut()
            .ok_or(ServiceError::ObjectNotOfRequiredType)
    }

    /// Removes a subscription by id wherever it lives; true when found.
    pub fn remove_subscription(&mut self, subscription_id: u32) -> bool {
        if self.core.remove_subscription(subscription_id) {
            return true;
        }
        self.objects
            .iter_mut()
            .any(|o| o.core_mut().remove_subscription(subscription_id))
    }
}

#[cfg(test)]
mod tests {
    use super::Device;
    use crate::object::{FileAccessMethod, Object};
    use crate::value::PropertyValue;
    use bacsim_core::services::errors::ServiceError;
    use bacsim_core::types::{ObjectId, ObjectType, PropertyId};

    fn device() -> Device {
        let mut device = Device::new(1001, "sim", "lab");
        device.add_object(Object::standard(ObjectType::AnalogInput, 1, "AI-1"));
        device.add_object(Object::file(1, "config.bin", FileAccessMethod::Stream));
        device
    }

    #[test]
    fn device_is_addressable_like_any_object() {
        let device = device();
        let id = ObjectId::new(ObjectType::Device, 1001);
        assert!(device.contains(id));
        assert_eq!(
            device.read_property(id, PropertyId::ModelName).unwrap(),
            PropertyValue::from("Simulator v1.0")
        );
    }

    #[test]
    fn missing_object_and_property_are_distinct_errors() {
        let device = device();
        assert_eq!(
            device
                .read_property(
                    ObjectId::new(ObjectType::AnalogInput, 99),
                    PropertyId::PresentValue
                )
                .unwrap_err(),
            ServiceError::ObjectNotExist
        );
        assert_eq!(
            device
                .read_property(
                    ObjectId::new(ObjectType::AnalogInput, 1),
                    PropertyId::PresentValue
                )
                .unwrap_err(),
            ServiceError::PropertyNotExist
        );
    }

    #[test]
    fn file_lookup_checks_object_type() {
        let mut device = device();
        assert!(device.file(ObjectId::new(ObjectType::File, 1)).is_ok());
        assert_eq!(
            device
                .file_mut(ObjectId::new(ObjectType::AnalogInput, 1))
                .unwrap_err(),
            ServiceError::ObjectNotOfRequiredType
        );
        assert_eq!(
            device.file(ObjectId::new(ObjectType::File, 9)).unwrap_err(),
            ServiceError::ObjectNotExist
        );
    }

    #[test]
    fn write_through_store_reports_changes() {
        let mut device = device();
        let id = ObjectId::new(ObjectType::AnalogInput, 1);
        let change = device
            .write_property(id, PropertyId::PresentValue, PropertyValue::Real(22.5), 16)
            .unwrap()
            .unwrap();
        assert_eq!(change.value, PropertyValue::Real(22.5));

        let repeat = device
            .write_property(id, PropertyId::PresentValue, PropertyValue::Real(22.5), 16)
            .unwrap();
        assert!(repeat.is_none());
    }
}
