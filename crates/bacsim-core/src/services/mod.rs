pub mod acknowledge_alarm;
pub mod atomic_read_file;
pub mod atomic_write_file;
#[cfg(feature = "alloc")]
pub mod cov_notification;
pub mod delete_file;
pub mod errors;
pub mod i_am;
pub mod read_property;
#[cfg(feature = "alloc")]
pub mod read_property_multiple;
pub mod subscribe_cov;
#[cfg(feature = "alloc")]
pub mod subscribe_cov_property;
pub mod value_codec;
pub mod who_is;
pub mod write_property;
#[cfg(feature = "alloc")]
pub mod write_property_multiple;

pub use errors::{ErrorClass, ServiceError};
