//! BACnet/IP device simulator.
//!
//! A single logical device exposes a collection of typed objects and answers
//! the standard services: discovery (Who-Is / I-Am), property read/write
//! with 17-level priority arrays, atomic file access, COV subscription with
//! confirmed/unconfirmed change notifications, and alarm acknowledgement.
//!
//! Layering follows the wire: [`Server`] owns the transport and the listener
//! loop, [`dispatch`] walks BVLC → NPDU → APDU and routes service requests,
//! [`Device`] holds the object store, and [`cov`] turns committed writes
//! into notification datagrams.

pub mod clock;
pub mod config;
pub mod cov;
pub mod device;
pub mod dispatch;
pub mod object;
pub mod server;
pub mod value;

pub use config::{ConfigError, ServerConfig};
pub use cov::{CovEngine, CovSubscription, OutboundDatagram};
pub use device::Device;
pub use object::{Alarmable, BacnetObject, Event, EventState, FileObject, Object, ObjectCore};
pub use server::{Server, ServerError};
pub use value::PropertyValue;
