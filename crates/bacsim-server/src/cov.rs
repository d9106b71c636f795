//! COV subscription engine.
//!
//! Subscriptions live on the object they monitor. After every committed
//! write whose effective value changed, the engine walks that object's
//! subscription list, filters on the monitored-property set, refreshes each
//! matched subscription's timestamp, and produces ready-to-send notification
//! datagrams. Dispatch is synchronous on the writer's path; the server sends
//! the request's reply before these datagrams.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bacsim_core::bvlc::{self, BvlcFunction};
use bacsim_core::encoding::Writer;
use bacsim_core::npdu::Npdu;
use bacsim_core::services::cov_notification::{CovNotification, CovValue};
use bacsim_core::types::{ObjectId, PropertyId};
use bacsim_datalink::TransportAddress;

use crate::clock;
use crate::object::{BacnetObject, ObjectCore, PropertyChange};

/// A change-notification registration owned by the monitored object.
#[derive(Debug, Clone)]
pub struct CovSubscription {
    pub subscription_id: u32,
    /// Instance number of the device issuing notifications.
    pub device_id: u32,
    pub object_id: ObjectId,
    pub lifetime_seconds: u32,
    pub confirmed: bool,
    /// Empty list means every property.
    pub monitored_properties: Vec<PropertyId>,
    /// Set at creation, refreshed on every dispatched notification.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub client_address: TransportAddress,
}

impl CovSubscription {
    fn monitors(&self, property_id: PropertyId) -> bool {
        self.monitored_properties.is_empty() || self.monitored_properties.contains(&property_id)
    }
}

static SUBSCRIPTION_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generates a process-unique subscription id: the high half comes from the
/// nanosecond timestamp, the low 16 bits from an atomic counter.
pub fn next_subscription_id() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let stamp = (nanos >> 32) as u32;
    let counter = SUBSCRIPTION_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    (stamp & 0xFFFF_0000) | (counter & 0x0000_FFFF)
}

/// A datagram the server owes some endpoint.
#[derive(Debug, Clone)]
pub struct OutboundDatagram {
    pub target: TransportAddress,
    pub frame: Vec<u8>,
}

/// Builds notification datagrams for committed changes.
#[derive(Debug, Default)]
pub struct CovEngine {
    invoke_id: AtomicU8,
}

impl CovEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_invoke_id(&self) -> u8 {
        self.invoke_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Fans one change out to the object's matching subscriptions.
    pub fn notifications_for(
        &self,
        device_id: ObjectId,
        object: &mut ObjectCore,
        change: &PropertyChange,
    ) -> Vec<OutboundDatagram> {
        let monitored_object_id = object.object_id();
        let mut out = Vec::new();
        let now = clock::now();
        for subscription in object.subscriptions_mut() {
            if !subscription.monitors(change.property_id) {
                continue;
            }

            let notification = CovNotification {
                subscription_id: subscription.subscription_id,
                initiating_device_id: device_id,
                monitored_object_id,
                values: vec![CovValue {
                    property_id: change.property_id,
                    priority: change.priority,
                    value: change.value.as_value(),
                }],
            };

            match build_frame(&notification, subscription.confirmed, || {
                self.next_invoke_id()
            }) {
                Ok(frame) => {
                    subscription.timestamp = now;
                    log::debug!(
                        "cov notification: subscription {} object {} property {:?} -> {}",
                        subscription.subscription_id,
                        monitored_object_id,
                        change.property_id,
                        subscription.client_address,
                    );
                    out.push(OutboundDatagram {
                        target: subscription.client_address,
                        frame,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "failed to encode cov notification for subscription {}: {e}",
                        subscription.subscription_id
                    );
                }
            }
        }
        out
    }
}

fn build_frame(
    notification: &CovNotification<'_>,
    confirmed: bool,
    next_invoke_id: impl FnOnce() -> u8,
) -> Result<Vec<u8>, bacsim_core::EncodeError> {
    let mut buf = [0u8; 512];
    let mut w = Writer::new(&mut buf);
    Npdu::reply().encode(&mut w)?;
    if confirmed {
        notification.encode_confirmed(&mut w, next_invoke_id())?;
    } else {
        notification.encode_unconfirmed(&mut w)?;
    }
    bvlc::wrap_frame(BvlcFunction::OriginalUnicastNpdu, w.as_written())
}
