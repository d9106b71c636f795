//! Server lifecycle: the listener loop over a datagram transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bacsim_core::types::{ObjectId, PropertyId};
use bacsim_datalink::{Transport, TransportAddress, TransportError};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::ConfigError;
use crate::cov::CovEngine;
use crate::device::Device;
use crate::dispatch::{self, DispatchOutcome};
use crate::value::PropertyValue;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The protocol server: one device behind one datagram transport.
///
/// Each received datagram is processed to completion (parse, dispatch,
/// reply, notification fan-out) before the next one is read. The device
/// sits behind an async `RwLock` so bootstrap code and the demo mutator can
/// share it with the listener loop.
pub struct Server<T: Transport> {
    device: Arc<RwLock<Device>>,
    engine: CovEngine,
    transport: T,
    running: Arc<AtomicBool>,
}

impl<T: Transport> Server<T> {
    pub fn new(device: Device, transport: T) -> Self {
        Self {
            device: Arc::new(RwLock::new(device)),
            engine: CovEngine::new(),
            transport,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle to the device, for bootstrap and demo code.
    pub fn device(&self) -> Arc<RwLock<Device>> {
        Arc::clone(&self.device)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the listener loop and closes the transport.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.transport.close();
    }

    /// Runs the listener loop until the transport closes.
    pub async fn run(&self) -> Result<(), ServerError> {
        self.running.store(true, Ordering::Release);
        {
            let device = self.device.read().await;
            log::info!(
                "server running: device {} \"{}\" with {} objects",
                device.instance(),
                device.name(),
                device.objects().len()
            );
        }

        let mut buf = [0u8; bacsim_datalink::udp::MAX_DATAGRAM_LEN];
        loop {
            let (n, source) = match self.transport.recv(&mut buf).await {
                Ok(received) => received,
                Err(TransportError::Closed) => {
                    log::info!("transport closed, server stopping");
                    return Ok(());
                }
                Err(e) => {
                    if !self.is_running() {
                        return Ok(());
                    }
                    log::warn!("receive error: {e}");
                    continue;
                }
            };

            self.process(&buf[..n], source).await;
        }
    }

    /// Parses and answers one datagram, then delivers any notifications.
    pub async fn process(&self, datagram: &[u8], source: TransportAddress) {
        let outcome = {
            let mut device = self.device.write().await;
            dispatch::handle_datagram(&mut device, &self.engine, datagram, source)
        };

        let DispatchOutcome {
            reply,
            notifications,
        } = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                log::debug!("dropping {}-byte datagram from {source}: {e}", datagram.len());
                return;
            }
        };

        if let Some(frame) = reply {
            if let Err(e) = self.transport.send(source, &frame).await {
                log::warn!("failed to send reply to {source}: {e}");
            }
        }
        for notification in notifications {
            if let Err(e) = self
                .transport
                .send(notification.target, &notification.frame)
                .await
            {
                log::warn!(
                    "failed to send cov notification to {}: {e}",
                    notification.target
                );
            }
        }
    }

    /// Programmatic write used by the demo mutator: commits the value at the
    /// default slot and delivers the resulting COV notifications.
    pub async fn simulate_change(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
        value: PropertyValue,
    ) -> Result<(), ServerError> {
        let notifications = {
            let mut device = self.device.write().await;
            match device.write_property(object_id, property_id, value, 16) {
                Ok(Some(change)) => {
                    let device_id = device.object_id();
                    match device.object_core_mut(object_id) {
                        Some(core) => self.engine.notifications_for(device_id, core, &change),
                        None => Vec::new(),
                    }
                }
                Ok(None) => Vec::new(),
                Err(e) => {
                    log::warn!("simulated change on {object_id} rejected: {e}");
                    Vec::new()
                }
            }
        };

        for notification in notifications {
            self.transport
                .send(notification.target, &notification.frame)
                .await?;
        }
        Ok(())
    }
}
