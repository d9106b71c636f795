use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bacsim_core::types::object_id::MAX_INSTANCE;
use bacsim_datalink::TransportAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("device instance {0} outside 1..={MAX_INSTANCE}")]
    InstanceOutOfRange(u32),
    #[error("device name must not be empty")]
    EmptyDeviceName,
}

/// Startup parameters for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub device_instance: u32,
    pub device_name: String,
    pub location: String,
}

impl ServerConfig {
    pub fn new(
        port: u16,
        device_instance: u32,
        device_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_INSTANCE).contains(&device_instance) {
            return Err(ConfigError::InstanceOutOfRange(device_instance));
        }
        let device_name = device_name.into();
        if device_name.is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }
        Ok(Self {
            port,
            device_instance,
            device_name,
            location: location.into(),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: TransportAddress::BACNET_IP_DEFAULT_PORT,
            device_instance: 1001,
            device_name: "bacsim".to_owned(),
            location: "unspecified".to_owned(),
        }
    }
}
