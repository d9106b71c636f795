#![allow(async_fn_in_trait)]

//! Datagram transport layer for the bacsim server.
//!
//! The protocol core consumes the [`Transport`] trait (receive a datagram
//! with its source address, send a datagram to an address, close) and is
//! otherwise transport-agnostic. [`UdpTransport`] is the BACnet/IP
//! implementation over UDP port 47808.

pub mod address;
pub mod traits;
pub mod udp;

pub use address::TransportAddress;
pub use traits::{Transport, TransportError};
pub use udp::UdpTransport;
