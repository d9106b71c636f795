//! BACnet/IP application-layer frame codec in pure Rust.
//!
//! `bacsim-core` provides encoding and decoding of the three wire layers a
//! BACnet/IP device speaks — BVLC framing, NPDU network headers, and APDU
//! service frames — together with the tagged value codec and the per-service
//! request/response payloads. The crate is transport-agnostic and
//! `no_std`-compatible; it underpins the `bacsim-server` device simulator.
//!
//! # Feature flags
//!
//! - **`std`** (default) — enables `std::error::Error` implementations.
//! - **`alloc`** (default) — enables the service codecs that build lists
//!   (ReadPropertyMultiple, COV notifications, etc.).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// APDU (Application Protocol Data Unit) header types.
pub mod apdu;
/// BVLC (BACnet Virtual Link Control) datagram framing.
pub mod bvlc;
/// Bounds-checked byte reader and writer.
pub mod encoding;
/// Codec error types.
pub mod error;
/// NPDU (Network Protocol Data Unit) encoding and decoding.
pub mod npdu;
/// Service request/response codecs and the service error taxonomy.
pub mod services;
/// Core data types: identifiers, date-time, property values.
pub mod types;

pub use error::{DecodeError, EncodeError};
