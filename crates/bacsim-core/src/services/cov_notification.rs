//! COV notification codec.
//!
//! The notification carries the subscription id, the initiating device's
//! object identifier, the monitored object identifier, and a counted list of
//! (property, priority, value) records. It is sent as an
//! Unconfirmed-Request, or as a Confirmed-Request when the subscription
//! asked for confirmed delivery; either way the service choice is `0x0A`.

use alloc::vec::Vec;

use crate::apdu::{ConfirmedRequestHeader, UnconfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{decode_value, encode_value};
use crate::types::{ObjectId, PropertyId, Value};
use crate::{DecodeError, EncodeError};

pub const SERVICE_COV_NOTIFICATION: u8 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovValue<'a> {
    pub property_id: PropertyId,
    pub priority: u8,
    pub value: Value<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CovNotification<'a> {
    pub subscription_id: u32,
    pub initiating_device_id: ObjectId,
    pub monitored_object_id: ObjectId,
    pub values: Vec<CovValue<'a>>,
}

impl<'a> CovNotification<'a> {
    pub fn encode_unconfirmed(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        UnconfirmedRequestHeader {
            service_choice: SERVICE_COV_NOTIFICATION,
        }
        .encode(w)?;
        self.encode_payload(w)
    }

    pub fn encode_confirmed(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_COV_NOTIFICATION).encode(w)?;
        self.encode_payload(w)
    }

    fn encode_payload(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.values.len() > u8::MAX as usize {
            return Err(EncodeError::InvalidLength);
        }
        w.write_be_u32(self.subscription_id)?;
        self.initiating_device_id.encode(w)?;
        self.monitored_object_id.encode(w)?;
        w.write_u8(self.values.len() as u8)?;
        for value in &self.values {
            w.write_be_u16(value.property_id.to_u16())?;
            w.write_u8(value.priority)?;
            encode_value(w, &value.value)?;
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let subscription_id = r.read_be_u32()?;
        let initiating_device_id = ObjectId::decode(r)?;
        let monitored_object_id = ObjectId::decode(r)?;
        let count = r.read_u8()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(CovValue {
                property_id: PropertyId::from_u16(r.read_be_u16()?),
                priority: r.read_u8()?,
                value: decode_value(r)?,
            });
        }
        Ok(Self {
            subscription_id,
            initiating_device_id,
            monitored_object_id,
            values,
        })
    }
}
