use crate::apdu::{ComplexAckHeader, ConfirmedRequestHeader};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::value_codec::{context_marker, is_context_marker};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_SUBSCRIBE_COV: u8 = 0x0E;
pub const SERVICE_CANCEL_COV_SUBSCRIPTION: u8 = 0x25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeCovRequest {
    pub object_id: ObjectId,
    pub all_properties: bool,
    pub lifetime_seconds: u32,
    pub confirmed: bool,
}

impl SubscribeCovRequest {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_SUBSCRIBE_COV).encode(w)?;
        self.object_id.encode(w)?;
        w.write_u8(u8::from(self.all_properties))?;
        w.write_be_u32(self.lifetime_seconds)?;
        w.write_u8(u8::from(self.confirmed))
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            all_properties: (r.read_u8()? & 0x01) != 0,
            lifetime_seconds: r.read_be_u32()?,
            confirmed: (r.read_u8()? & 0x01) != 0,
        })
    }
}

/// Acknowledgement shared by both subscription services: the generated
/// subscription id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionAck {
    pub subscription_id: u32,
}

impl SubscriptionAck {
    pub fn encode(
        &self,
        w: &mut Writer<'_>,
        invoke_id: u8,
        service_choice: u8,
    ) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, service_choice).encode(w)?;
        w.write_be_u32(self.subscription_id)
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            subscription_id: r.read_be_u32()?,
        })
    }
}

/// Cancellation request. The optional subscriber/initiator parameters are
/// introduced by context markers 1–3; markers present without their payload
/// are a framing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelCovRequest {
    pub subscription_id: u32,
    pub process_id: Option<u32>,
    pub subscriber: Option<ObjectId>,
    pub initiator: Option<ObjectId>,
}

impl CancelCovRequest {
    pub const fn for_subscription(subscription_id: u32) -> Self {
        Self {
            subscription_id,
            process_id: None,
            subscriber: None,
            initiator: None,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(invoke_id, SERVICE_CANCEL_COV_SUBSCRIPTION).encode(w)?;
        w.write_be_u32(self.subscription_id)?;
        if let Some(process_id) = self.process_id {
            w.write_u8(context_marker(1))?;
            w.write_be_u32(process_id)?;
        }
        if let Some(subscriber) = self.subscriber {
            w.write_u8(context_marker(2))?;
            subscriber.encode(w)?;
        }
        if let Some(initiator) = self.initiator {
            w.write_u8(context_marker(3))?;
            initiator.encode(w)?;
        }
        Ok(())
    }

    pub fn decode_payload(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let subscription_id = r.read_be_u32()?;
        let mut req = Self::for_subscription(subscription_id);

        while !r.is_empty() {
            let marker = r.read_u8()?;
            if !is_context_marker(marker) {
                return Err(DecodeError::InvalidTag);
            }
            match marker & 0x1F {
                1 => req.process_id = Some(r.read_be_u32()?),
                2 => req.subscriber = Some(ObjectId::decode(r)?),
                3 => req.initiator = Some(ObjectId::decode(r)?),
                _ => return Err(DecodeError::InvalidTag),
            }
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelCovRequest, SubscribeCovRequest, SubscriptionAck, SERVICE_SUBSCRIBE_COV};
    use crate::apdu::ComplexAckHeader;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType};
    use crate::DecodeError;

    #[test]
    fn subscribe_roundtrip() {
        let req = SubscribeCovRequest {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            all_properties: true,
            lifetime_seconds: 60,
            confirmed: false,
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 20).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(SubscribeCovRequest::decode_payload(&mut r).unwrap(), req);
    }

    #[test]
    fn subscription_ack_roundtrip() {
        let ack = SubscriptionAck {
            subscription_id: 0x1234_0001,
        };
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w, 20, SERVICE_SUBSCRIBE_COV).unwrap();

        let mut r = Reader::new(w.as_written());
        let header = ComplexAckHeader::decode(&mut r).unwrap();
        assert_eq!(header.service_choice, SERVICE_SUBSCRIBE_COV);
        assert_eq!(SubscriptionAck::decode_payload(&mut r).unwrap(), ack);
    }

    #[test]
    fn cancel_roundtrip_with_optional_parameters() {
        let req = CancelCovRequest {
            subscription_id: 99,
            process_id: Some(1),
            subscriber: Some(ObjectId::new(ObjectType::Device, 55)),
            initiator: None,
        };

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w, 2).unwrap();

        let mut r = Reader::new(&w.as_written()[4..]);
        assert_eq!(CancelCovRequest::decode_payload(&mut r).unwrap(), req);
    }

    #[test]
    fn cancel_rejects_non_context_trailer() {
        let payload = [0, 0, 0, 7, 0x41];
        let mut r = Reader::new(&payload);
        assert_eq!(
            CancelCovRequest::decode_payload(&mut r).unwrap_err(),
            DecodeError::InvalidTag
        );
    }
}
