//! Whole-frame byte fixtures: every layer encoded together and compared
//! against hand-assembled datagrams.

use bacsim_core::apdu::{ConfirmedRequestHeader, ErrorPdu, SimpleAck, UnconfirmedRequestHeader};
use bacsim_core::bvlc::{self, BvlcFunction};
use bacsim_core::encoding::{Reader, Writer};
use bacsim_core::npdu::Npdu;
use bacsim_core::services::errors::ServiceError;
use bacsim_core::services::i_am::IAm;
use bacsim_core::services::read_property::{ReadPropertyRequest, SERVICE_READ_PROPERTY};
use bacsim_core::services::subscribe_cov::SubscribeCovRequest;
use bacsim_core::services::who_is::{WhoIsRequest, SERVICE_WHO_IS};
use bacsim_core::services::write_property::SERVICE_WRITE_PROPERTY;
use bacsim_core::types::{ObjectId, ObjectType, PropertyId};
use bacsim_core::DecodeError;

fn frame(function: BvlcFunction, build: impl FnOnce(&mut Writer<'_>)) -> Vec<u8> {
    let mut buf = [0u8; 256];
    let mut w = Writer::new(&mut buf);
    build(&mut w);
    bvlc::wrap_frame(function, w.as_written()).unwrap()
}

#[test]
fn broadcast_who_is_fixture_parses() {
    let datagram = [0x81, 0x0B, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08];

    let (function, body) = bvlc::split_frame(&datagram).unwrap();
    assert_eq!(function, BvlcFunction::OriginalBroadcastNpdu);

    let mut r = Reader::new(body);
    let npdu = Npdu::decode(&mut r).unwrap();
    assert!(!npdu.network_message);
    assert!(npdu.destination.is_none());

    let header = UnconfirmedRequestHeader::decode(&mut r).unwrap();
    assert_eq!(header.service_choice, SERVICE_WHO_IS);
    assert_eq!(
        WhoIsRequest::decode_payload(&mut r).unwrap(),
        WhoIsRequest::global()
    );
}

#[test]
fn who_is_global_frame_matches_fixture() {
    let datagram = frame(BvlcFunction::OriginalBroadcastNpdu, |w| {
        Npdu::reply().encode(w).unwrap();
        WhoIsRequest::global().encode(w).unwrap();
    });
    assert_eq!(datagram, &[0x81, 0x0B, 0x00, 0x08, 0x01, 0x00, 0x10, 0x08]);
}

#[test]
fn read_property_frame_matches_fixture() {
    let datagram = frame(BvlcFunction::OriginalUnicastNpdu, |w| {
        Npdu::reply().encode(w).unwrap();
        ReadPropertyRequest {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            property_id: PropertyId::PresentValue,
        }
        .encode(w, 1)
        .unwrap();
    });

    assert_eq!(
        datagram,
        &[
            0x81, 0x0A, 0x00, 0x10, // BVLC, 16 bytes inclusive
            0x01, 0x00, // NPDU
            0x00, 0x04, 0x01, 0x0C, // confirmed request, invoke 1
            0x00, 0x40, 0x00, 0x01, // analog-input 1
            0x00, 0x04, // present-value
        ]
    );
}

#[test]
fn subscribe_cov_frame_matches_fixture() {
    let datagram = frame(BvlcFunction::OriginalUnicastNpdu, |w| {
        Npdu::reply().encode(w).unwrap();
        SubscribeCovRequest {
            object_id: ObjectId::new(ObjectType::AnalogInput, 1),
            all_properties: true,
            lifetime_seconds: 60,
            confirmed: false,
        }
        .encode(w, 17)
        .unwrap();
    });

    assert_eq!(
        datagram,
        &[
            0x81, 0x0A, 0x00, 0x14, // BVLC, 20 bytes
            0x01, 0x00, // NPDU
            0x00, 0x04, 0x11, 0x0E, // confirmed request, invoke 17, SubscribeCOV
            0x00, 0x40, 0x00, 0x01, // analog-input 1
            0x01, // all properties
            0x00, 0x00, 0x00, 0x3C, // lifetime 60
            0x00, // unconfirmed notifications
        ]
    );
}

#[test]
fn i_am_reply_decodes_to_device_identity() {
    let iam = IAm::announce(ObjectId::new(ObjectType::Device, 1001), 0);
    let mut buf = [0u8; 32];
    let mut w = Writer::new(&mut buf);
    iam.encode_frame(&mut w).unwrap();

    let decoded = IAm::decode_frame(w.as_written()).unwrap();
    assert_eq!(decoded.device_id.object_type().to_u16(), 8);
    assert_eq!(decoded.device_id.instance(), 1001);
    assert_eq!(decoded.max_apdu, 1024);
    assert_eq!(decoded.segmentation, 0);
}

#[test]
fn error_reply_frame_matches_fixture() {
    let datagram = frame(BvlcFunction::OriginalUnicastNpdu, |w| {
        Npdu::reply().encode(w).unwrap();
        ServiceError::ObjectNotExist
            .to_pdu(0x2A, SERVICE_READ_PROPERTY)
            .encode(w)
            .unwrap();
    });

    assert_eq!(
        datagram,
        &[
            0x81, 0x0A, 0x00, 0x0C, // BVLC, 12 bytes
            0x01, 0x00, // NPDU
            0x50, 0x00, 0x2A, 0x0C, // Error PDU, invoke 0x2A
            0x02, 0x01, // object / object-not-exist
        ]
    );
}

#[test]
fn simple_ack_frame_matches_fixture() {
    let datagram = frame(BvlcFunction::OriginalUnicastNpdu, |w| {
        Npdu::reply().encode(w).unwrap();
        SimpleAck {
            invoke_id: 9,
            service_choice: SERVICE_WRITE_PROPERTY,
        }
        .encode(w)
        .unwrap();
    });

    assert_eq!(
        datagram,
        &[0x81, 0x0A, 0x00, 0x0A, 0x01, 0x00, 0x20, 0x00, 0x09, 0x0D]
    );
}

#[test]
fn declared_length_shorter_than_datagram_is_rejected() {
    let datagram = [0x81, 0x0A, 0x00, 0x06, 0x01, 0x00, 0x10, 0x08];
    assert_eq!(
        bvlc::split_frame(&datagram).unwrap_err(),
        DecodeError::LengthMismatch
    );
}

#[test]
fn confirmed_request_header_minimum_size() {
    // Shortest well-formed confirmed request: header only, empty payload.
    let mut r = Reader::new(&[0x00, 0x04, 0x07, 0x0F]);
    let header = ConfirmedRequestHeader::decode(&mut r).unwrap();
    assert_eq!(header.invoke_id, 7);
    assert!(r.is_empty());
}

#[test]
fn error_pdu_roundtrip() {
    let pdu = ServiceError::CovObject.to_pdu(3, 0x25);
    let mut buf = [0u8; 8];
    let mut w = Writer::new(&mut buf);
    pdu.encode(&mut w).unwrap();
    let mut r = Reader::new(w.as_written());
    assert_eq!(ErrorPdu::decode(&mut r).unwrap(), pdu);
}
