//! Service dispatcher: BVLC → NPDU → APDU ascent and per-service routing.
//!
//! [`handle_datagram`] parses one received datagram and produces at most one
//! reply plus any COV notification datagrams triggered by writes. Framing
//! errors bubble out as [`DecodeError`] so the caller can log and drop the
//! datagram; service-level failures are answered with an Error PDU carrying
//! the request's invoke id.

use bacsim_core::apdu::{
    AbortPdu, ApduType, ComplexAckHeader, ConfirmedRequestHeader, ErrorPdu, RejectPdu, SegmentAck,
    SimpleAck, UnconfirmedRequestHeader,
};
use bacsim_core::bvlc::{self, BvlcFunction};
use bacsim_core::encoding::{Reader, Writer};
use bacsim_core::npdu::Npdu;
use bacsim_core::services::acknowledge_alarm::{AcknowledgeAlarmRequest, SERVICE_ACKNOWLEDGE_ALARM};
use bacsim_core::services::atomic_read_file::{
    AtomicReadFileAck, AtomicReadFileRequest, SERVICE_ATOMIC_READ_FILE,
};
use bacsim_core::services::atomic_write_file::{AtomicWriteFileRequest, SERVICE_ATOMIC_WRITE_FILE};
use bacsim_core::services::delete_file::{DeleteFileRequest, SERVICE_DELETE_FILE};
use bacsim_core::services::errors::ServiceError;
use bacsim_core::services::i_am::IAm;
use bacsim_core::services::read_property::{
    ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY,
};
use bacsim_core::services::read_property_multiple::{
    ObjectResult, PropertyResult, ReadPropertyMultipleAck, ReadPropertyMultipleRequest,
    SERVICE_READ_PROPERTY_MULTIPLE,
};
use bacsim_core::services::subscribe_cov::{
    CancelCovRequest, SubscribeCovRequest, SubscriptionAck, SERVICE_CANCEL_COV_SUBSCRIPTION,
    SERVICE_SUBSCRIBE_COV,
};
use bacsim_core::services::subscribe_cov_property::{
    SubscribeCovPropertyRequest, SERVICE_SUBSCRIBE_COV_PROPERTY,
};
use bacsim_core::services::who_is::{WhoIsRequest, SERVICE_WHO_IS};
use bacsim_core::services::write_property::{WritePropertyRequest, SERVICE_WRITE_PROPERTY};
use bacsim_core::services::write_property_multiple::{
    WriteFailure, WritePropertyMultipleAck, WritePropertyMultipleRequest,
    SERVICE_WRITE_PROPERTY_MULTIPLE,
};
use bacsim_core::types::{ObjectId, PropertyId};
use bacsim_core::{DecodeError, EncodeError};
use bacsim_datalink::TransportAddress;

use crate::clock;
use crate::cov::{next_subscription_id, CovEngine, CovSubscription, OutboundDatagram};
use crate::device::{Device, VENDOR_ID};
use crate::object::{Alarmable, BacnetObject, PropertyChange};
use crate::value::PropertyValue;

const REPLY_BUF_LEN: usize = 1480;

/// Result of processing one datagram.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Reply datagram for the request's source, BVLC header included.
    pub reply: Option<Vec<u8>>,
    /// COV notifications owed to subscribers, sent after the reply.
    pub notifications: Vec<OutboundDatagram>,
}

impl DispatchOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn reply(frame: Option<Vec<u8>>) -> Self {
        Self {
            reply: frame,
            notifications: Vec::new(),
        }
    }
}

/// Processes one received datagram.
pub fn handle_datagram(
    device: &mut Device,
    engine: &CovEngine,
    datagram: &[u8],
    source: TransportAddress,
) -> Result<DispatchOutcome, DecodeError> {
    let (function, body) = bvlc::split_frame(datagram)?;
    match function {
        BvlcFunction::OriginalUnicastNpdu | BvlcFunction::OriginalBroadcastNpdu => {}
        BvlcFunction::Unknown(v) => {
            log::debug!("ignoring unsupported BVLC function 0x{v:02x} from {source}");
            return Ok(DispatchOutcome::none());
        }
    }

    let mut r = Reader::new(body);
    let npdu = Npdu::decode(&mut r)?;
    if npdu.network_message {
        log::debug!("ignoring network-layer message from {source}");
        return Ok(DispatchOutcome::none());
    }

    let first = r.peek_u8()?;
    match ApduType::from_u8(first >> 4) {
        Some(ApduType::UnconfirmedRequest) => handle_unconfirmed(device, &mut r, source),
        Some(ApduType::ConfirmedRequest) => handle_confirmed(device, engine, &mut r, source),
        Some(ApduType::SimpleAck) => {
            let ack = SimpleAck::decode(&mut r)?;
            log::debug!(
                "simple ack from {source}: invoke {} service 0x{:02x}",
                ack.invoke_id,
                ack.service_choice
            );
            Ok(DispatchOutcome::none())
        }
        Some(ApduType::ComplexAck) => {
            let header = ComplexAckHeader::decode(&mut r)?;
            log::debug!(
                "complex ack from {source}: invoke {} service 0x{:02x} segmented {} payload {} bytes",
                header.invoke_id,
                header.service_choice,
                header.segmented,
                r.remaining()
            );
            Ok(DispatchOutcome::none())
        }
        Some(ApduType::SegmentAck) => {
            let ack = SegmentAck::decode(&mut r)?;
            log::debug!(
                "segment ack from {source}: seq {} window {} negative {} server {}",
                ack.sequence_number,
                ack.window_size,
                ack.negative_ack,
                ack.sent_by_server
            );
            Ok(DispatchOutcome::none())
        }
        Some(ApduType::Error) => {
            let pdu = ErrorPdu::decode(&mut r)?;
            log::debug!(
                "error pdu from {source}: invoke {} service 0x{:02x} class 0x{:02x} code 0x{:02x}",
                pdu.invoke_id,
                pdu.service_choice,
                pdu.error_class,
                pdu.error_code
            );
            Ok(DispatchOutcome::none())
        }
        Some(ApduType::Reject) => {
            let pdu = RejectPdu::decode(&mut r)?;
            log::debug!(
                "reject pdu from {source}: invoke {} reason {}",
                pdu.invoke_id,
                pdu.reason
            );
            Ok(DispatchOutcome::none())
        }
        Some(ApduType::Abort) => {
            let pdu = AbortPdu::decode(&mut r)?;
            log::debug!(
                "abort pdu from {source}: invoke {} reason {} server {}",
                pdu.invoke_id,
                pdu.reason,
                pdu.server
            );
            Ok(DispatchOutcome::none())
        }
        None => Err(DecodeError::InvalidValue),
    }
}

fn handle_unconfirmed(
    device: &Device,
    r: &mut Reader<'_>,
    source: TransportAddress,
) -> Result<DispatchOutcome, DecodeError> {
    let header = UnconfirmedRequestHeader::decode(r)?;
    match header.service_choice {
        SERVICE_WHO_IS => {
            // The optional instance range is decoded for validity but the
            // device always announces itself.
            let _request = WhoIsRequest::decode_payload(r)?;
            log::debug!("who-is from {source}, announcing device {}", device.instance());
            let iam = IAm::announce(device.object_id(), VENDOR_ID);
            let mut buf = [0u8; 32];
            let mut w = Writer::new(&mut buf);
            match iam.encode_frame(&mut w) {
                Ok(()) => Ok(DispatchOutcome::reply(Some(w.as_written().to_vec()))),
                Err(e) => {
                    log::warn!("failed to encode i-am: {e}");
                    Ok(DispatchOutcome::none())
                }
            }
        }
        other => {
            log::debug!("ignoring unconfirmed service 0x{other:02x} from {source}");
            Ok(DispatchOutcome::none())
        }
    }
}

fn handle_confirmed(
    device: &mut Device,
    engine: &CovEngine,
    r: &mut Reader<'_>,
    source: TransportAddress,
) -> Result<DispatchOutcome, DecodeError> {
    let header = ConfirmedRequestHeader::decode(r)?;
    if header.segmented {
        log::warn!(
            "segmented request from {source} (invoke {}) not supported, dropping",
            header.invoke_id
        );
        return Ok(DispatchOutcome::none());
    }

    let invoke_id = header.invoke_id;
    let outcome = match header.service_choice {
        SERVICE_READ_PROPERTY => read_property(device, r, invoke_id),
        SERVICE_WRITE_PROPERTY => write_property(device, engine, r, invoke_id),
        SERVICE_READ_PROPERTY_MULTIPLE => read_property_multiple(device, r, invoke_id),
        SERVICE_WRITE_PROPERTY_MULTIPLE => write_property_multiple(device, engine, r, invoke_id),
        SERVICE_ACKNOWLEDGE_ALARM => acknowledge_alarm(device, r, invoke_id),
        SERVICE_ATOMIC_READ_FILE => atomic_read_file(device, r, invoke_id),
        SERVICE_ATOMIC_WRITE_FILE => atomic_write_file(device, engine, r, invoke_id),
        SERVICE_DELETE_FILE => delete_file(device, engine, r, invoke_id),
        SERVICE_SUBSCRIBE_COV => subscribe_cov(device, r, invoke_id, source),
        SERVICE_SUBSCRIBE_COV_PROPERTY => subscribe_cov_property(device, r, invoke_id, source),
        SERVICE_CANCEL_COV_SUBSCRIPTION => cancel_cov(device, r, invoke_id),
        other => {
            log::debug!("unsupported confirmed service 0x{other:02x} from {source}");
            DispatchOutcome::none()
        }
    };
    Ok(outcome)
}

fn encode_reply(
    build: impl FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>,
) -> Option<Vec<u8>> {
    let mut buf = [0u8; REPLY_BUF_LEN];
    let mut w = Writer::new(&mut buf);
    let body = Npdu::reply()
        .encode(&mut w)
        .and_then(|()| build(&mut w))
        .map(|()| w.as_written());
    match body.and_then(|body| bvlc::wrap_frame(BvlcFunction::OriginalUnicastNpdu, body)) {
        Ok(frame) => Some(frame),
        Err(e) => {
            log::warn!("failed to encode reply: {e}");
            None
        }
    }
}

fn error_reply(invoke_id: u8, service_choice: u8, error: ServiceError) -> DispatchOutcome {
    DispatchOutcome::reply(encode_reply(|w| {
        error.to_pdu(invoke_id, service_choice).encode(w)
    }))
}

fn simple_ack(invoke_id: u8, service_choice: u8) -> Option<Vec<u8>> {
    encode_reply(|w| {
        SimpleAck {
            invoke_id,
            service_choice,
        }
        .encode(w)
    })
}

/// Fans a committed change out to the written object's subscriptions.
fn notify(
    device: &mut Device,
    engine: &CovEngine,
    object_id: ObjectId,
    change: &PropertyChange,
) -> Vec<OutboundDatagram> {
    let device_id = device.object_id();
    match device.object_core_mut(object_id) {
        Some(core) => engine.notifications_for(device_id, core, change),
        None => Vec::new(),
    }
}

fn read_property(device: &Device, r: &mut Reader<'_>, invoke_id: u8) -> DispatchOutcome {
    let request = match ReadPropertyRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_READ_PROPERTY,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    match device.read_property(request.object_id, request.property_id) {
        Ok(value) => DispatchOutcome::reply(encode_reply(|w| {
            ReadPropertyAck {
                value: value.as_value(),
            }
            .encode(w, invoke_id)
        })),
        Err(e) => error_reply(invoke_id, SERVICE_READ_PROPERTY, e),
    }
}

fn write_property(
    device: &mut Device,
    engine: &CovEngine,
    r: &mut Reader<'_>,
    invoke_id: u8,
) -> DispatchOutcome {
    let request = match WritePropertyRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_WRITE_PROPERTY,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    let value = PropertyValue::from(request.value);
    match device.write_property(request.object_id, request.property_id, value, request.priority) {
        Ok(change) => {
            let notifications = match change {
                Some(change) => notify(device, engine, request.object_id, &change),
                None => Vec::new(),
            };
            DispatchOutcome {
                reply: simple_ack(invoke_id, SERVICE_WRITE_PROPERTY),
                notifications,
            }
        }
        Err(e) => error_reply(invoke_id, SERVICE_WRITE_PROPERTY, e),
    }
}

enum OwnedPropertyResult {
    Value(PropertyValue),
    Error(u8, u8),
}

fn read_property_multiple(device: &Device, r: &mut Reader<'_>, invoke_id: u8) -> DispatchOutcome {
    let request = match ReadPropertyMultipleRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_READ_PROPERTY_MULTIPLE,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    // Reads land in owned storage first; the ack borrows from it while
    // encoding.
    let mut owned: Vec<(ObjectId, Option<Vec<(PropertyId, OwnedPropertyResult)>>)> = Vec::new();
    for spec in &request.specs {
        if !device.contains(spec.object_id) {
            owned.push((spec.object_id, None));
            continue;
        }
        let entries = spec
            .properties
            .iter()
            .map(|&property_id| {
                let entry = match device.read_property(spec.object_id, property_id) {
                    Ok(value) => OwnedPropertyResult::Value(value),
                    Err(e) => {
                        let (class, code) = e.class_code();
                        OwnedPropertyResult::Error(class, code)
                    }
                };
                (property_id, entry)
            })
            .collect();
        owned.push((spec.object_id, Some(entries)));
    }

    let (not_exist_class, not_exist_code) = ServiceError::ObjectNotExist.class_code();
    let ack = ReadPropertyMultipleAck {
        results: owned
            .iter()
            .map(|(object_id, entries)| {
                let result = match entries {
                    None => ObjectResult::Missing {
                        class: not_exist_class,
                        code: not_exist_code,
                    },
                    Some(entries) => ObjectResult::Properties(
                        entries
                            .iter()
                            .map(|(property_id, entry)| {
                                let entry = match entry {
                                    OwnedPropertyResult::Value(value) => {
                                        PropertyResult::Value(value.as_value())
                                    }
                                    OwnedPropertyResult::Error(class, code) => {
                                        PropertyResult::Error {
                                            class: *class,
                                            code: *code,
                                        }
                                    }
                                };
                                (*property_id, entry)
                            })
                            .collect(),
                    ),
                };
                (*object_id, result)
            })
            .collect(),
    };

    DispatchOutcome::reply(encode_reply(|w| ack.encode(w, invoke_id)))
}

fn write_property_multiple(
    device: &mut Device,
    engine: &CovEngine,
    r: &mut Reader<'_>,
    invoke_id: u8,
) -> DispatchOutcome {
    let request = match WritePropertyMultipleRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_WRITE_PROPERTY_MULTIPLE,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    let mut failures = Vec::new();
    let mut notifications = Vec::new();
    for spec in &request.specs {
        for entry in &spec.entries {
            let value = PropertyValue::from(entry.value);
            match device.write_property(spec.object_id, entry.property_id, value, entry.priority) {
                Ok(Some(change)) => {
                    notifications.extend(notify(device, engine, spec.object_id, &change));
                }
                Ok(None) => {}
                Err(e) => {
                    let (class, code) = e.class_code();
                    failures.push(WriteFailure {
                        object_id: spec.object_id,
                        property_id: entry.property_id,
                        class,
                        code,
                    });
                }
            }
        }
    }

    let reply = if failures.is_empty() {
        simple_ack(invoke_id, SERVICE_WRITE_PROPERTY_MULTIPLE)
    } else {
        encode_reply(|w| WritePropertyMultipleAck { failures }.encode(w, invoke_id))
    };
    DispatchOutcome {
        reply,
        notifications,
    }
}

fn acknowledge_alarm(device: &mut Device, r: &mut Reader<'_>, invoke_id: u8) -> DispatchOutcome {
    let request = match AcknowledgeAlarmRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_ACKNOWLEDGE_ALARM,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    match device.object_core_mut(request.object_id) {
        None => error_reply(invoke_id, SERVICE_ACKNOWLEDGE_ALARM, ServiceError::ObjectNotExist),
        Some(core) => {
            core.acknowledge();
            log::info!(
                "alarm acknowledged: object {} code 0x{:08x} type 0x{:08x} at {}",
                request.object_id,
                request.alarm_code,
                request.alarm_type,
                request.timestamp
            );
            DispatchOutcome::reply(simple_ack(invoke_id, SERVICE_ACKNOWLEDGE_ALARM))
        }
    }
}

fn atomic_read_file(device: &Device, r: &mut Reader<'_>, invoke_id: u8) -> DispatchOutcome {
    let request = match AtomicReadFileRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_ATOMIC_READ_FILE,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    match device.file(request.object_id) {
        Ok(file) => {
            let data = file.read_data(request.start, request.count);
            DispatchOutcome::reply(encode_reply(|w| {
                AtomicReadFileAck {
                    start: request.start,
                    data,
                }
                .encode(w, invoke_id)
            }))
        }
        Err(e) => error_reply(invoke_id, SERVICE_ATOMIC_READ_FILE, e),
    }
}

fn atomic_write_file(
    device: &mut Device,
    engine: &CovEngine,
    r: &mut Reader<'_>,
    invoke_id: u8,
) -> DispatchOutcome {
    let request = match AtomicWriteFileRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_ATOMIC_WRITE_FILE,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    let size_change = match device.file_mut(request.object_id) {
        Ok(file) => {
            let before = file.len();
            file.write_data(request.start, request.data);
            file_size_change(before, file.len())
        }
        Err(e) => return error_reply(invoke_id, SERVICE_ATOMIC_WRITE_FILE, e),
    };

    let notifications = match size_change {
        Some(change) => notify(device, engine, request.object_id, &change),
        None => Vec::new(),
    };
    DispatchOutcome {
        reply: simple_ack(invoke_id, SERVICE_ATOMIC_WRITE_FILE),
        notifications,
    }
}

fn delete_file(
    device: &mut Device,
    engine: &CovEngine,
    r: &mut Reader<'_>,
    invoke_id: u8,
) -> DispatchOutcome {
    let request = match DeleteFileRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_DELETE_FILE,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    let size_change = match device.file_mut(request.object_id) {
        Ok(file) => {
            let before = file.len();
            file.clear();
            file_size_change(before, 0)
        }
        Err(e) => return error_reply(invoke_id, SERVICE_DELETE_FILE, e),
    };

    let notifications = match size_change {
        Some(change) => notify(device, engine, request.object_id, &change),
        None => Vec::new(),
    };
    DispatchOutcome {
        reply: simple_ack(invoke_id, SERVICE_DELETE_FILE),
        notifications,
    }
}

/// File mutations surface as `FileSize` changes to COV subscribers.
fn file_size_change(before: usize, after: usize) -> Option<PropertyChange> {
    (before != after).then(|| PropertyChange {
        property_id: PropertyId::FileSize,
        value: PropertyValue::Unsigned32(after as u32),
        priority: crate::object::DEFAULT_PRIORITY,
    })
}

fn subscribe_cov(
    device: &mut Device,
    r: &mut Reader<'_>,
    invoke_id: u8,
    source: TransportAddress,
) -> DispatchOutcome {
    let request = match SubscribeCovRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_SUBSCRIBE_COV,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    register_subscription(
        device,
        invoke_id,
        SERVICE_SUBSCRIBE_COV,
        request.object_id,
        request.lifetime_seconds,
        request.confirmed,
        Vec::new(),
        source,
    )
}

fn subscribe_cov_property(
    device: &mut Device,
    r: &mut Reader<'_>,
    invoke_id: u8,
    source: TransportAddress,
) -> DispatchOutcome {
    let request = match SubscribeCovPropertyRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_SUBSCRIBE_COV_PROPERTY,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    // Every referenced property must exist on the target object.
    match device.object_core(request.object_id) {
        None => {
            return error_reply(
                invoke_id,
                SERVICE_SUBSCRIBE_COV_PROPERTY,
                ServiceError::ObjectNotExist,
            )
        }
        Some(core) => {
            for &property_id in &request.properties {
                if core.read_property(property_id).is_none() {
                    return error_reply(
                        invoke_id,
                        SERVICE_SUBSCRIBE_COV_PROPERTY,
                        ServiceError::CovProperty,
                    );
                }
            }
        }
    }

    register_subscription(
        device,
        invoke_id,
        SERVICE_SUBSCRIBE_COV_PROPERTY,
        request.object_id,
        request.lifetime_seconds,
        request.confirmed,
        request.properties,
        source,
    )
}

#[allow(clippy::too_many_arguments)]
fn register_subscription(
    device: &mut Device,
    invoke_id: u8,
    service_choice: u8,
    object_id: ObjectId,
    lifetime_seconds: u32,
    confirmed: bool,
    monitored_properties: Vec<PropertyId>,
    source: TransportAddress,
) -> DispatchOutcome {
    let device_instance = device.instance();
    let Some(core) = device.object_core_mut(object_id) else {
        return error_reply(invoke_id, service_choice, ServiceError::ObjectNotExist);
    };

    let subscription_id = next_subscription_id();
    core.add_subscription(CovSubscription {
        subscription_id,
        device_id: device_instance,
        object_id,
        lifetime_seconds,
        confirmed,
        monitored_properties,
        timestamp: clock::now(),
        client_address: source,
    });
    log::info!(
        "cov subscription {subscription_id} registered: object {object_id} lifetime {lifetime_seconds}s confirmed {confirmed} client {source}"
    );

    DispatchOutcome::reply(encode_reply(|w| {
        SubscriptionAck { subscription_id }.encode(w, invoke_id, service_choice)
    }))
}

fn cancel_cov(device: &mut Device, r: &mut Reader<'_>, invoke_id: u8) -> DispatchOutcome {
    let request = match CancelCovRequest::decode_payload(r) {
        Ok(request) => request,
        Err(_) => {
            return error_reply(
                invoke_id,
                SERVICE_CANCEL_COV_SUBSCRIPTION,
                ServiceError::ServiceValueOutOfRange,
            )
        }
    };

    if device.remove_subscription(request.subscription_id) {
        log::info!("cov subscription {} cancelled", request.subscription_id);
        DispatchOutcome::reply(simple_ack(invoke_id, SERVICE_CANCEL_COV_SUBSCRIPTION))
    } else {
        error_reply(
            invoke_id,
            SERVICE_CANCEL_COV_SUBSCRIPTION,
            ServiceError::CovObject,
        )
    }
}
