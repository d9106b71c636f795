use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bacsim_core::apdu::{ApduType, ComplexAckHeader, ErrorPdu};
use bacsim_core::bvlc::{self, BvlcFunction};
use bacsim_core::encoding::{Reader, Writer};
use bacsim_core::npdu::Npdu;
use bacsim_core::services::read_property::ReadPropertyRequest;
use bacsim_core::types::{ObjectId, ObjectType, PropertyId};
use bacsim_datalink::{Transport, TransportAddress, UdpTransport};
use clap::Parser;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[command(name = "bacsim-readprop")]
struct Args {
    /// Server address, e.g. 192.168.1.10:47808.
    #[arg(long)]
    target: SocketAddr,
    /// Numeric object type (1 = analog-input, 8 = device, 13 = file, ...).
    #[arg(long)]
    object_type: u16,
    /// Object instance number.
    #[arg(long)]
    instance: u32,
    /// Numeric property identifier (4 = present-value, 3 = object-name, ...).
    #[arg(long, default_value_t = 4)]
    property: u16,
    /// Seconds to wait for the reply.
    #[arg(long, default_value_t = 3)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let object_id = ObjectId::new(ObjectType::from_u16(args.object_type), args.instance);
    let property_id = PropertyId::from_u16(args.property);

    let transport =
        UdpTransport::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)).await?;

    let mut buf = [0u8; 64];
    let mut w = Writer::new(&mut buf);
    Npdu::reply().encode(&mut w)?;
    ReadPropertyRequest {
        object_id,
        property_id,
    }
    .encode(&mut w, 1)?;
    let frame = bvlc::wrap_frame(BvlcFunction::OriginalUnicastNpdu, w.as_written())?;
    transport.send(TransportAddress::Ip(args.target), &frame).await?;

    let mut rx = [0u8; 1500];
    let (n, _) = timeout(
        Duration::from_secs(args.timeout_secs),
        transport.recv(&mut rx),
    )
    .await??;

    let (_, body) = bvlc::split_frame(&rx[..n])?;
    let mut r = Reader::new(body);
    Npdu::decode(&mut r)?;

    match ApduType::from_u8(r.peek_u8()? >> 4) {
        Some(ApduType::ComplexAck) => {
            ComplexAckHeader::decode(&mut r)?;
            let ack =
                bacsim_core::services::read_property::ReadPropertyAck::decode_payload(&mut r)?;
            println!("{object_id} {property_id:?} = {:?}", ack.value);
        }
        Some(ApduType::Error) => {
            let pdu = ErrorPdu::decode(&mut r)?;
            println!(
                "error: class 0x{:02x} code 0x{:02x}",
                pdu.error_class, pdu.error_code
            );
        }
        other => println!("unexpected reply: {other:?}"),
    }
    Ok(())
}
