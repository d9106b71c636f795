use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bacsim_core::bvlc::{self, BvlcFunction};
use bacsim_core::encoding::Writer;
use bacsim_core::npdu::Npdu;
use bacsim_core::services::i_am::IAm;
use bacsim_core::services::who_is::WhoIsRequest;
use bacsim_datalink::{Transport, TransportAddress, UdpTransport};
use clap::Parser;
use tokio::time::{timeout, Instant};

#[derive(Parser, Debug)]
#[command(name = "bacsim-whois")]
struct Args {
    /// Seconds to wait for I-Am replies.
    #[arg(long, default_value_t = 3)]
    timeout_secs: u64,
    /// Probe a specific server instead of the local broadcast.
    #[arg(long)]
    target: Option<SocketAddr>,
    /// Low bound of the optional instance range carried in the request.
    #[arg(long)]
    low: Option<u32>,
    /// High bound of the optional instance range carried in the request.
    #[arg(long)]
    high: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let request = match (args.low, args.high) {
        (Some(low), Some(high)) => WhoIsRequest::limited(low, high),
        _ => WhoIsRequest::global(),
    };

    let transport =
        UdpTransport::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)).await?;

    let (function, target) = match args.target {
        Some(addr) => (BvlcFunction::OriginalUnicastNpdu, TransportAddress::Ip(addr)),
        None => (
            BvlcFunction::OriginalBroadcastNpdu,
            TransportAddress::local_broadcast(TransportAddress::BACNET_IP_DEFAULT_PORT),
        ),
    };

    let mut buf = [0u8; 64];
    let mut w = Writer::new(&mut buf);
    Npdu::reply().encode(&mut w)?;
    request.encode(&mut w)?;
    let frame = bvlc::wrap_frame(function, w.as_written())?;
    transport.send(target, &frame).await?;

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    let mut rx = [0u8; 1500];
    let mut count = 0usize;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let Ok(received) = timeout(remaining, transport.recv(&mut rx)).await else {
            break;
        };
        let (n, source) = received?;
        match IAm::decode_frame(&rx[..n]) {
            Ok(iam) => {
                count += 1;
                println!(
                    "{source}: device {} (max-apdu {}, segmentation {}, vendor {})",
                    iam.device_id.instance(),
                    iam.max_apdu,
                    iam.segmentation,
                    iam.vendor_id
                );
            }
            Err(e) => log::debug!("ignoring {n}-byte datagram from {source}: {e}"),
        }
    }

    println!("{count} device(s) answered");
    Ok(())
}
