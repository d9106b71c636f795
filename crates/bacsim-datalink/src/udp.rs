use crate::{Transport, TransportAddress, TransportError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Largest datagram the transport will accept or emit.
pub const MAX_DATAGRAM_LEN: usize = 1500;

/// BACnet/IP transport over a UDP socket with broadcast enabled.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    closed: Arc<AtomicBool>,
}

impl UdpTransport {
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.set_broadcast(true)?;
        log::info!("udp transport bound to {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for UdpTransport {
    async fn send(
        &self,
        address: TransportAddress,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if payload.len() > MAX_DATAGRAM_LEN {
            return Err(TransportError::FrameTooLarge);
        }
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.socket
            .send_to(payload, address.as_socket_addr())
            .await?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, TransportAddress), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let (n, src) = self.socket.recv_from(buf).await?;
        Ok((n, TransportAddress::Ip(src)))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::UdpTransport;
    use crate::{Transport, TransportAddress, TransportError};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn datagram_roundtrip() {
        let a = UdpTransport::bind(loopback()).await.unwrap();
        let b = UdpTransport::bind(loopback()).await.unwrap();
        let b_addr = TransportAddress::Ip(b.local_addr().unwrap());

        a.send(b_addr, &[0x81, 0x0A, 0x00, 0x04]).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, src) = b.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x81, 0x0A, 0x00, 0x04]);
        assert_eq!(src, TransportAddress::Ip(a.local_addr().unwrap()));
    }

    #[tokio::test]
    async fn closed_transport_refuses_io() {
        let t = UdpTransport::bind(loopback()).await.unwrap();
        t.close();

        let mut buf = [0u8; 16];
        assert!(matches!(
            t.recv(&mut buf).await.unwrap_err(),
            TransportError::Closed
        ));
        assert!(matches!(
            t.send(TransportAddress::Ip(t.local_addr().unwrap()), &[0])
                .await
                .unwrap_err(),
            TransportError::Closed
        ));
    }

    #[tokio::test]
    async fn oversized_send_is_rejected() {
        let t = UdpTransport::bind(loopback()).await.unwrap();
        let payload = vec![0u8; super::MAX_DATAGRAM_LEN + 1];
        assert!(matches!(
            t.send(TransportAddress::Ip(t.local_addr().unwrap()), &payload)
                .await
                .unwrap_err(),
            TransportError::FrameTooLarge
        ));
    }
}
