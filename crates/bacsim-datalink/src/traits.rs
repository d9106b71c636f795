use crate::TransportAddress;
use thiserror::Error;

/// Errors surfaced by a datagram transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("datagram too large")]
    FrameTooLarge,
    #[error("transport closed")]
    Closed,
}

/// Async capability for exchanging raw datagrams.
///
/// Implementations carry whole BVLC datagrams; framing and everything above
/// it belongs to the protocol core.
pub trait Transport: Send + Sync {
    /// Sends `payload` to `address`.
    async fn send(&self, address: TransportAddress, payload: &[u8])
        -> Result<(), TransportError>;

    /// Receives one datagram into `buf`, returning `(bytes_read, source)`.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, TransportAddress), TransportError>;

    /// Marks the transport closed; subsequent `recv` calls fail with
    /// [`TransportError::Closed`].
    fn close(&self);
}
