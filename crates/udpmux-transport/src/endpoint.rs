use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// UDP datagram endpoint.
///
/// Thin wrapper over `std::net::UdpSocket` exposing exactly what the router
/// needs: bind-to-port, timed receive returning the sender, and send-to.
/// Socket-option tuning beyond the read timeout is deliberately left out.
pub struct UdpEndpoint {
    socket: UdpSocket,
    local: SocketAddr,
}

impl UdpEndpoint {
    /// Bind a receive socket on `0.0.0.0:port`.
    ///
    /// Port 0 requests an OS-assigned port; [`local_port`](Self::local_port)
    /// reports the port actually bound.
    pub fn bind(port: u16) -> Result<Self> {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        let socket = UdpSocket::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        let local = socket.local_addr().map_err(|e| TransportError::Bind { addr, source: e })?;
        info!(%local, "bound udp endpoint");
        Ok(Self { socket, local })
    }

    /// Create an unbound (ephemeral-port) send socket.
    pub fn unbound() -> Result<Self> {
        Self::bind(0)
    }

    /// Apply a receive timeout so [`recv_from_timeout`](Self::recv_from_timeout)
    /// returns periodically even with no traffic.
    pub fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
        self.socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    /// Receive one datagram.
    ///
    /// Returns `Ok(None)` when the read timeout elapses with no traffic;
    /// every other failure is an error. On success returns the number of
    /// bytes received and the sender's address.
    pub fn recv_from_timeout(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => {
                debug!(%from, len, "received datagram");
                Ok(Some((len, from)))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Send one datagram to `addr`.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket
            .send_to(buf, addr)
            .map_err(|e| TransportError::Send { addr, source: e })?;
        debug!(%addr, len = buf.len(), "sent datagram");
        Ok(())
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// The locally bound port.
    pub fn local_port(&self) -> u16 {
        self.local.port()
    }
}

impl std::fmt::Debug for UdpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpEndpoint")
            .field("local", &self.local)
            .finish()
    }
}
