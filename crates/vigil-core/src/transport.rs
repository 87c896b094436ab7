//! Datagram Transport
//!
//! Thin seam over UDP so the protocol engines can be driven by a scripted
//! transport in tests. The coordinator binds a plain socket and only ever
//! receives unicast replies; agents additionally join the multicast group
//! to hear discovery probes.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::protocol::MAX_DATAGRAM;

/// Transport failure taxonomy.
///
/// Only `Bind` and `Join` are fatal, and only at startup; everything else
/// is logged by the caller and the loop continues. `Timeout` is not a
/// failure at all: it is the expected end of a bounded collect window.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("receive deadline elapsed")]
    Timeout,
    #[error("failed to bind udp socket on port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("failed to join multicast group {group}: {source}")]
    Join { group: Ipv4Addr, source: io::Error },
    #[error("send to {dest} failed: {source}")]
    Send { dest: SocketAddr, source: io::Error },
    #[error("receive failed: {0}")]
    Recv(#[source] io::Error),
}

/// Best-effort datagram send and receive.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one datagram. Callers log failures and continue.
    async fn send(&self, payload: &[u8], dest: SocketAddr) -> Result<(), TransportError>;

    /// Receive one datagram, waiting at most `deadline` when one is given.
    async fn recv(
        &self,
        deadline: Option<Duration>,
    ) -> Result<(Vec<u8>, SocketAddr), TransportError>;
}

/// UDP implementation used by both binaries.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind for unicast traffic only. Coordinator side: probes go out to
    /// the group, replies come back unicast to this socket.
    pub async fn bind(port: u16) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map_err(|source| TransportError::Bind { port, source })?;
        Ok(Self { socket })
    }

    /// Bind and join the multicast group. Agent side: discovery probes
    /// arrive on the group address. A failed join is the one unrecoverable
    /// startup condition in the system.
    pub async fn join_group(group: Ipv4Addr, port: u16) -> Result<Self, TransportError> {
        let transport = Self::bind(port).await?;
        transport
            .socket
            .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
            .map_err(|source| TransportError::Join { group, source })?;
        Ok(transport)
    }

    /// Local address the socket ended up bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, payload: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.socket
            .send_to(payload, dest)
            .await
            .map_err(|source| TransportError::Send { dest, source })?;
        trace!(dest = %dest, bytes = payload.len(), "Datagram sent");
        Ok(())
    }

    async fn recv(
        &self,
        deadline: Option<Duration>,
    ) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, src) = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.socket.recv_from(&mut buf))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(TransportError::Recv)?,
            None => self
                .socket
                .recv_from(&mut buf)
                .await
                .map_err(TransportError::Recv)?,
        };
        buf.truncate(len);
        trace!(src = %src, bytes = len, "Datagram received");
        Ok((buf, src))
    }
}
