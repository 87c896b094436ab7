//! Agent Receive Loop
//!
//! Blocks on the multicast socket and feeds every datagram through the
//! responder until a shutdown signal arrives.

use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};
use vigil_core::{Message, Transport};

use crate::responder::Responder;

pub struct Listener<T: Transport> {
    transport: T,
    responder: Responder,
    /// Channel for receiving the shutdown signal (None after extracted in run())
    shutdown_rx: Option<mpsc::UnboundedReceiver<()>>,
}

impl<T: Transport> Listener<T> {
    pub fn new(
        transport: T,
        responder: Responder,
        shutdown_rx: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            transport,
            responder,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// Receive and answer datagrams until shutdown.
    ///
    /// Receive and send failures are transient OS-level hiccups: both are
    /// logged and the loop keeps listening, with no backoff.
    pub async fn run(mut self) -> Result<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| anyhow!("Shutdown receiver already consumed"))?;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Agent: received shutdown signal");
                    return Ok(());
                }
                received = self.transport.recv(None) => {
                    match received {
                        Ok((raw, src)) => self.answer(&raw, src).await,
                        Err(e) => warn!(error = %e, "Receive failed"),
                    }
                }
            }
        }
    }

    async fn answer(&mut self, raw: &[u8], src: SocketAddr) {
        let message = match Message::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                trace!(src = %src, error = %e, "Dropping undecodable datagram");
                return;
            }
        };

        if let Some((reply, dest)) = self.responder.handle(message, src) {
            if let Err(e) = self.transport.send(&reply.encode(), dest).await {
                warn!(dest = %dest, error = %e, "Failed to send reply");
            }
        }
    }
}
