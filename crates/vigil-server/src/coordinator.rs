//! Discovery Cycle Driver
//!
//! Runs the coordinator's periodic cycle: announce a probe to the multicast
//! group, collect replies for half the liveness timeout, reap stale agents,
//! pull metadata from the live ones, and report the table.

use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, trace, warn};
use vigil_core::{Message, ProtocolConfig, Transport, TransportError};

use crate::events;
use crate::report::{self, ReportFormat};
use crate::table::LivenessTable;

pub struct Coordinator<T: Transport> {
    transport: T,
    config: ProtocolConfig,
    report_format: ReportFormat,
    table: LivenessTable,
    /// Time of the most recent DISCOVER broadcast.
    last_discover: Option<DateTime<Utc>>,
    /// Channel for receiving the shutdown signal (None after extracted in run())
    shutdown_rx: Option<mpsc::UnboundedReceiver<()>>,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(
        transport: T,
        config: ProtocolConfig,
        report_format: ReportFormat,
        shutdown_rx: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            transport,
            config,
            report_format,
            table: LivenessTable::new(),
            last_discover: None,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// Run discovery cycles until a shutdown signal arrives.
    ///
    /// The shutdown arm races both the sleep and the in-flight cycle, so a
    /// pending blocking receive is interrupted rather than drained.
    pub async fn run(mut self) -> Result<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| anyhow!("Shutdown receiver already consumed"))?;

        let mut interval = tokio::time::interval(self.config.period());

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Coordinator: received shutdown signal");
                    return Ok(());
                }
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Coordinator: received shutdown signal mid-cycle");
                    return Ok(());
                }
                _ = self.run_cycle() => {}
            }
        }
    }

    /// One full cycle: announce, collect, reap, re-query, report.
    ///
    /// Nothing in a cycle is fatal. A failed probe send leaves the table
    /// stale and the remaining steps still run; the next period is the
    /// retry mechanism for every lost message.
    pub async fn run_cycle(&mut self) {
        self.announce(Utc::now()).await;
        self.collect().await;

        let now = Utc::now();
        for addr in self.table.reap(now, self.config.timeout) {
            let last_seen = self
                .table
                .get(&addr)
                .map(|record| record.last_seen)
                .unwrap_or(now);
            events::agent_dead(addr, last_seen);
        }

        self.request_sysinfo().await;
        self.report();
    }

    /// Broadcast a DISCOVER probe carrying the current time as its token.
    async fn announce(&mut self, now: DateTime<Utc>) {
        let token = now.timestamp_millis().to_string();
        let probe = Message::Discover {
            token: token.clone(),
        };
        let group = self.config.group_addr();

        match self.transport.send(&probe.encode(), group).await {
            Ok(()) => {
                self.last_discover = Some(now);
                events::probe_sent(group, &token);
            }
            Err(e) => warn!(error = %e, "Failed to send discovery probe"),
        }
    }

    /// Receive replies until half the liveness timeout has elapsed.
    ///
    /// A deadline expiry ends the window normally; any other transport
    /// failure is logged and ends it early. Either way the cycle goes on.
    async fn collect(&mut self) {
        let deadline = Instant::now() + self.config.collect_window();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match self.transport.recv(Some(remaining)).await {
                Ok((raw, src)) => self.dispatch(&raw, src, Utc::now()),
                Err(TransportError::Timeout) => break,
                Err(e) => {
                    warn!(error = %e, "Receive failed, ending collect window");
                    break;
                }
            }
        }
    }

    /// Decode one datagram and apply it to the table.
    fn dispatch(&mut self, raw: &[u8], src: SocketAddr, now: DateTime<Utc>) {
        let message = match Message::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                trace!(src = %src, error = %e, "Dropping undecodable datagram");
                return;
            }
        };

        let kind = message.kind();
        match message {
            // The echoed token is not validated against the last probe; any
            // RESPONSE refreshes liveness.
            Message::Response { token: _ } => {
                if self.table.record_response(src, now) {
                    events::agent_discovered(src);
                }
            }
            Message::Sysinfo { text } => {
                if !self.table.record_sysinfo(src, text) {
                    trace!(src = %src, "SYSINFO from unknown address, dropped");
                }
            }
            Message::Discover { .. } | Message::SysinfoRequest => {
                trace!(src = %src, kind = kind, "Ignoring message not addressed to this role");
            }
        }
    }

    /// Pull metadata from every agent still alive after the reap.
    ///
    /// Per-agent send failures are independent: one unreachable agent must
    /// not block requests to the others.
    async fn request_sysinfo(&mut self) {
        let payload = Message::SysinfoRequest.encode();
        for addr in self.table.alive_agents() {
            if let Err(e) = self.transport.send(&payload, addr).await {
                warn!(agent = %addr, error = %e, "Failed to send metadata request");
            }
        }
    }

    /// Print the rendered table and emit the cycle summary event.
    fn report(&self) {
        let snapshot = self.table.snapshot();
        let alive = snapshot.iter().filter(|record| record.alive).count();
        println!("{}", report::render(&snapshot, self.report_format));
        events::cycle_completed(snapshot.len(), alive);
    }

    /// Time of the most recent successful DISCOVER broadcast.
    pub fn last_discover(&self) -> Option<DateTime<Utc>> {
        self.last_discover
    }
}
