//! Structured Events
//!
//! One function per domain event with consistent field naming, so log
//! pipelines can filter on `event_type`.
//!
//! Event types:
//! - `agent_discovered` - first RESPONSE from a previously unknown address
//! - `agent_dead` - an alive agent crossed the liveness timeout
//! - `probe_sent` - a DISCOVER probe went out to the group
//! - `cycle_completed` - one full discovery cycle finished
//!
//! An agent returning from the dead deliberately has no event of its own;
//! only the death transition is announced.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Emit an agent discovered event
pub fn agent_discovered(addr: SocketAddr) {
    info!(
        event_type = "agent_discovered",
        agent = %addr,
        "New agent detected"
    );
}

/// Emit an agent dead event
pub fn agent_dead(addr: SocketAddr, last_seen: DateTime<Utc>) {
    warn!(
        event_type = "agent_dead",
        agent = %addr,
        last_seen = %last_seen.format("%Y-%m-%d %H:%M:%S"),
        "Agent marked as dead"
    );
}

/// Emit a probe sent event
pub fn probe_sent(group: SocketAddr, token: &str) {
    debug!(
        event_type = "probe_sent",
        group = %group,
        token = %token,
        "Sent multicast discovery probe"
    );
}

/// Emit a cycle completed event
pub fn cycle_completed(total: usize, alive: usize) {
    debug!(
        event_type = "cycle_completed",
        agents_total = total,
        agents_alive = alive,
        "Discovery cycle completed"
    );
}
