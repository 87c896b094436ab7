//! Agent Liveness Table
//!
//! Tracks every agent the coordinator has ever heard from and its current
//! liveness state. Owned by the coordinator's single loop; no lock is
//! needed because nothing else touches it.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// One record per distinct agent address.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub addr: SocketAddr,
    /// Time of the most recent RESPONSE from this address.
    pub last_seen: DateTime<Utc>,
    /// Free-form descriptive metadata. Empty until the first SYSINFO reply
    /// arrives, then overwritten wholesale on every new reply.
    pub sysinfo: String,
    pub alive: bool,
}

/// The coordinator's map from agent address to observed state.
///
/// Records are never deleted: a dead agent stays visible in status reports
/// until the process exits. The map is ordered so reports render in a
/// stable address order.
#[derive(Debug, Default)]
pub struct LivenessTable {
    agents: BTreeMap<SocketAddr, AgentRecord>,
}

impl LivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a RESPONSE from `addr`.
    ///
    /// Returns true when the address was previously unknown. A known
    /// address is refreshed regardless of its current state, which is also
    /// how a dead agent silently returns to life.
    pub fn record_response(&mut self, addr: SocketAddr, now: DateTime<Utc>) -> bool {
        match self.agents.get_mut(&addr) {
            Some(record) => {
                record.last_seen = now;
                record.alive = true;
                trace!(agent = %addr, "Liveness refreshed");
                false
            }
            None => {
                self.agents.insert(
                    addr,
                    AgentRecord {
                        addr,
                        last_seen: now,
                        sysinfo: String::new(),
                        alive: true,
                    },
                );
                true
            }
        }
    }

    /// Attach SYSINFO metadata to an already-known agent.
    ///
    /// Returns false when no record exists: metadata can only attach to an
    /// address that has proven reachability with at least one RESPONSE.
    pub fn record_sysinfo(&mut self, addr: SocketAddr, text: String) -> bool {
        match self.agents.get_mut(&addr) {
            Some(record) => {
                debug!(agent = %addr, sysinfo = %text, "Agent metadata updated");
                record.sysinfo = text;
                true
            }
            None => false,
        }
    }

    /// Flip every alive record that has been silent for longer than
    /// `timeout` to dead, returning the newly dead addresses.
    ///
    /// The `alive` guard makes the transition edge-triggered: a record that
    /// is already dead is never returned again while it stays silent.
    pub fn reap(&mut self, now: DateTime<Utc>, timeout: Duration) -> Vec<SocketAddr> {
        let mut newly_dead = Vec::new();
        for record in self.agents.values_mut() {
            if !record.alive {
                continue;
            }
            let silent = now
                .signed_duration_since(record.last_seen)
                .to_std()
                .is_ok_and(|gap| gap > timeout);
            if silent {
                record.alive = false;
                newly_dead.push(record.addr);
            }
        }
        newly_dead
    }

    /// Addresses currently considered alive.
    pub fn alive_agents(&self) -> Vec<SocketAddr> {
        self.agents
            .values()
            .filter(|record| record.alive)
            .map(|record| record.addr)
            .collect()
    }

    /// Cloned view of the full table for rendering.
    pub fn snapshot(&self) -> Vec<AgentRecord> {
        self.agents.values().cloned().collect()
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&AgentRecord> {
        self.agents.get(addr)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_response_creates_alive_record() {
        let mut table = LivenessTable::new();
        let now = Utc::now();
        let agent = addr("10.0.0.5:12345");

        assert!(table.record_response(agent, now));

        let record = table.get(&agent).unwrap();
        assert!(record.alive);
        assert_eq!(record.sysinfo, "");
        assert_eq!(record.last_seen, now);
    }

    #[test]
    fn test_latest_response_wins() {
        let mut table = LivenessTable::new();
        let base = Utc::now();
        let agent = addr("10.0.0.5:12345");

        table.record_response(agent, base);
        table.record_response(agent, base + chrono::Duration::seconds(3));
        assert!(!table.record_response(agent, base + chrono::Duration::seconds(7)));

        let record = table.get(&agent).unwrap();
        assert!(record.alive);
        assert_eq!(record.last_seen, base + chrono::Duration::seconds(7));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_reap_fires_once_per_crossing() {
        let mut table = LivenessTable::new();
        let base = Utc::now();
        let agent = addr("10.0.0.5:12345");
        table.record_response(agent, base);

        let dead = table.reap(base + chrono::Duration::seconds(11), TIMEOUT);
        assert_eq!(dead, vec![agent]);
        assert!(!table.get(&agent).unwrap().alive);

        // Still silent: the transition must not re-fire.
        let dead = table.reap(base + chrono::Duration::seconds(30), TIMEOUT);
        assert!(dead.is_empty());
    }

    #[test]
    fn test_reap_requires_strict_excess() {
        let mut table = LivenessTable::new();
        let base = Utc::now();
        let agent = addr("10.0.0.5:12345");
        table.record_response(agent, base);

        // Exactly at the threshold is not yet dead.
        let dead = table.reap(base + chrono::Duration::seconds(10), TIMEOUT);
        assert!(dead.is_empty());
        assert!(table.get(&agent).unwrap().alive);
    }

    #[test]
    fn test_sysinfo_without_record_is_dropped() {
        let mut table = LivenessTable::new();
        assert!(!table.record_sysinfo(addr("10.0.0.5:12345"), "Hostname: box1".to_string()));
        assert!(table.is_empty());
    }

    #[test]
    fn test_resurrection_preserves_metadata() {
        let mut table = LivenessTable::new();
        let base = Utc::now();
        let agent = addr("10.0.0.5:12345");

        table.record_response(agent, base);
        table.record_sysinfo(agent, "Hostname: box1".to_string());
        table.reap(base + chrono::Duration::seconds(11), TIMEOUT);
        assert!(!table.get(&agent).unwrap().alive);

        let revived_at = base + chrono::Duration::seconds(20);
        assert!(!table.record_response(agent, revived_at));

        let record = table.get(&agent).unwrap();
        assert!(record.alive);
        assert_eq!(record.last_seen, revived_at);
        assert_eq!(record.sysinfo, "Hostname: box1");
    }

    #[test]
    fn test_alive_agents_excludes_dead() {
        let mut table = LivenessTable::new();
        let base = Utc::now();
        let stale = addr("10.0.0.5:12345");
        let fresh = addr("10.0.0.6:12345");

        table.record_response(stale, base);
        table.record_response(fresh, base + chrono::Duration::seconds(15));
        table.reap(base + chrono::Duration::seconds(16), TIMEOUT);

        assert_eq!(table.alive_agents(), vec![fresh]);
        assert_eq!(table.len(), 2);
    }
}
