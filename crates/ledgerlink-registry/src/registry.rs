//! Peer registry: the set of known peer addresses, each carrying a
//! last-seen timestamp and a measured reachability ping (spec.md §3, §4.5).
//!
//! Identity is the IP string. The registry is the only multi-writer shared
//! structure in this crate: the crawler and benchmarker mutate it, the
//! quorum engine reads a snapshot for sampling.

use std::collections::HashMap;

/// Penalty ping, in milliseconds, recorded for a peer whose session
/// reports a block height of zero during benchmarking — i.e. unreachable
/// or otherwise unusable.
pub const UNREACHABLE_PING_MS: u32 = 10_000;

/// A single known peer. `last_seen` is a Unix timestamp (seconds), matching
/// how timestamps are carried elsewhere in this corpus rather than pulling
/// in chrono's `serde` feature just to round-trip one field.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    pub ip: String,
    pub last_seen: i64,
    pub ping_ms: u32,
}

impl PeerRecord {
    fn fresh(ip: impl Into<String>) -> Self {
        Self { ip: ip.into(), last_seen: chrono::Utc::now().timestamp(), ping_ms: 0 }
    }
}

/// The set of known peers, keyed by IP.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerRecord>,
}

impl PeerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a seed IP list, each with no ping measurement
    /// yet. Duplicate IPs collapse to a single entry.
    #[must_use]
    pub fn seed(ips: impl IntoIterator<Item = String>) -> Self {
        let mut registry = Self::new();
        for ip in ips {
            registry.insert_unknown(&ip);
        }
        registry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    #[must_use]
    pub fn contains(&self, ip: &str) -> bool {
        self.peers.contains_key(ip)
    }

    /// All known IPs, in arbitrary order.
    pub fn ips(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(String::as_str)
    }

    /// A read-only snapshot of every known peer, for sampling.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        self.peers.values().cloned().collect()
    }

    /// Build a registry directly from known peer records, e.g. ones loaded
    /// from persisted settings.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = PeerRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.peers.insert(record.ip.clone(), record);
        }
        registry
    }

    /// Insert `ip` with no ping measurement if it is not already known.
    /// Returns whether it was newly inserted.
    pub fn insert_unknown(&mut self, ip: &str) -> bool {
        if self.peers.contains_key(ip) {
            return false;
        }
        self.peers.insert(ip.to_string(), PeerRecord::fresh(ip));
        true
    }

    /// Merge a fresh ping measurement for `ip`. For an already-known peer,
    /// smooths the ping via `new = (2*old + measured) / 3`; for a new peer,
    /// records the measurement outright. Always stamps `last_seen`.
    pub fn merge_benchmark(&mut self, ip: &str, measured_ping_ms: u32) {
        match self.peers.get_mut(ip) {
            Some(record) => {
                record.ping_ms = (record.ping_ms.saturating_mul(2) + measured_ping_ms) / 3;
                record.last_seen = chrono::Utc::now().timestamp();
            }
            None => {
                self.peers.insert(
                    ip.to_string(),
                    PeerRecord {
                        ip: ip.to_string(),
                        last_seen: chrono::Utc::now().timestamp(),
                        ping_ms: measured_ping_ms,
                    },
                );
            }
        }
    }
}
