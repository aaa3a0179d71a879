//! The settings-store external collaborator (spec.md §4.7): a TOML document
//! holding seed IPs, known peers, and quorum tuning knobs.
//!
//! This is the persistence boundary around `ledgerlink-registry`'s
//! [`PeerRegistry`] and the quorum engine's tuning knobs. The core library
//! never holds process-wide state of its own — the settings record is
//! passed explicitly into the registry, crawler, benchmarker, and quorum
//! engine by whatever owns it (spec.md §9's "global state" redesign note).
//! TOML is used in place of the unspecified "human-readable structured
//! text" the original persists as JSON, matching this corpus's preference
//! for TOML as the idiomatic on-disk config format.

use std::path::Path;

use ledgerlink_registry::{PeerRecord, PeerRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or saving the settings document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("could not read {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    /// The settings file could not be written.
    #[error("could not write {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },

    /// The file's contents were not valid settings TOML.
    #[error("could not parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings record could not be serialized to TOML.
    #[error("could not serialize settings TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A persisted known peer: IP, last-seen Unix timestamp, ping in ms.
/// Mirrors [`ledgerlink_registry::PeerRecord`] but lives in this crate so
/// the registry itself stays free of a `serde` dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownPeer {
    pub ip: String,
    pub last_seen: i64,
    pub ping_ms: u32,
}

impl From<PeerRecord> for KnownPeer {
    fn from(record: PeerRecord) -> Self {
        Self { ip: record.ip, last_seen: record.last_seen, ping_ms: record.ping_ms }
    }
}

impl From<KnownPeer> for PeerRecord {
    fn from(peer: KnownPeer) -> Self {
        Self { ip: peer.ip, last_seen: peer.last_seen, ping_ms: peer.ping_ms }
    }
}

/// The persisted configuration record (spec.md §4.7): seed IPs, currently
/// known IPs, known peers with their benchmark history, expansion depth,
/// force-seed flag, and query sample size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bootstrapping peer addresses, used before any crawl has populated
    /// the registry.
    pub seed_ips: Vec<String>,
    /// IPs discovered by prior crawls, with no benchmark history recorded.
    pub known_ips: Vec<String>,
    /// Peers with a recorded last-seen time and measured ping.
    pub known_peers: Vec<KnownPeer>,
    /// Number of expansion rounds the crawler should run.
    pub ip_expand_depth: usize,
    /// Forces quorum sampling to return only `seed_ips[0]`, bypassing
    /// weighted sampling entirely.
    pub force_query_start_ips: bool,
    /// Number of peers to sample per quorum query; quorum is
    /// `query_size / 2 + 1`.
    pub query_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed_ips: Vec::new(),
            known_ips: Vec::new(),
            known_peers: Vec::new(),
            ip_expand_depth: 3,
            force_query_start_ips: false,
            query_size: 5,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Ok(toml::from_str(&text)?)
    }

    /// Persist settings as pretty-printed TOML to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .map_err(|source| ConfigError::Write { path: path.display().to_string(), source })
    }

    /// Build a [`PeerRegistry`] from this record: known peers with their
    /// benchmark history, plus `known_ips` as bare (unmeasured) entries.
    #[must_use]
    pub fn to_registry(&self) -> PeerRegistry {
        let mut registry =
            PeerRegistry::from_records(self.known_peers.iter().cloned().map(PeerRecord::from));
        for ip in &self.known_ips {
            registry.insert_unknown(ip);
        }
        registry
    }

    /// Snapshot `registry` back into this record's `known_ips`/`known_peers`,
    /// for persistence after a crawl or benchmark round.
    pub fn update_from_registry(&mut self, registry: &PeerRegistry) {
        self.known_peers = registry.snapshot().into_iter().map(KnownPeer::from).collect();
        self.known_ips = registry.ips().map(str::to_string).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_sane_quorum_knobs() {
        let settings = Settings::default();
        assert_eq!(settings.query_size, 5);
        assert!(!settings.force_query_start_ips);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.seed_ips = vec!["10.0.0.1".to_string()];
        settings.known_peers.push(KnownPeer { ip: "10.0.0.2".to_string(), last_seen: 1_700_000_000, ping_ms: 42 });
        settings.query_size = 7;

        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn load_missing_file_is_a_read_error() {
        let result = Settings::load("/nonexistent/settings.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn to_registry_merges_known_ips_and_known_peers() {
        let mut settings = Settings::default();
        settings.known_ips = vec!["10.0.0.1".to_string()];
        settings.known_peers.push(KnownPeer { ip: "10.0.0.2".to_string(), last_seen: 0, ping_ms: 20 });

        let registry = settings.to_registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("10.0.0.1"));
        assert!(registry.contains("10.0.0.2"));
    }

    #[test]
    fn update_from_registry_captures_benchmark_history() {
        let mut registry = PeerRegistry::new();
        registry.merge_benchmark("10.0.0.9", 55);

        let mut settings = Settings::default();
        settings.update_from_registry(&registry);

        assert_eq!(settings.known_peers.len(), 1);
        assert_eq!(settings.known_peers[0].ping_ms, 55);
        assert_eq!(settings.known_ips, vec!["10.0.0.9".to_string()]);
    }
}
