//! Peer discovery and quorum querying for the ledgerlink client.
//!
//! Owns the peer registry (the only multi-writer shared state in the
//! workspace), the iterative crawler that expands it, the reachability
//! benchmarker, and the quorum engine that samples peers and reconciles
//! fanned-out query results by majority (spec.md §4.5, §4.6).

pub mod benchmark;
pub mod crawler;
pub mod error;
pub mod quorum;
pub mod registry;

pub use benchmark::benchmark;
pub use crawler::expand;
pub use error::RegistryError;
pub use quorum::{query_balance, reconcile, sample_peers};
pub use registry::{PeerRecord, PeerRegistry};
