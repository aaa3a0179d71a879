//! Reachability benchmarking: measure wall-clock handshake latency to a
//! batch of peers and merge the result into the registry (spec.md §4.5).
//!
//! Grounded on `original_source/query_manager.go::BenchmarkNodes`.

use std::time::{Duration, Instant};

use ledgerlink_protocol::Session;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::registry::{PeerRegistry, UNREACHABLE_PING_MS};

/// Per-batch deadline: if a batch does not finish within this window, the
/// benchmark abandons outstanding connections and returns.
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Benchmark `ips` in batches of `batch_size`, concurrently opening a
/// session to each and measuring wall-clock time to handshake completion.
/// A peer whose handshake reports a block height of zero is recorded with
/// the [`UNREACHABLE_PING_MS`] penalty. Merges every measurement into
/// `registry` via [`PeerRegistry::merge_benchmark`].
#[tracing::instrument(skip(registry, ips))]
pub async fn benchmark(registry: &mut PeerRegistry, ips: &[String], batch_size: usize) {
    debug_assert!(batch_size > 0, "batch_size must be positive");
    for batch in ips.chunks(batch_size.max(1)) {
        let mut join_set = JoinSet::new();
        for ip in batch {
            let ip = ip.clone();
            join_set.spawn(async move {
                let start = Instant::now();
                let ping_ms = match Session::open(&ip).await {
                    Ok(session) if session.block_height() != 0 => {
                        start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
                    }
                    Ok(_) => {
                        tracing::debug!(%ip, "handshake reported zero block height");
                        UNREACHABLE_PING_MS
                    }
                    Err(error) => {
                        tracing::debug!(%ip, %error, "benchmark connection failed");
                        UNREACHABLE_PING_MS
                    }
                };
                (ip, ping_ms)
            });
        }

        let outcome = timeout(BATCH_TIMEOUT, async {
            let mut results = Vec::with_capacity(batch.len());
            while let Some(joined) = join_set.join_next().await {
                if let Ok(pair) = joined {
                    results.push(pair);
                }
            }
            results
        })
        .await;

        match outcome {
            Ok(results) => {
                for (ip, ping_ms) in results {
                    registry.merge_benchmark(&ip, ping_ms);
                }
            }
            Err(_) => {
                tracing::warn!("benchmark batch timed out, abandoning stragglers");
                join_set.abort_all();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_peer_records_penalty_ping() {
        let mut registry = PeerRegistry::new();
        let ips = vec!["127.0.0.1".to_string()];
        benchmark(&mut registry, &ips, 1).await;

        let record = registry.snapshot().into_iter().find(|p| p.ip == "127.0.0.1").unwrap();
        assert_eq!(record.ping_ms, UNREACHABLE_PING_MS);
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let mut registry = PeerRegistry::new();
        let ips: Vec<String> = (0..5).map(|_| "127.0.0.1".to_string()).collect();
        benchmark(&mut registry, &ips, 2).await;
        // All five share an IP, so they collapse to one registry entry.
        assert_eq!(registry.len(), 1);
    }
}
