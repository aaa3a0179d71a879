//! Peer sampling, concurrent fan-out, and majority reconciliation
//! (spec.md §4.6).
//!
//! Grounded on `original_source/query_manager.go::{PickNodes, QueryBalance}`.
//! One deliberate deviation from the original, per spec.md §9's "floating
//! point weighting anomaly" flag: sampling weight is `exp(-ping_ms / 2.0)`
//! using `f64` division throughout, never `ping / 2` integer division —
//! the original divides by zero for `ping_ms` of 0 or 1. The other flagged
//! deviation is the zero-amount sentinel: a fanned-out query's outcome is
//! `Option<u64>` (`None` = the task failed), so a legitimate zero balance
//! is never silently dropped from the tally the way `balance.Amount != 0`
//! drops it in the original.

use std::collections::HashMap;
use std::time::Duration;

use ledgerlink_core::WotsAddress;
use ledgerlink_protocol::{get_balance, Session};
use rand::Rng;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::error::RegistryError;
use crate::registry::{PeerRecord, PeerRegistry};

/// Overall deadline for a fanned-out query across all sampled peers.
pub const FANOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sampling weight for a peer with the given ping, in milliseconds.
/// Monotonically decreasing in `ping_ms`, finite everywhere (including
/// `ping_ms == 0`).
fn sample_weight(ping_ms: u32) -> f64 {
    (-f64::from(ping_ms) / 2.0).exp()
}

/// Draw `n` distinct peers from the registry without replacement, weighted
/// by [`sample_weight`].
///
/// - If `force_seed` is set, returns only registered peers whose IP equals
///   `seeds[0]` (empty if there are no seeds).
/// - If `n >= registry.len()`, returns the full registry.
/// - Otherwise draws by cumulative-weight inverse sampling: compute the
///   total weight, draw a uniform value in `[0, total)`, walk the peer
///   list accumulating weight until the running sum crosses the draw.
///   A peer already present in the result is re-drawn.
#[must_use]
pub fn sample_peers(registry: &PeerRegistry, n: usize, force_seed: bool, seeds: &[String]) -> Vec<PeerRecord> {
    let all = registry.snapshot();

    if force_seed {
        return match seeds.first() {
            Some(first) => all.into_iter().filter(|p| &p.ip == first).collect(),
            None => Vec::new(),
        };
    }

    if n >= all.len() {
        return all;
    }

    let mut rng = rand::thread_rng();
    let mut chosen_ips = std::collections::HashSet::with_capacity(n);
    let mut chosen = Vec::with_capacity(n);

    while chosen.len() < n {
        let total: f64 = all.iter().map(|p| sample_weight(p.ping_ms)).sum();
        if !total.is_finite() || total <= 0.0 {
            break;
        }
        let draw = rng.gen::<f64>() * total;
        let mut acc = 0.0;
        let picked = all
            .iter()
            .find(|p| {
                acc += sample_weight(p.ping_ms);
                acc >= draw
            })
            .or_else(|| all.last());

        let Some(picked) = picked else { break };
        if chosen_ips.insert(picked.ip.clone()) {
            chosen.push(picked.clone());
        }
    }
    chosen
}

/// Tally `votes` (one `Option<u64>` per fanned-out peer; `None` marks a
/// failed task) and return the amount reaching the `query_size / 2 + 1`
/// majority threshold, or [`RegistryError::NoQuorum`] if none does.
pub fn reconcile(votes: &[Option<u64>], query_size: usize) -> Result<u64, RegistryError> {
    let threshold = query_size / 2 + 1;
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for amount in votes.iter().flatten() {
        *counts.entry(*amount).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .find(|(_, count)| *count >= threshold)
        .map(|(amount, _)| amount)
        .ok_or(RegistryError::NoQuorum)
}

/// Sample `query_size` peers, fan out a concurrent `GetBalance` for
/// `address` to each, and reconcile the results by majority. A connection
/// or query failure contributes `None` to the tally rather than a zero
/// amount.
#[tracing::instrument(skip(registry, address, seeds), fields(query_size))]
pub async fn query_balance(
    registry: &PeerRegistry,
    address: &WotsAddress,
    query_size: usize,
    force_seed: bool,
    seeds: &[String],
) -> Result<u64, RegistryError> {
    let peers = sample_peers(registry, query_size, force_seed, seeds);
    if peers.is_empty() {
        return Err(RegistryError::EmptyRegistry);
    }

    let mut join_set = JoinSet::new();
    for peer in peers {
        let address = *address;
        join_set.spawn(async move {
            let mut session = match Session::open(&peer.ip).await {
                Ok(session) => session,
                Err(error) => {
                    tracing::debug!(ip = %peer.ip, %error, "quorum peer unreachable");
                    return None;
                }
            };
            match get_balance(&mut session, &address).await {
                Ok(amount) => Some(amount),
                Err(error) => {
                    tracing::debug!(ip = %peer.ip, %error, "quorum query failed");
                    None
                }
            }
        });
    }

    let mut votes = Vec::new();
    let _ = timeout(FANOUT_TIMEOUT, async {
        while let Some(joined) = join_set.join_next().await {
            votes.push(joined.unwrap_or(None));
        }
    })
    .await;
    join_set.abort_all();

    reconcile(&votes, query_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_win_example() {
        let votes = vec![Some(1000), Some(1000), Some(1000), Some(500), None];
        assert_eq!(reconcile(&votes, 5).unwrap(), 1000);
    }

    #[test]
    fn quorum_loss_example() {
        let votes = vec![Some(1000), Some(1000), Some(500), Some(500), None];
        assert!(matches!(reconcile(&votes, 5), Err(RegistryError::NoQuorum)));
    }

    #[test]
    fn zero_amount_can_win_quorum() {
        // Two non-zero-failures tallied against a zero legitimate balance:
        // threshold for query_size=3 is 2, and the two 100s clear it.
        let votes = vec![Some(0), Some(100), Some(100)];
        assert_eq!(reconcile(&votes, 3).unwrap(), 100);
    }

    #[test]
    fn a_legitimate_all_zero_balance_wins_quorum() {
        // Demonstrates the zero-sentinel fix: three real zero balances (not
        // three failed tasks) still reach quorum, unlike the original's
        // `balance.Amount != 0` filter which would have dropped every vote.
        let votes = vec![Some(0), Some(0), Some(0)];
        assert_eq!(reconcile(&votes, 3).unwrap(), 0);
    }

    #[test]
    fn all_failures_yield_no_quorum() {
        let votes = vec![None, None, None];
        assert!(matches!(reconcile(&votes, 3), Err(RegistryError::NoQuorum)));
    }

    #[test]
    fn sample_with_n_ge_registry_returns_everything() {
        let registry = {
            let mut r = PeerRegistry::new();
            r.merge_benchmark("10.0.0.1", 10);
            r.merge_benchmark("10.0.0.2", 20);
            r
        };
        let sampled = sample_peers(&registry, 10, false, &[]);
        assert_eq!(sampled.len(), 2);
    }

    #[test]
    fn sample_with_force_seed_returns_only_first_seed() {
        let registry = {
            let mut r = PeerRegistry::new();
            r.merge_benchmark("10.0.0.1", 10);
            r.merge_benchmark("10.0.0.2", 20);
            r
        };
        let seeds = vec!["10.0.0.2".to_string()];
        let sampled = sample_peers(&registry, 1, true, &seeds);
        assert_eq!(sampled.len(), 1);
        assert_eq!(sampled[0].ip, "10.0.0.2");
    }

    #[test]
    fn sample_weight_is_finite_at_zero_and_one() {
        assert!(sample_weight(0).is_finite());
        assert!(sample_weight(1).is_finite());
        assert!(sample_weight(0) > sample_weight(1));
        assert!(sample_weight(1) > sample_weight(1000));
    }

    #[test]
    fn sample_without_replacement_draws_distinct_peers() {
        let registry = {
            let mut r = PeerRegistry::new();
            for i in 0..5 {
                r.merge_benchmark(&format!("10.0.0.{i}"), 50);
            }
            r
        };
        let sampled = sample_peers(&registry, 3, false, &[]);
        assert_eq!(sampled.len(), 3);
        let unique: std::collections::HashSet<_> = sampled.iter().map(|p| p.ip.clone()).collect();
        assert_eq!(unique.len(), 3);
    }
}
