//! Iterative peer-list expansion: repeatedly ask known peers for their
//! peer lists, deduplicating into the registry (spec.md §4.5).
//!
//! Grounded on `original_source/query_manager.go::ExpandIPs`, re-expressed
//! with `JoinSet` fan-out and a racing `tokio::time::timeout` in place of
//! the original's channel + `time.After` select loop. One deliberate
//! deviation: a peer discovered in round N is merged into the registry
//! immediately rather than only surviving into round N+1's candidate list —
//! the original drops peers that don't happen to be re-mentioned by a later
//! round, which would make the registry lose peers as expansion deepens.

use std::collections::HashSet;
use std::time::Duration;

use ledgerlink_protocol::{get_ip_list, Session};
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::registry::PeerRegistry;

/// Round-level deadline: if a round does not complete within this window,
/// expansion aborts and returns what it has collected so far.
pub const ROUND_TIMEOUT: Duration = Duration::from_secs(5);

/// Expand `registry` from `seeds` union the registry's current IPs,
/// repeating up to `depth` rounds. Each round concurrently opens a session
/// to every not-yet-queried IP, runs `GetIpList`, and folds the responding
/// peer plus every IP it returned into the registry and into the next
/// round's frontier.
///
/// Returns the number of rounds actually completed (fewer than `depth` if
/// a round's deadline fires, or if the frontier is exhausted early).
#[tracing::instrument(skip(registry, seeds))]
pub async fn expand(registry: &mut PeerRegistry, seeds: &[String], depth: usize) -> usize {
    let mut frontier: HashSet<String> = seeds.iter().cloned().collect();
    frontier.extend(registry.ips().map(str::to_string));
    let mut queried: HashSet<String> = HashSet::new();

    let mut rounds_completed = 0;
    for round in 0..depth {
        let to_query: Vec<String> =
            frontier.difference(&queried).cloned().collect();
        if to_query.is_empty() {
            break;
        }
        for ip in &to_query {
            queried.insert(ip.clone());
        }

        let mut join_set = JoinSet::new();
        for ip in to_query {
            join_set.spawn(async move {
                let mut session = Session::open(&ip).await.ok()?;
                if session.block_height() == 0 {
                    tracing::debug!(%ip, "peer unreachable during expand");
                    return None;
                }
                let peers = get_ip_list(&mut session).await.ok()?;
                Some((ip, peers))
            });
        }

        let mut discovered = HashSet::new();
        let outcome = timeout(ROUND_TIMEOUT, async {
            while let Some(joined) = join_set.join_next().await {
                if let Ok(Some((ip, peers))) = joined {
                    discovered.insert(ip);
                    discovered.extend(peers);
                }
            }
        })
        .await;

        for ip in &discovered {
            registry.insert_unknown(ip);
        }
        frontier.extend(discovered);

        if outcome.is_err() {
            tracing::warn!(round, "expand round timed out, returning partial results");
            join_set.abort_all();
            return rounds_completed;
        }
        rounds_completed += 1;
    }
    rounds_completed
}
