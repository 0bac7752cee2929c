//! Infohash-affine subdomain selection.
//!
//! Nodes form a ring ordered by name; the first five hex digits of the
//! info-hash pick a preferred ring position and its immediate neighbors.
//! Identical info-hashes therefore land on the same subdomains, which keeps
//! downstream seeder caches warm while the ring still spreads load.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::nodes::{NodeInventory, NodeStat};

const MAX_SUBDOMAINS: usize = 3;
const INFOHASH_MAX_SPREAD: usize = 1;

/// Picks backend subdomains for a given info-hash, pool and caller role.
pub struct SubdomainSelector {
    inventory: Arc<NodeInventory>,
}

struct ScoredNode {
    stat: NodeStat,
    score: f64,
    distance: usize,
}

impl SubdomainSelector {
    /// Creates a selector over the given inventory.
    pub fn new(inventory: Arc<NodeInventory>) -> Self {
        Self { inventory }
    }

    /// Returns up to three subdomains ranked by affinity for `infohash`.
    ///
    /// # Errors
    /// - [`Error::Backend`] when the inventory cannot be read
    /// - [`Error::InfohashParse`] when the hash has no leading hex digits
    pub async fn get(&self, infohash: &str, pool: &str, role: &str) -> Result<Vec<String>> {
        let stats = self
            .inventory
            .get()
            .await
            .map_err(|e| Error::Backend(format!("failed to get nodes stat: {e}")))?;
        select(stats, infohash, pool, role)
    }
}

/// Ranks `stats` for `infohash` and returns the top subdomains.
pub(crate) fn select(
    stats: Vec<NodeStat>,
    infohash: &str,
    pool: &str,
    role: &str,
) -> Result<Vec<String>> {
    let mut nodes: Vec<ScoredNode> = stats
        .into_iter()
        .filter(|stat| !stat.subdomain.is_empty())
        .map(|stat| ScoredNode {
            stat,
            score: 1.0,
            distance: 0,
        })
        .collect();
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    // Best-effort pool affinity: the filter only applies when some node
    // actually advertises the pool.
    let pool_known = !pool.is_empty()
        && nodes
            .iter()
            .any(|node| node.stat.pools.iter().any(|p| p == pool));
    if pool_known {
        nodes.retain(|node| node.stat.pools.iter().any(|p| p == pool));
    }

    if !role.is_empty() {
        nodes.retain(|node| node.stat.is_allowed(role));
    }
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    // Descending by name: a stable ring ordering independent of the order
    // the control API happens to return.
    nodes.sort_by(|a, b| b.stat.name.cmp(&a.stat.name));
    score_by_infohash(&mut nodes, infohash)?;
    nodes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    nodes.retain(|node| node.score != 0.0);

    Ok(nodes
        .into_iter()
        .take(MAX_SUBDOMAINS)
        .map(|node| node.stat.subdomain)
        .collect())
}

fn score_by_infohash(nodes: &mut [ScoredNode], infohash: &str) -> Result<()> {
    if infohash.len() < 5 {
        return Err(Error::InfohashParse {
            infohash: infohash.to_string(),
        });
    }
    let num = i64::from_str_radix(&infohash[..5], 16).map_err(|_| Error::InfohashParse {
        infohash: infohash.to_string(),
    })? * 1000;
    let total: i64 = 1_048_575 * 1000;
    let interval = total / nodes.len() as i64;
    let mut bucket = 0;
    for i in 0..nodes.len() {
        if num < (i as i64 + 1) * interval {
            bucket = i;
            break;
        }
    }

    let spread = (nodes.len() / 2).min(INFOHASH_MAX_SPREAD);
    for node in nodes.iter_mut() {
        node.distance = spread + 1;
    }
    let len = nodes.len() as i64;
    for offset in -(spread as i64)..=(spread as i64) {
        let position = (bucket as i64 + offset).rem_euclid(len) as usize;
        nodes[position].distance = offset.unsigned_abs() as usize;
    }
    for node in nodes.iter_mut() {
        if node.distance == 0 {
            continue;
        }
        node.score *= 1.0 / (2.0 * node.distance as f64);
    }
    Ok(())
}
