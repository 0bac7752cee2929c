//! Ready-node inventory with label-derived serving metadata.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::ClusterClient;
use crate::coalesce::{CoalescingConfig, CoalescingMap};
use crate::error::{Error, Result};

const INVENTORY_EXPIRE: Duration = Duration::from_secs(30);
const INVENTORY_ERROR_EXPIRE: Duration = Duration::from_secs(15);

/// Serving metadata of one ready node, extracted from its labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStat {
    pub name: String,
    /// DNS label used as hostname component; nodes without one do not
    /// participate in selection.
    pub subdomain: String,
    pub pools: Vec<String>,
    pub roles_allowed: Vec<String>,
    pub roles_denied: Vec<String>,
}

impl NodeStat {
    /// True when this node's role lists permit `role`: an empty allow list
    /// admits everyone, the deny list always wins.
    pub fn is_allowed(&self, role: &str) -> bool {
        let allowed = self.roles_allowed.is_empty()
            || self.roles_allowed.iter().any(|allowed| allowed == role);
        allowed && !self.roles_denied.iter().any(|denied| denied == role)
    }
}

/// Cached view of the cluster's ready nodes.
///
/// Exactly one cluster list call is in flight at a time; the single cached
/// entry refreshes every thirty seconds.
pub struct NodeInventory {
    map: CoalescingMap<Vec<NodeStat>>,
    cluster: Arc<ClusterClient>,
    label_prefix: String,
}

impl NodeInventory {
    /// Creates an inventory reading labels under `label_prefix`.
    pub fn new(cluster: Arc<ClusterClient>, label_prefix: String) -> Self {
        Self {
            map: CoalescingMap::new(CoalescingConfig {
                concurrency: 1,
                capacity: 1,
                expire: INVENTORY_EXPIRE,
                error_expire: INVENTORY_ERROR_EXPIRE,
            }),
            cluster,
            label_prefix,
        }
    }

    /// Returns the current ready nodes with their serving metadata.
    ///
    /// # Errors
    /// - [`Error::Backend`] wrapping cluster listing failures
    pub async fn get(&self) -> Result<Vec<NodeStat>> {
        self.map.get("", || async move { self.fetch().await }).await
    }

    async fn fetch(&self) -> Result<Vec<NodeStat>> {
        let nodes = self
            .cluster
            .list_nodes()
            .await
            .map_err(|e| Error::Backend(format!("failed to get cluster nodes: {e}")))?;
        let stats: Vec<NodeStat> = nodes
            .into_iter()
            .filter(|node| node.is_ready())
            .map(|node| {
                node_stat_from_labels(node.metadata.name, &node.metadata.labels, &self.label_prefix)
            })
            .collect();
        tracing::debug!(count = stats.len(), "refreshed node inventory");
        Ok(stats)
    }
}

/// Derives a [`NodeStat`] from node labels under `prefix`:
/// `{prefix}subdomain`, `{prefix}<x>-pool == "true"` and the
/// `{prefix}roles-allowed` / `{prefix}roles-denied` comma lists.
pub(crate) fn node_stat_from_labels(
    name: String,
    labels: &HashMap<String, String>,
    prefix: &str,
) -> NodeStat {
    let subdomain = labels
        .get(&format!("{prefix}subdomain"))
        .cloned()
        .unwrap_or_default();
    let mut pools = Vec::new();
    for (label, value) in labels {
        if value != "true" {
            continue;
        }
        if let Some(pool) = label
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix("-pool"))
        {
            pools.push(pool.to_string());
        }
    }
    pools.sort();
    NodeStat {
        name,
        subdomain,
        pools,
        roles_allowed: comma_list(labels.get(&format!("{prefix}roles-allowed"))),
        roles_denied: comma_list(labels.get(&format!("{prefix}roles-denied"))),
    }
}

fn comma_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
