//! Cluster controller client.
//!
//! Lists nodes through the controller's REST API. Only the node-list
//! contract is consumed: item metadata (name, labels) and status
//! conditions.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::config::ClusterConfig;
use crate::error::{Error, Result};

/// Node list as returned by the control API.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<NodeItem>,
}

/// One cluster node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeItem {
    pub metadata: NodeMetadata,
    #[serde(default)]
    pub status: NodeStatus,
}

/// Node identity and labels.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeMetadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Node status conditions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

/// One status condition.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

impl NodeItem {
    /// True when the node reports condition `Ready=True`.
    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|condition| condition.kind == "Ready" && condition.status == "True")
    }
}

/// REST client for the cluster controller; the HTTP client is built once
/// per process.
pub struct ClusterClient {
    config: ClusterConfig,
    client: OnceLock<reqwest::Client>,
}

impl ClusterClient {
    /// Creates a client; nothing is dialed until the first listing.
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    fn http(&self) -> &reqwest::Client {
        self.client.get_or_init(|| {
            tracing::info!(api_url = %self.config.api_url, "initializing cluster client");
            reqwest::Client::new()
        })
    }

    /// Lists all cluster nodes.
    ///
    /// # Errors
    /// - [`Error::Backend`] when no API URL is configured
    /// - [`Error::Http`] on transport or non-2xx responses
    pub async fn list_nodes(&self) -> Result<Vec<NodeItem>> {
        if self.config.api_url.is_empty() {
            return Err(Error::Backend(
                "cluster api url is not configured".to_string(),
            ));
        }
        let url = format!("{}/api/v1/nodes", self.config.api_url.trim_end_matches('/'));
        let mut request = self.http().get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        let list: NodeList = response.json().await?;
        Ok(list.items)
    }
}
