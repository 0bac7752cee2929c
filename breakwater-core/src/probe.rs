//! Cache-existence probing for built export URLs.
//!
//! A downstream service answers 200 to `?done=true` iff the URL is already
//! served from cache. Probes are coalesced by URL path and cached for a
//! short window so URL building stays cheap under fan-in.

use std::time::Duration;

use crate::coalesce::{CoalescingConfig, CoalescingMap};
use crate::config::ProbeConfig;
use crate::error::Result;
use crate::urls::MyUrl;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_EXPIRE: Duration = Duration::from_secs(30);

/// Coalesced `done=true` prober.
pub struct CacheProbe {
    map: CoalescingMap<bool>,
    client: reqwest::Client,
    config: ProbeConfig,
}

impl CacheProbe {
    /// Creates a prober with its own HTTP client.
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            map: CoalescingMap::new(CoalescingConfig {
                concurrency: 0,
                capacity: 0,
                expire: PROBE_EXPIRE,
                error_expire: Duration::ZERO,
            }),
            client: reqwest::Client::new(),
            config,
        }
    }

    /// True when the downstream already serves `url` from cache.
    ///
    /// Results are keyed by the URL path only, so variants of the same
    /// path coalesce onto a single probe.
    ///
    /// # Errors
    /// - [`crate::Error::Http`] on transport failures
    pub async fn get(&self, url: &MyUrl) -> Result<bool> {
        let key = url.path().to_string();
        self.map
            .get(&key, || async move { self.fetch(url).await })
            .await
    }

    async fn fetch(&self, url: &MyUrl) -> Result<bool> {
        let mut probe = url.clone();
        if self.config.use_internal_proxy {
            probe.set_host(format!(
                "{}:{}",
                self.config.proxy_host, self.config.proxy_port
            ));
            probe.set_scheme("http");
        }
        probe.set_query("done", "true");
        if probe.host().is_empty() {
            // No target to ask; report "not cached" the way the web-cache
            // services do when unconfigured.
            return Ok(false);
        }
        tracing::debug!(probe = %probe, "probing cache");
        let response = self
            .client
            .get(probe.to_string())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(response.status() == reqwest::StatusCode::OK)
    }
}
