//! Centralized configuration for the gateway.
//!
//! All tunable parameters live here, grouped into sections, with environment
//! variable overrides matching the deployment's conventional names.

use std::collections::HashMap;

/// Central configuration for all gateway components.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub web: WebConfig,
    pub export: ExportConfig,
    pub backend: BackendConfig,
    pub cluster: ClusterConfig,
    pub probe: ProbeConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Listening host; empty binds all interfaces.
    pub host: String,
    /// Listening port.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8080,
        }
    }
}

/// Export URL synthesis settings.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Public base URL of the export surface (scheme + host), e.g.
    /// `https://example.com`. Empty leaves built URLs host-less with an
    /// `http` scheme.
    pub domain: String,
    /// Path prefix prepended to every export URL.
    pub path_prefix: String,
    /// Fallback API key attached when the caller supplies none.
    pub api_key: String,
    /// HS256 secret used to mint and validate tokens.
    pub api_secret: String,
    /// Role claim minted into fresh tokens.
    pub api_role: String,
    /// Whether to prepend a selected node subdomain to the export host.
    pub use_subdomains: bool,
    /// Node pool preferred by subdomain selection.
    pub subdomains_pool: String,
    /// Video-info service host; the subtitles exporter is registered only
    /// when host or port is set.
    pub video_info_host: String,
    /// Video-info service port.
    pub video_info_port: u16,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            path_prefix: "/".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            api_role: "free".to_string(),
            use_subdomains: true,
            subdomains_pool: "seeder".to_string(),
            video_info_host: String::new(),
            video_info_port: 0,
        }
    }
}

/// Addresses of the gRPC backends.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Torrent store host.
    pub torrent_store_host: String,
    /// Torrent store port.
    pub torrent_store_port: u16,
    /// Magnet resolver host.
    pub magnet2torrent_host: String,
    /// Magnet resolver port.
    pub magnet2torrent_port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            torrent_store_host: String::new(),
            torrent_store_port: 50051,
            magnet2torrent_host: String::new(),
            magnet2torrent_port: 50051,
        }
    }
}

/// Cluster controller access and node label conventions.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Base URL of the cluster control API.
    pub api_url: String,
    /// Bearer token for the control API, when required.
    pub token: Option<String>,
    /// Prefix of the node labels carrying subdomain/pool/role metadata.
    pub node_label_prefix: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            token: None,
            node_label_prefix: "webtor.io/".to_string(),
        }
    }
}

/// Cache-probe routing settings.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Route probes through the internal torrent HTTP proxy instead of the
    /// public host.
    pub use_internal_proxy: bool,
    /// Internal proxy host.
    pub proxy_host: String,
    /// Internal proxy port.
    pub proxy_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            use_internal_proxy: false,
            proxy_host: String::new(),
            proxy_port: 80,
        }
    }
}

impl GatewayConfig {
    /// Creates configuration with environment variable overrides applied on
    /// top of the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Like [`GatewayConfig::from_env`] but reading from an explicit map;
    /// used by tests to avoid process-global state.
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(&|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        set_string(lookup, "WEB_HOST", &mut config.web.host);
        set_parsed(lookup, "WEB_PORT", &mut config.web.port);

        set_string(lookup, "EXPORT_DOMAIN", &mut config.export.domain);
        set_string(lookup, "EXPORT_PATH_PREFIX", &mut config.export.path_prefix);
        set_string(lookup, "EXPORT_API_KEY", &mut config.export.api_key);
        set_string(lookup, "EXPORT_API_SECRET", &mut config.export.api_secret);
        set_string(lookup, "EXPORT_API_ROLE", &mut config.export.api_role);
        set_parsed(
            lookup,
            "EXPORT_USE_SUBDOMAINS",
            &mut config.export.use_subdomains,
        );
        set_string(lookup, "EXPORT_K8S_POOL", &mut config.export.subdomains_pool);
        set_string(
            lookup,
            "VIDEO_INFO_SERVICE_HOST",
            &mut config.export.video_info_host,
        );
        set_parsed(
            lookup,
            "VIDEO_INFO_SERVICE_PORT",
            &mut config.export.video_info_port,
        );

        set_string(
            lookup,
            "TORRENT_STORE_SERVICE_HOST",
            &mut config.backend.torrent_store_host,
        );
        set_parsed(
            lookup,
            "TORRENT_STORE_SERVICE_PORT",
            &mut config.backend.torrent_store_port,
        );
        set_string(
            lookup,
            "MAGNET2TORRENT_SERVICE_HOST",
            &mut config.backend.magnet2torrent_host,
        );
        set_parsed(
            lookup,
            "MAGNET2TORRENT_SERVICE_PORT",
            &mut config.backend.magnet2torrent_port,
        );

        set_string(lookup, "CLUSTER_API_URL", &mut config.cluster.api_url);
        if let Some(token) = lookup("CLUSTER_API_TOKEN") {
            config.cluster.token = Some(token);
        }
        set_string(
            lookup,
            "NODE_LABEL_PREFIX",
            &mut config.cluster.node_label_prefix,
        );

        set_parsed(
            lookup,
            "USE_INTERNAL_TORRENT_HTTP_PROXY",
            &mut config.probe.use_internal_proxy,
        );
        set_string(
            lookup,
            "TORRENT_HTTP_PROXY_SERVICE_HOST",
            &mut config.probe.proxy_host,
        );
        set_parsed(
            lookup,
            "TORRENT_HTTP_PROXY_SERVICE_PORT",
            &mut config.probe.proxy_port,
        );

        config
    }

    /// True when the video-info service is reachable and the subtitles
    /// exporter should be registered.
    pub fn video_info_configured(&self) -> bool {
        !self.export.video_info_host.is_empty() || self.export.video_info_port != 0
    }
}

fn set_string(lookup: &dyn Fn(&str) -> Option<String>, key: &str, target: &mut String) {
    if let Some(value) = lookup(key) {
        *target = value;
    }
}

fn set_parsed<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(value) = lookup(key) {
        if let Ok(parsed) = value.parse::<T>() {
            *target = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = GatewayConfig::default();

        assert_eq!(config.web.port, 8080);
        assert_eq!(config.export.path_prefix, "/");
        assert_eq!(config.export.api_role, "free");
        assert!(config.export.use_subdomains);
        assert_eq!(config.export.subdomains_pool, "seeder");
        assert_eq!(config.backend.torrent_store_port, 50051);
        assert_eq!(config.cluster.node_label_prefix, "webtor.io/");
        assert!(!config.video_info_configured());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<String, String> = [
            ("WEB_PORT", "9090"),
            ("EXPORT_DOMAIN", "https://example.com"),
            ("EXPORT_USE_SUBDOMAINS", "false"),
            ("VIDEO_INFO_SERVICE_PORT", "8081"),
            ("CLUSTER_API_TOKEN", "secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = GatewayConfig::from_map(&vars);

        assert_eq!(config.web.port, 9090);
        assert_eq!(config.export.domain, "https://example.com");
        assert!(!config.export.use_subdomains);
        assert!(config.video_info_configured());
        assert_eq!(config.cluster.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unparseable_override_keeps_default() {
        let vars: HashMap<String, String> = [("WEB_PORT".to_string(), "not-a-port".to_string())]
            .into_iter()
            .collect();
        let config = GatewayConfig::from_map(&vars);
        assert_eq!(config.web.port, 8080);
    }
}
