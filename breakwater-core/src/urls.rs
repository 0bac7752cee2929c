//! Export URL composition.
//!
//! Every export type shares one pipeline — scheme, then domain (with
//! optional subdomain injection), then the base path and auth query, then a
//! type-specific tail. URLs are carried in a plain bag rather than a parsed
//! URL so host-less deployments (no configured domain) still produce
//! well-formed `http:///...` strings.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;
use url::Url;

use crate::auth;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::export::ExportType;
use crate::media::{should_transcode, MediaFormat};
use crate::models::{ExportMeta, ListItem, ListItemKind};
use crate::params::ParamSource;
use crate::probe::CacheProbe;
use crate::resource::{sha1_hex, Resource};
use crate::subdomains::SubdomainSelector;

/// Separator between the item path and a downstream service tail.
pub const SERVICE_SEPARATOR: char = '~';

/// Downstream service selected by the path token after the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// Archive zipper.
    Archive,
    /// HLS transcoder.
    Transcode,
    /// VOD packager.
    Vod,
    /// SRT to VTT converter.
    Srt2Vtt,
    /// Video info / subtitles service.
    VideoInfo,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            ServiceType::Archive => "arch",
            ServiceType::Transcode => "hls",
            ServiceType::Vod => "vod",
            ServiceType::Srt2Vtt => "vtt",
            ServiceType::VideoInfo => "vi",
        };
        write!(f, "{token}")
    }
}

const PATH_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// URL bag with the cache and transcode flags derived while building.
#[derive(Debug, Clone, Default)]
pub struct MyUrl {
    scheme: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    /// Downstream already serves this URL from cache.
    pub cached: bool,
    /// The URL routes through the HLS transcoder.
    pub transcode: bool,
    /// The transcoded rendition itself is already cached.
    pub transcode_cached: bool,
    /// Multi-bitrate rendition flag.
    pub multibitrate: bool,
}

impl MyUrl {
    /// URL path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Host, possibly empty.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Replaces the scheme.
    pub fn set_scheme(&mut self, scheme: &str) {
        self.scheme = scheme.to_string();
    }

    /// Replaces the host.
    pub fn set_host(&mut self, host: String) {
        self.host = host;
    }

    /// Replaces the path.
    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    /// Appends to the path.
    pub fn push_path(&mut self, tail: &str) {
        self.path.push_str(tail);
    }

    /// Appends a query pair.
    pub fn push_query(&mut self, name: &str, value: &str) {
        self.query.push((name.to_string(), value.to_string()));
    }

    /// Replaces any existing pairs under `name` with a single one.
    pub fn set_query(&mut self, name: &str, value: &str) {
        self.query.retain(|(existing, _)| existing != name);
        self.push_query(name, value);
    }

    /// First query value under `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Flags of this URL as response metadata.
    pub fn export_meta(&self) -> ExportMeta {
        ExportMeta {
            transcode: self.transcode,
            multibitrate: self.multibitrate,
            cache: self.cached,
            transcode_cache: self.transcode_cached,
        }
    }
}

impl fmt::Display for MyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.scheme,
            self.host,
            utf8_percent_encode(&self.path, PATH_ENCODE)
        )?;
        if !self.query.is_empty() {
            // Encode sorted by name so built URLs are byte-stable.
            let mut pairs = self.query.clone();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &pairs {
                serializer.append_pair(name, value);
            }
            write!(f, "?{}", serializer.finish())?;
        }
        Ok(())
    }
}

/// Builds per-export-type URLs toward the downstream services.
pub struct UrlBuilder {
    config: ExportConfig,
    subdomains: Arc<SubdomainSelector>,
    probe: Arc<CacheProbe>,
}

impl UrlBuilder {
    /// Creates a builder over the given selector and prober.
    pub fn new(
        config: ExportConfig,
        subdomains: Arc<SubdomainSelector>,
        probe: Arc<CacheProbe>,
    ) -> Self {
        Self {
            config,
            subdomains,
            probe,
        }
    }

    /// Builds the URL for one export type, or `None` when the type has
    /// nothing to offer for this item (non-srt subtitles, cached torrent
    /// stats, non-transcode media probes).
    ///
    /// # Errors
    /// - [`crate::Error::Domain`] for an unparseable configured domain
    /// - token and subdomain errors when subdomains are enabled
    /// - probe transport errors
    pub async fn build(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
        kind: ExportType,
    ) -> Result<Option<MyUrl>> {
        let mut url = MyUrl::default();
        self.build_scheme(&mut url)?;
        self.build_domain(&mut url, resource, params).await?;
        self.build_base(&mut url, resource, item, params).await?;
        match kind {
            ExportType::Download => {
                self.download_tail(&mut url, resource, item);
                Ok(Some(url))
            }
            ExportType::Stream => self.stream_tail(url, resource, item, "/index.m3u8").await,
            ExportType::TorrentStat => {
                if url.cached {
                    return Ok(None);
                }
                url.push_query("stats", "true");
                Ok(Some(url))
            }
            ExportType::Subtitles => {
                url.push_path(&format!(
                    "{SERVICE_SEPARATOR}{}/subtitles.json",
                    ServiceType::VideoInfo
                ));
                if let Some(imdb_id) = params.query("imdb-id") {
                    url.push_query("imdb-id", imdb_id);
                }
                Ok(Some(url))
            }
            ExportType::MediaProbe => {
                let built = self.stream_tail(url, resource, item, "/index.json").await?;
                Ok(built.filter(|url| url.transcode))
            }
        }
    }

    fn build_scheme(&self, url: &mut MyUrl) -> Result<()> {
        if self.config.domain.is_empty() {
            url.set_scheme("http");
            return Ok(());
        }
        let domain = Url::parse(&self.config.domain)?;
        url.set_scheme(domain.scheme());
        Ok(())
    }

    async fn build_domain(
        &self,
        url: &mut MyUrl,
        resource: &Resource,
        params: &dyn ParamSource,
    ) -> Result<()> {
        if self.config.domain.is_empty() {
            return Ok(());
        }
        let domain = Url::parse(&self.config.domain)?;
        let mut host = match (domain.host_str(), domain.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        if self.config.use_subdomains {
            let role = self.caller_role(params)?;
            let subdomains = self
                .subdomains
                .get(&resource.id, &self.config.subdomains_pool, &role)
                .await?;
            if let Some(first) = subdomains.first() {
                host = format!("{first}.{host}");
            }
        }
        url.set_host(host);
        Ok(())
    }

    async fn build_base(
        &self,
        url: &mut MyUrl,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<()> {
        url.set_path(format!(
            "{}{}/{}",
            self.config.path_prefix,
            resource.id,
            item.path_str.trim_matches('/')
        ));
        if let Some(api_key) = self.api_key(params) {
            url.push_query("api-key", &api_key);
        }
        let token = self.token(params)?;
        if !token.is_empty() {
            url.push_query("token", &token);
        }
        if let Some(user_id) = first_of(params, "user-id", "X-User-Id") {
            url.push_query("user-id", user_id);
        }
        if let Some(request_id) = first_of(params, "request-id", "X-Request-Id") {
            url.push_query("request-id", request_id);
        }
        url.cached = self.probe.get(url).await?;
        Ok(())
    }

    fn download_tail(&self, url: &mut MyUrl, resource: &Resource, item: &ListItem) {
        if item.kind == ListItemKind::Directory {
            let archive = format!("{}.zip", last_name(resource, item));
            url.push_path(&format!(
                "{SERVICE_SEPARATOR}{}/{archive}",
                ServiceType::Archive
            ));
        }
        url.push_query("download", "true");
    }

    async fn stream_tail(
        &self,
        mut url: MyUrl,
        resource: &Resource,
        item: &ListItem,
        suffix: &str,
    ) -> Result<Option<MyUrl>> {
        match item.media_format {
            Some(MediaFormat::Video) => {
                if should_transcode(&item.ext) {
                    self.transcode_tail(&mut url, suffix).await?;
                } else {
                    self.vod_tail(&mut url, resource, item, suffix);
                }
                Ok(Some(url))
            }
            Some(MediaFormat::Audio) => {
                if should_transcode(&item.ext) {
                    self.transcode_tail(&mut url, suffix).await?;
                }
                Ok(Some(url))
            }
            Some(MediaFormat::Subtitle) => {
                if item.ext != "srt" {
                    return Ok(None);
                }
                let last = last_name(resource, item);
                let converted = format!("{}vtt", last.strip_suffix("srt").unwrap_or(&last));
                url.push_path(&format!(
                    "{SERVICE_SEPARATOR}{}/{converted}",
                    ServiceType::Srt2Vtt
                ));
                Ok(Some(url))
            }
            // Images and unclassified media keep the base URL.
            _ => Ok(Some(url)),
        }
    }

    async fn transcode_tail(&self, url: &mut MyUrl, suffix: &str) -> Result<()> {
        url.push_path(&format!(
            "{SERVICE_SEPARATOR}{}{suffix}",
            ServiceType::Transcode
        ));
        url.transcode = true;
        url.transcode_cached = self.probe.get(url).await?;
        Ok(())
    }

    fn vod_tail(&self, url: &mut MyUrl, resource: &Resource, item: &ListItem, suffix: &str) {
        let rendition = sha1_hex(format!("{}{}", resource.id, item.id));
        url.push_path(&format!(
            "{SERVICE_SEPARATOR}{}/hls/{rendition}{suffix}",
            ServiceType::Vod
        ));
    }

    fn api_key(&self, params: &dyn ParamSource) -> Option<String> {
        if let Some(api_key) = first_of(params, "api-key", "X-Api-Key") {
            return Some(api_key.to_string());
        }
        if !self.config.api_key.is_empty() {
            return Some(self.config.api_key.clone());
        }
        None
    }

    fn token(&self, params: &dyn ParamSource) -> Result<String> {
        if let Some(token) = first_of(params, "token", "X-Token") {
            return Ok(token.to_string());
        }
        if !self.config.api_secret.is_empty() {
            return auth::mint_token(&self.config.api_secret, &self.config.api_role);
        }
        Ok(String::new())
    }

    fn caller_role(&self, params: &dyn ParamSource) -> Result<String> {
        let token = self.token(params)?;
        auth::token_role(&token, &self.config.api_secret)
    }
}

fn first_of<'a>(params: &'a dyn ParamSource, query: &str, header: &str) -> Option<&'a str> {
    params.query(query).or_else(|| params.header(header))
}

fn last_name(resource: &Resource, item: &ListItem) -> String {
    item.path
        .last()
        .cloned()
        .unwrap_or_else(|| resource.name.clone())
}
