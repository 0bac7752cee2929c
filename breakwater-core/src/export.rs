//! Export pipeline: one exporter per export type, fanned out per request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{ExportItem, ExportResponse, ListItem};
use crate::params::ParamSource;
use crate::resource::Resource;
use crate::tags::TagBuilder;
use crate::urls::UrlBuilder;

/// Wire names of the export types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Download,
    Stream,
    TorrentStat,
    Subtitles,
    MediaProbe,
}

impl ExportType {
    /// All export types, in response order.
    pub const ALL: [ExportType; 5] = [
        ExportType::Download,
        ExportType::Stream,
        ExportType::TorrentStat,
        ExportType::Subtitles,
        ExportType::MediaProbe,
    ];

    /// Wire name used in the `types` parameter and response keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportType::Download => "download",
            ExportType::Stream => "stream",
            ExportType::TorrentStat => "torrent_client_stat",
            ExportType::Subtitles => "subtitles",
            ExportType::MediaProbe => "media_probe",
        }
    }
}

/// Parsed arguments of the export endpoint.
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub types: Vec<ExportType>,
}

impl ExportArgs {
    /// Parses the comma-separated `types` parameter; absent means all.
    ///
    /// # Errors
    /// - [`Error::ExportTypeParse`] for unknown type names
    pub fn from_params(params: &dyn ParamSource) -> Result<Self> {
        let types = match params.query("types") {
            None => ExportType::ALL.to_vec(),
            Some(raw) => {
                let mut types = Vec::new();
                for name in raw.split(',') {
                    let name = name.trim();
                    let kind = ExportType::ALL
                        .into_iter()
                        .find(|kind| kind.as_str() == name)
                        .ok_or_else(|| Error::ExportTypeParse {
                            kind: name.to_string(),
                        })?;
                    types.push(kind);
                }
                types
            }
        };
        Ok(Self { types })
    }
}

/// One export-type handler.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// The export type this handler produces.
    fn kind(&self) -> ExportType;

    /// Builds the export item, or `None` when this type has nothing to
    /// offer for the item (legal suppression, not an error).
    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>>;
}

/// Registry fanning a request out over its requested export types.
pub struct Export {
    exporters: Vec<Box<dyn Exporter>>,
}

impl Export {
    /// Creates a registry from explicit exporters.
    pub fn new(exporters: Vec<Box<dyn Exporter>>) -> Self {
        Self { exporters }
    }

    /// Creates the standard exporter set. The subtitles exporter is only
    /// registered when the video-info service is configured.
    pub fn standard(
        urls: Arc<UrlBuilder>,
        tags: Arc<TagBuilder>,
        video_info_configured: bool,
    ) -> Self {
        let mut exporters: Vec<Box<dyn Exporter>> = vec![
            Box::new(DownloadExporter { urls: urls.clone() }),
            Box::new(StreamExporter {
                urls: urls.clone(),
                tags,
            }),
            Box::new(TorrentStatExporter { urls: urls.clone() }),
            Box::new(MediaProbeExporter { urls: urls.clone() }),
        ];
        if video_info_configured {
            exporters.push(Box::new(SubtitlesExporter { urls }));
        }
        Self::new(exporters)
    }

    /// Runs the requested exporters for `item` and collects their output.
    /// Exporters returning `None` are omitted from the response.
    ///
    /// # Errors
    /// Propagates the first exporter failure.
    pub async fn get(
        &self,
        resource: &Resource,
        item: &ListItem,
        args: &ExportArgs,
        params: &dyn ParamSource,
    ) -> Result<ExportResponse> {
        let mut exports = HashMap::new();
        for kind in &args.types {
            for exporter in &self.exporters {
                if exporter.kind() != *kind {
                    continue;
                }
                if let Some(output) = exporter.export(resource, item, params).await? {
                    exports.insert(kind.as_str().to_string(), output);
                }
            }
        }
        Ok(ExportResponse {
            source: item.clone(),
            exports,
        })
    }
}

struct DownloadExporter {
    urls: Arc<UrlBuilder>,
}

#[async_trait]
impl Exporter for DownloadExporter {
    fn kind(&self) -> ExportType {
        ExportType::Download
    }

    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>> {
        let Some(url) = self
            .urls
            .build(resource, item, params, self.kind())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(ExportItem {
            tag: None,
            meta: Some(url.export_meta()),
            url: url.to_string(),
        }))
    }
}

struct StreamExporter {
    urls: Arc<UrlBuilder>,
    tags: Arc<TagBuilder>,
}

#[async_trait]
impl Exporter for StreamExporter {
    fn kind(&self) -> ExportType {
        ExportType::Stream
    }

    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>> {
        if item.media_format.is_none() {
            return Ok(None);
        }
        let Some(url) = self
            .urls
            .build(resource, item, params, self.kind())
            .await?
        else {
            return Ok(None);
        };
        let tag = self.tags.build(resource, item, params).await?;
        Ok(Some(ExportItem {
            tag,
            meta: Some(url.export_meta()),
            url: url.to_string(),
        }))
    }
}

struct TorrentStatExporter {
    urls: Arc<UrlBuilder>,
}

#[async_trait]
impl Exporter for TorrentStatExporter {
    fn kind(&self) -> ExportType {
        ExportType::TorrentStat
    }

    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>> {
        let Some(url) = self
            .urls
            .build(resource, item, params, self.kind())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(ExportItem {
            tag: None,
            meta: None,
            url: url.to_string(),
        }))
    }
}

struct SubtitlesExporter {
    urls: Arc<UrlBuilder>,
}

#[async_trait]
impl Exporter for SubtitlesExporter {
    fn kind(&self) -> ExportType {
        ExportType::Subtitles
    }

    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>> {
        if item.media_format != Some(crate::media::MediaFormat::Video) {
            return Ok(None);
        }
        let Some(url) = self
            .urls
            .build(resource, item, params, self.kind())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(ExportItem {
            tag: None,
            meta: None,
            url: url.to_string(),
        }))
    }
}

struct MediaProbeExporter {
    urls: Arc<UrlBuilder>,
}

#[async_trait]
impl Exporter for MediaProbeExporter {
    fn kind(&self) -> ExportType {
        ExportType::MediaProbe
    }

    async fn export(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportItem>> {
        let Some(url) = self
            .urls
            .build(resource, item, params, self.kind())
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(ExportItem {
            tag: None,
            meta: None,
            url: url.to_string(),
        }))
    }
}
