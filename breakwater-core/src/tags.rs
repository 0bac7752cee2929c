//! HTML-tag descriptors for streamable items.
//!
//! Video tags enumerate same-directory siblings to attach subtitle tracks
//! and a poster image; audio and image items get bare tags.

use std::sync::Arc;

use crate::error::Result;
use crate::export::ExportType;
use crate::listing::{List, ListArgs};
use crate::media::{mime_type_by_ext, MediaFormat};
use crate::models::{
    ExportPreload, ExportSource, ExportTag, ExportTagName, ExportTrack, ListItem,
    EXPORT_KIND_SUBTITLES,
};
use crate::params::ParamSource;
use crate::resource::Resource;
use crate::urls::{MyUrl, UrlBuilder};

/// Builds tag descriptors from stream URLs and sibling listings.
pub struct TagBuilder {
    urls: Arc<UrlBuilder>,
    list: List,
}

impl TagBuilder {
    /// Creates a tag builder over the given URL builder.
    pub fn new(urls: Arc<UrlBuilder>, list: List) -> Self {
        Self { urls, list }
    }

    /// Builds a tag for a video, audio or image item; `None` otherwise.
    ///
    /// # Errors
    /// Propagates URL building failures.
    pub async fn build(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportTag>> {
        match item.media_format {
            Some(MediaFormat::Video) => self.video_tag(resource, item, params).await,
            Some(MediaFormat::Audio) => {
                self.av_tag(resource, item, params, ExportTagName::Audio)
                    .await
            }
            Some(MediaFormat::Image) => self.image_tag(resource, item, params).await,
            _ => Ok(None),
        }
    }

    async fn stream_url(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<MyUrl>> {
        self.urls
            .build(resource, item, params, ExportType::Stream)
            .await
    }

    async fn av_tag(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
        name: ExportTagName,
    ) -> Result<Option<ExportTag>> {
        let Some(url) = self.stream_url(resource, item, params).await? else {
            return Ok(None);
        };
        let preload = if url.cached {
            ExportPreload::Auto
        } else {
            ExportPreload::None
        };
        Ok(Some(ExportTag {
            name,
            preload: Some(preload),
            sources: vec![build_source(&url)],
            tracks: Vec::new(),
            src: String::new(),
            alt: String::new(),
            poster: String::new(),
        }))
    }

    async fn video_tag(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportTag>> {
        let Some(mut tag) = self
            .av_tag(resource, item, params, ExportTagName::Video)
            .await?
        else {
            return Ok(None);
        };
        let parent = ListArgs {
            path: item.path[..item.path.len().saturating_sub(1)].to_vec(),
            ..ListArgs::default()
        };
        let listing = self.list.get(resource, &parent);
        let stem = video_stem(item);
        let mut tracks = Vec::new();
        for sibling in &listing.items {
            if !same_directory(sibling, item) {
                continue;
            }
            if sibling.media_format == Some(MediaFormat::Subtitle)
                && sibling.name.starts_with(&stem)
            {
                if let Some(track) = self.subtitle_track(resource, sibling, params).await? {
                    tracks.push(track);
                }
            }
            if sibling.media_format == Some(MediaFormat::Image) && tag.poster.is_empty() {
                if let Some(url) = self.stream_url(resource, sibling, params).await? {
                    tag.poster = url.to_string();
                }
            }
        }
        tag.tracks = tracks;
        Ok(Some(tag))
    }

    async fn subtitle_track(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportTrack>> {
        let Some(url) = self.stream_url(resource, item, params).await? else {
            return Ok(None);
        };
        let (srclang, label) = track_language(&item.name);
        Ok(Some(ExportTrack {
            src: url.to_string(),
            kind: EXPORT_KIND_SUBTITLES,
            srclang,
            label,
        }))
    }

    async fn image_tag(
        &self,
        resource: &Resource,
        item: &ListItem,
        params: &dyn ParamSource,
    ) -> Result<Option<ExportTag>> {
        let Some(url) = self.stream_url(resource, item, params).await? else {
            return Ok(None);
        };
        Ok(Some(ExportTag {
            name: ExportTagName::Image,
            preload: None,
            sources: Vec::new(),
            tracks: Vec::new(),
            src: url.to_string(),
            alt: item.name.clone(),
            poster: String::new(),
        }))
    }
}

fn build_source(url: &MyUrl) -> ExportSource {
    let kind = if url.path().ends_with("index.m3u8") {
        "application/vnd.apple.mpegurl".to_string()
    } else {
        let ext = url
            .path()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        mime_type_by_ext(ext).unwrap_or_default()
    };
    ExportSource {
        src: url.to_string(),
        kind,
    }
}

fn video_stem(item: &ListItem) -> String {
    if item.ext.is_empty() {
        return item.name.clone();
    }
    item.name
        .strip_suffix(&format!(".{}", item.ext))
        .unwrap_or(&item.name)
        .to_string()
}

/// Parent directories match up to the depth of the shorter path.
fn same_directory(a: &ListItem, b: &ListItem) -> bool {
    let depth = a
        .path
        .len()
        .saturating_sub(1)
        .min(b.path.len().saturating_sub(1));
    a.path[..depth] == b.path[..depth]
}

/// Language tag from the penultimate extension: `foo.en.srt` -> ("en",
/// "English").
fn track_language(name: &str) -> (String, String) {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    let Some((_, code)) = stem.rsplit_once('.') else {
        return (String::new(), String::new());
    };
    let code = code.to_ascii_lowercase();
    let language =
        isolang::Language::from_639_1(&code).or_else(|| isolang::Language::from_639_3(&code));
    match language {
        Some(language) => (
            language
                .to_639_1()
                .map(str::to_string)
                .unwrap_or_else(|| code.clone()),
            language.to_name().to_string(),
        ),
        None => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterClient;
    use crate::config::{ClusterConfig, ExportConfig, ProbeConfig};
    use crate::listing::List;
    use crate::nodes::NodeInventory;
    use crate::params::RequestParams;
    use crate::probe::CacheProbe;
    use crate::resource::test_data::sample_torrent;
    use crate::resource::parse;
    use crate::subdomains::SubdomainSelector;

    fn tag_builder() -> TagBuilder {
        let inventory = Arc::new(NodeInventory::new(
            Arc::new(ClusterClient::new(ClusterConfig::default())),
            "webtor.io/".to_string(),
        ));
        let urls = Arc::new(UrlBuilder::new(
            ExportConfig::default(),
            Arc::new(SubdomainSelector::new(inventory)),
            Arc::new(CacheProbe::new(ProbeConfig::default())),
        ));
        TagBuilder::new(urls, List)
    }

    fn item(name: &str) -> ListItem {
        let resource = parse(&sample_torrent().bytes).unwrap();
        let listing = List.get(&resource, &ListArgs::default());
        listing
            .items
            .iter()
            .find(|item| item.name == name)
            .cloned()
            .unwrap()
    }

    fn resource() -> Resource {
        parse(&sample_torrent().bytes).unwrap()
    }

    #[tokio::test]
    async fn test_video_tag_attaches_tracks_and_poster() {
        let tags = tag_builder();
        let tag = tags
            .build(&resource(), &item("video.mp4"), &RequestParams::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(tag.name, ExportTagName::Video);
        assert_eq!(tag.preload, Some(ExportPreload::None));
        assert_eq!(tag.sources.len(), 1);
        assert_eq!(tag.sources[0].kind, "application/vnd.apple.mpegurl");
        assert!(tag.sources[0].src.contains("~vod/hls/"));

        assert_eq!(tag.tracks.len(), 1);
        assert_eq!(tag.tracks[0].srclang, "en");
        assert_eq!(tag.tracks[0].label, "English");
        assert_eq!(tag.tracks[0].kind, EXPORT_KIND_SUBTITLES);
        assert!(tag.tracks[0].src.ends_with("~vtt/video.en.vtt"));

        assert!(tag.poster.ends_with("/Voyage/poster.jpg"));
    }

    #[tokio::test]
    async fn test_audio_tag_uses_mime_type() {
        let tags = tag_builder();
        let mut audio = item("video.mp4");
        audio.name = "track.mp3".to_string();
        audio.ext = "mp3".to_string();
        audio.media_format = Some(MediaFormat::Audio);
        audio.path_str = "/Voyage/track.mp3".to_string();
        audio.path = vec!["Voyage".to_string(), "track.mp3".to_string()];

        let tag = tags
            .build(&resource(), &audio, &RequestParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tag.name, ExportTagName::Audio);
        assert_eq!(tag.sources[0].kind, "audio/mpeg");
        assert!(tag.tracks.is_empty());
    }

    #[tokio::test]
    async fn test_image_tag_sets_src_and_alt() {
        let tags = tag_builder();
        let tag = tags
            .build(&resource(), &item("poster.jpg"), &RequestParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tag.name, ExportTagName::Image);
        assert_eq!(tag.alt, "poster.jpg");
        assert!(tag.src.ends_with("/Voyage/poster.jpg"));
        assert!(tag.sources.is_empty());
    }

    #[tokio::test]
    async fn test_subtitle_item_has_no_tag() {
        let tags = tag_builder();
        let tag = tags
            .build(&resource(), &item("video.en.srt"), &RequestParams::default())
            .await
            .unwrap();
        assert!(tag.is_none());
    }

    #[test]
    fn test_track_language_parsing() {
        assert_eq!(
            track_language("video.en.srt"),
            ("en".to_string(), "English".to_string())
        );
        assert_eq!(
            track_language("video.de.srt"),
            ("de".to_string(), "German".to_string())
        );
        assert_eq!(track_language("video.srt"), (String::new(), String::new()));
        assert_eq!(
            track_language("video.zz.srt"),
            (String::new(), String::new())
        );
    }

    #[test]
    fn test_same_directory_depth_is_bounded_by_shorter_path() {
        let a = item("video.mp4");
        let b = item("Voyage.en.srt");
        assert!(same_directory(&a, &b));
    }
}
