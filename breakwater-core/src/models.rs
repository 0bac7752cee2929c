//! JSON response models for the HTTP surface.

use std::collections::HashMap;

use serde::Serialize;

use crate::media::MediaFormat;

/// Response body for resource creation and lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub magnet_uri: String,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Whether a list entry is a file or a rolled-up directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListItemKind {
    File,
    Directory,
}

/// One entry of a listing; derived from resource files, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    /// `hex(sha1("/" + joined path))`, the stable content id.
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "path")]
    pub path_str: String,
    #[serde(skip)]
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ListItemKind,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_format: Option<MediaFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ext: String,
}

/// A listing of one path prefix: the prefix itself plus its entries.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    #[serde(flatten)]
    pub item: ListItem,
    pub items: Vec<ListItem>,
    #[serde(rename = "items_count")]
    pub count: usize,
}

/// `<source>` descriptor of a media tag.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSource {
    pub src: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

/// Subtitle `<track>` descriptor attached to a video tag.
#[derive(Debug, Clone, Serialize)]
pub struct ExportTrack {
    pub src: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub srclang: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
}

/// Track kind for subtitle tracks.
pub const EXPORT_KIND_SUBTITLES: &str = "subtitles";

/// Tag element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportTagName {
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "img")]
    Image,
}

/// Preload hint derived from cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportPreload {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "none")]
    None,
}

/// HTML-tag descriptor consumable by clients; not markup.
#[derive(Debug, Clone, Serialize)]
pub struct ExportTag {
    #[serde(rename = "tag")]
    pub name: ExportTagName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload: Option<ExportPreload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ExportSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<ExportTrack>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub src: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub alt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub poster: String,
}

/// Flags describing how a built URL will behave downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportMeta {
    #[serde(skip_serializing_if = "is_false")]
    pub transcode: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub multibitrate: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cache: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub transcode_cache: bool,
}

/// One export entry of the response.
#[derive(Debug, Clone, Serialize)]
pub struct ExportItem {
    #[serde(rename = "html_tag", skip_serializing_if = "Option::is_none")]
    pub tag: Option<ExportTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ExportMeta>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// Response body of the export endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub source: ListItem,
    pub exports: HashMap<String, ExportItem>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
