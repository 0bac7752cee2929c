//! Media classification by file extension.

use serde::Serialize;

/// Coarse media category derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Video,
    Audio,
    Image,
    Subtitle,
    Unknown,
}

const VIDEO_EXT: &[&str] = &["avi", "mkv", "mp4", "webm", "m4v", "ts", "vob"];
const AUDIO_EXT: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];
const IMAGE_EXT: &[&str] = &["png", "gif", "jpg", "jpeg"];
const SUBTITLE_EXT: &[&str] = &["srt", "vtt"];

/// Extensions incompatible with raw streaming, routed to the transcoder.
const TRANSCODE_EXT: &[&str] = &["avi", "mkv", "m4v", "ts", "vob", "flac", "m4a"];

/// Classifies a lowercased extension.
pub fn media_format_by_ext(ext: &str) -> MediaFormat {
    if VIDEO_EXT.contains(&ext) {
        MediaFormat::Video
    } else if AUDIO_EXT.contains(&ext) {
        MediaFormat::Audio
    } else if IMAGE_EXT.contains(&ext) {
        MediaFormat::Image
    } else if SUBTITLE_EXT.contains(&ext) {
        MediaFormat::Subtitle
    } else {
        MediaFormat::Unknown
    }
}

/// True when files with this extension must go through the HLS transcoder.
pub fn should_transcode(ext: &str) -> bool {
    TRANSCODE_EXT.contains(&ext)
}

/// MIME type for an extension, when one is registered.
pub fn mime_type_by_ext(ext: &str) -> Option<String> {
    mime_guess::from_ext(ext)
        .first_raw()
        .map(|mime| mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_format_by_ext() {
        assert_eq!(media_format_by_ext("mp4"), MediaFormat::Video);
        assert_eq!(media_format_by_ext("flac"), MediaFormat::Audio);
        assert_eq!(media_format_by_ext("jpeg"), MediaFormat::Image);
        assert_eq!(media_format_by_ext("srt"), MediaFormat::Subtitle);
        assert_eq!(media_format_by_ext("exe"), MediaFormat::Unknown);
    }

    #[test]
    fn test_transcode_set() {
        for ext in ["avi", "mkv", "m4v", "ts", "vob", "flac", "m4a"] {
            assert!(should_transcode(ext), "{ext} should be transcoded");
        }
        assert!(!should_transcode("mp4"));
        assert!(!should_transcode("mp3"));
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_type_by_ext("mp4").as_deref(), Some("video/mp4"));
        assert_eq!(mime_type_by_ext("mp3").as_deref(), Some("audio/mpeg"));
    }
}
