//! Synthetic bencode fixtures shared by parser, listing and export tests.

use super::sha1_hex;

pub(crate) const SINTEL_MAGNET: &str =
    "magnet:?xt=urn:btih:08ada5a7a6183aae1e09d831df6748d566095a10&dn=Sintel";

pub(crate) fn benc_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{}:", data.len()).into_bytes();
    out.extend_from_slice(data);
    out
}

pub(crate) fn benc_str(s: &str) -> Vec<u8> {
    benc_bytes(s.as_bytes())
}

pub(crate) fn benc_int(value: i64) -> Vec<u8> {
    format!("i{value}e").into_bytes()
}

pub(crate) fn benc_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![b'l'];
    for item in items {
        out.extend_from_slice(item);
    }
    out.push(b'e');
    out
}

/// Keys must already be sorted, as bencode requires.
pub(crate) fn benc_dict(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![b'd'];
    for (key, value) in entries {
        out.extend_from_slice(&benc_str(key));
        out.extend_from_slice(value);
    }
    out.push(b'e');
    out
}

pub(crate) struct SampleTorrent {
    pub bytes: Vec<u8>,
    pub info_hash: String,
}

fn file_entry(length: i64, path: &[&str]) -> Vec<u8> {
    let segments: Vec<Vec<u8>> = path.iter().map(|s| benc_str(s)).collect();
    benc_dict(&[("length", benc_int(length)), ("path", benc_list(&segments))])
}

/// Multi-file torrent "Voyage": two videos, two subtitles, one poster.
/// 16 KiB pieces, five pieces total.
pub(crate) fn sample_torrent() -> SampleTorrent {
    let pieces: Vec<u8> = (0..100).map(|i| i as u8).collect();
    let info = benc_dict(&[
        (
            "files",
            benc_list(&[
                file_entry(40000, &["video.mp4"]),
                file_entry(20000, &["video.mkv"]),
                file_entry(1652, &["video.en.srt"]),
                file_entry(1652, &["Sub", "Voyage.en.srt"]),
                file_entry(4096, &["poster.jpg"]),
            ]),
        ),
        ("name", benc_str("Voyage")),
        ("piece length", benc_int(16384)),
        ("pieces", benc_bytes(&pieces)),
    ]);
    let info_hash = sha1_hex(&info);
    let bytes = benc_dict(&[
        ("announce", benc_str("udp://tracker.example.com:1337/announce")),
        ("info", info),
    ]);
    SampleTorrent { bytes, info_hash }
}

/// Single-file torrent exercising the upvert path.
pub(crate) fn single_file_torrent() -> Vec<u8> {
    let pieces: Vec<u8> = (0..40).map(|i| i as u8).collect();
    let info = benc_dict(&[
        ("length", benc_int(30000)),
        ("name", benc_str("solo.mp4")),
        ("piece length", benc_int(16384)),
        ("pieces", benc_bytes(&pieces)),
    ]);
    benc_dict(&[("announce", benc_str("udp://t.example:6969")), ("info", info)])
}

/// Torrent whose info carries both `name` and a `name.utf-8` variant.
pub(crate) fn utf8_name_torrent() -> Vec<u8> {
    let pieces: Vec<u8> = (0..20).map(|i| i as u8).collect();
    let info = benc_dict(&[
        ("length", benc_int(1000)),
        ("name", benc_str("Reve")),
        ("name.utf-8", benc_str("R\u{ea}ve")),
        ("piece length", benc_int(16384)),
        ("pieces", benc_bytes(&pieces)),
    ]);
    benc_dict(&[("announce", benc_str("udp://t.example:6969")), ("info", info)])
}
