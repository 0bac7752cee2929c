//! Bencoded torrent parsing and info-hash calculation.

use std::collections::HashMap;

use serde_bencode::value::Value;

use super::{sha1_hex, PieceHash, Resource, ResourceFile, ResourceKind, HASH_SIZE};
use crate::error::{Error, Result};

type Dict = HashMap<Vec<u8>, Value>;

/// Parses bencoded torrent bytes into a full [`Resource`].
///
/// # Errors
/// - [`Error::TorrentParse`] on malformed bencode or schema violations
pub(crate) fn parse_torrent(input: &[u8]) -> Result<Resource> {
    let root = serde_bencode::from_bytes::<Value>(input).map_err(|e| Error::TorrentParse {
        reason: e.to_string(),
    })?;
    let Value::Dict(root) = root else {
        return Err(parse_error("root element must be a dictionary"));
    };
    let Some(Value::Dict(info)) = root.get(b"info".as_slice()) else {
        return Err(parse_error("missing 'info' dictionary"));
    };

    let id = info_hash_hex(input)?;
    let name = utf8(
        bytes_field(info, b"name.utf-8")
            .or_else(|| bytes_field(info, b"name"))
            .ok_or_else(|| parse_error("missing 'name' field"))?,
        "name",
    )?;
    let piece_length = int_field(info, b"piece length")
        .ok_or_else(|| parse_error("missing 'piece length' field"))?;
    if piece_length <= 0 {
        return Err(parse_error("invalid piece length"));
    }
    let pieces = piece_hashes(info)?;

    let mut files = Vec::new();
    let mut offset: i64 = 0;
    for (rel_path, length) in raw_files(info)? {
        let start = (offset / piece_length) as usize;
        let end = ((offset + length) / piece_length) as usize;
        let mut path = Vec::with_capacity(rel_path.len() + 1);
        path.push(name.clone());
        path.extend(rel_path);
        files.push(ResourceFile {
            path,
            size: length,
            pieces: slice_pieces(&pieces, start, end),
        });
        offset += length;
    }

    let magnet_uri = canonical_magnet_uri(&id, &name, &announce_urls(&root));

    Ok(Resource {
        id,
        name,
        size: piece_length * pieces.len() as i64,
        kind: ResourceKind::Torrent,
        magnet_uri,
        torrent: input.to_vec(),
        files,
    })
}

fn parse_error(reason: &str) -> Error {
    Error::TorrentParse {
        reason: reason.to_string(),
    }
}

fn bytes_field<'a>(dict: &'a Dict, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Some(Value::Bytes(bytes)) => Some(bytes),
        _ => None,
    }
}

fn int_field(dict: &Dict, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Some(Value::Int(value)) => Some(*value),
        _ => None,
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| parse_error(&format!("invalid utf-8 in '{what}'")))
}

fn piece_hashes(info: &Dict) -> Result<Vec<PieceHash>> {
    let bytes = bytes_field(info, b"pieces").ok_or_else(|| parse_error("missing 'pieces' field"))?;
    if bytes.len() % HASH_SIZE != 0 {
        return Err(parse_error("invalid pieces length"));
    }
    Ok(bytes
        .chunks(HASH_SIZE)
        .map(|chunk| {
            let mut hash = [0u8; HASH_SIZE];
            hash.copy_from_slice(chunk);
            hash
        })
        .collect())
}

/// Files as (relative path, length), with single-file torrents coerced to a
/// one-entry list whose relative path is empty.
fn raw_files(info: &Dict) -> Result<Vec<(Vec<String>, i64)>> {
    if let Some(length) = int_field(info, b"length") {
        return Ok(vec![(Vec::new(), length)]);
    }
    let Some(Value::List(entries)) = info.get(b"files".as_slice()) else {
        return Err(parse_error("missing 'files' or 'length' field"));
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::Dict(file) = entry else {
            return Err(parse_error("invalid file entry type"));
        };
        let length =
            int_field(file, b"length").ok_or_else(|| parse_error("missing file length"))?;
        let path_value = file
            .get(b"path.utf-8".as_slice())
            .or_else(|| file.get(b"path".as_slice()));
        let Some(Value::List(segments)) = path_value else {
            return Err(parse_error("missing or invalid path in file"));
        };
        let mut path = Vec::with_capacity(segments.len());
        for segment in segments {
            let Value::Bytes(segment) = segment else {
                return Err(parse_error("invalid path component type"));
            };
            path.push(utf8(segment, "file path")?);
        }
        out.push((path, length));
    }
    Ok(out)
}

fn slice_pieces(pieces: &[PieceHash], start: usize, end: usize) -> Vec<PieceHash> {
    if pieces.is_empty() || start >= pieces.len() {
        return Vec::new();
    }
    let end = end.min(pieces.len() - 1);
    pieces[start..=end].to_vec()
}

fn announce_urls(root: &Dict) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(bytes) = bytes_field(root, b"announce") {
        if let Ok(url) = String::from_utf8(bytes.to_vec()) {
            urls.push(url);
        }
    }
    if let Some(Value::List(tiers)) = root.get(b"announce-list".as_slice()) {
        for tier in tiers {
            if let Value::List(tier) = tier {
                for entry in tier {
                    if let Value::Bytes(bytes) = entry {
                        if let Ok(url) = String::from_utf8(bytes.to_vec()) {
                            if !urls.contains(&url) {
                                urls.push(url);
                            }
                        }
                    }
                }
            }
        }
    }
    urls
}

fn canonical_magnet_uri(id: &str, name: &str, trackers: &[String]) -> String {
    let mut uri = format!("magnet:?xt=urn:btih:{id}");
    if !name.is_empty() {
        uri.push_str("&dn=");
        uri.extend(url::form_urlencoded::byte_serialize(name.as_bytes()));
    }
    for tracker in trackers {
        uri.push_str("&tr=");
        uri.extend(url::form_urlencoded::byte_serialize(tracker.as_bytes()));
    }
    uri
}

/// SHA-1 over the raw bencoded info dictionary, sliced out of the original
/// bytes so unknown info keys keep contributing to the hash.
fn info_hash_hex(input: &[u8]) -> Result<String> {
    let marker = b"4:info";
    let start = input
        .windows(marker.len())
        .position(|window| window == marker)
        .ok_or_else(|| parse_error("could not locate info dictionary"))?;
    let dict_start = start + marker.len();
    let dict_len = dict_end(&input[dict_start..])?;
    Ok(sha1_hex(&input[dict_start..dict_start + dict_len]))
}

/// Length of the bencoded dictionary at the start of `data`.
fn dict_end(data: &[u8]) -> Result<usize> {
    if data.is_empty() || data[0] != b'd' {
        return Err(parse_error("expected dictionary start"));
    }
    let mut pos = 1;
    let mut depth = 1;
    while pos < data.len() && depth > 0 {
        match data[pos] {
            b'd' | b'l' => {
                depth += 1;
                pos += 1;
            }
            b'e' => {
                depth -= 1;
                pos += 1;
            }
            b'i' => {
                pos += 1;
                while pos < data.len() && data[pos] != b'e' {
                    pos += 1;
                }
                if pos < data.len() {
                    pos += 1;
                }
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < data.len() && data[pos] != b':' {
                    pos += 1;
                }
                if pos >= data.len() {
                    return Err(parse_error("invalid string format"));
                }
                let length: usize = std::str::from_utf8(&data[start..pos])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| parse_error("invalid string length"))?;
                pos += 1 + length;
            }
            _ => return Err(parse_error("invalid bencode character")),
        }
    }
    if depth != 0 {
        return Err(parse_error("incomplete bencode dictionary"));
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::super::test_data::{benc_dict, benc_int, benc_str, sample_torrent};
    use super::*;

    #[test]
    fn test_info_hash_matches_direct_digest() {
        let sample = sample_torrent();
        assert_eq!(info_hash_hex(&sample.bytes).unwrap(), sample.info_hash);
    }

    #[test]
    fn test_dict_end_skips_nested_structures() {
        let inner = benc_dict(&[("a", benc_int(1)), ("b", benc_str("x"))]);
        let outer = benc_dict(&[("k", inner)]);
        assert_eq!(dict_end(&outer).unwrap(), outer.len());
    }

    #[test]
    fn test_dict_end_rejects_truncation() {
        let dict = benc_dict(&[("a", benc_int(1))]);
        let err = dict_end(&dict[..dict.len() - 1]).unwrap_err();
        assert!(err.to_string().contains("failed to parse torrent"));
    }

    #[test]
    fn test_missing_info_dictionary() {
        let root = benc_dict(&[("announce", benc_str("udp://t"))]);
        let err = parse_torrent(&root).unwrap_err();
        assert!(err.to_string().contains("info"));
    }

    #[test]
    fn test_canonical_magnet_escapes_components() {
        let uri = canonical_magnet_uri(
            "08ada5a7a6183aae1e09d831df6748d566095a10",
            "Big Sky",
            &["udp://tracker.example.com:1337/announce".to_string()],
        );
        assert!(uri.starts_with("magnet:?xt=urn:btih:08ada5a7a6183aae1e09d831df6748d566095a10"));
        assert!(uri.contains("&dn=Big+Sky"));
        assert!(uri.contains("&tr=udp%3A%2F%2Ftracker.example.com%3A1337%2Fannounce"));
    }
}
