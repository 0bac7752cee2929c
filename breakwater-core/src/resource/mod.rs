//! Resource model and input parsing.
//!
//! A resource is the canonical in-memory form of whatever a client POSTs:
//! a bare 40-hex info-hash, a magnet URI, or full bencoded torrent bytes.

pub(crate) mod bencode;
mod magnet;
pub mod resolve;
#[cfg(test)]
pub(crate) mod test_data;

use sha1::{Digest, Sha1};

use crate::error::Result;

/// Length of a SHA-1 digest in bytes.
pub const HASH_SIZE: usize = 20;

/// SHA-1 of one torrent piece.
pub type PieceHash = [u8; HASH_SIZE];

/// The representation a resource was materialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceKind {
    /// An opaque hash of unknown provenance.
    #[default]
    Hash,
    /// A magnet URI awaiting resolution.
    Magnet,
    /// Full torrent bytes.
    Torrent,
    /// A bare 40-hex SHA-1 info-hash.
    Sha1,
}

/// A single file inside a resource. The first path segment is always the
/// resource name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFile {
    pub path: Vec<String>,
    pub size: i64,
    /// Piece hashes covering this file's byte range, end-inclusive.
    pub pieces: Vec<PieceHash>,
}

/// Canonical in-memory form of a client input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    /// 40-hex lowercase info-hash; always set.
    pub id: String,
    /// Torrent info name; empty for pre-resolution magnets and hashes.
    pub name: String,
    /// `piece_length * num_pieces`; zero before resolution.
    pub size: i64,
    pub kind: ResourceKind,
    /// Canonical magnet URI for resolved torrents.
    pub magnet_uri: String,
    /// Original bencoded bytes, preserved verbatim for re-serving.
    pub torrent: Vec<u8>,
    pub files: Vec<ResourceFile>,
}

/// Parses raw client input into a shallow [`Resource`].
///
/// Disambiguation order: 40-hex SHA-1, then `magnet:` URI, then bencoded
/// torrent.
///
/// # Errors
/// - [`crate::Error::MagnetParse`] for malformed magnet URIs
/// - [`crate::Error::TorrentParse`] for anything else that is not a torrent
pub fn parse(input: &[u8]) -> Result<Resource> {
    if is_sha1_hex(input) {
        let id = String::from_utf8_lossy(input).to_ascii_lowercase();
        return Ok(Resource {
            id,
            kind: ResourceKind::Sha1,
            ..Resource::default()
        });
    }
    if input.starts_with(b"magnet:") {
        return magnet::parse_magnet(input);
    }
    bencode::parse_torrent(input)
}

/// True when `input` is exactly 40 hex digits.
pub fn is_sha1_hex(input: &[u8]) -> bool {
    input.len() == HASH_SIZE * 2 && input.iter().all(u8::is_ascii_hexdigit)
}

/// Lowercase hex SHA-1 of `data`.
pub(crate) fn sha1_hex(data: impl AsRef<[u8]>) -> String {
    let digest = Sha1::digest(data.as_ref());
    let mut out = String::with_capacity(HASH_SIZE * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
