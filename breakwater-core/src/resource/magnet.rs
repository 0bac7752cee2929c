//! Magnet URI parsing.

use super::{is_sha1_hex, Resource, ResourceKind};
use crate::error::{Error, Result};

/// Extracts the btih info-hash from a magnet URI into a shallow
/// [`Resource`].
pub(crate) fn parse_magnet(input: &[u8]) -> Result<Resource> {
    let text = std::str::from_utf8(input).map_err(|_| Error::MagnetParse {
        reason: "magnet uri is not valid utf-8".to_string(),
    })?;
    let uri = url::Url::parse(text).map_err(|e| Error::MagnetParse {
        reason: e.to_string(),
    })?;
    let mut id = None;
    for (key, value) in uri.query_pairs() {
        if key != "xt" {
            continue;
        }
        if let Some(hash) = value.strip_prefix("urn:btih:") {
            if is_sha1_hex(hash.as_bytes()) {
                id = Some(hash.to_ascii_lowercase());
                break;
            }
        }
    }
    let id = id.ok_or_else(|| Error::MagnetParse {
        reason: "missing or invalid btih info hash".to_string(),
    })?;
    Ok(Resource {
        id,
        kind: ResourceKind::Magnet,
        ..Resource::default()
    })
}
