//! Gateway error type.
//!
//! Display strings are part of the HTTP contract: the web layer classifies
//! errors into status codes by message substring ("failed to parse" -> 400,
//! "forbidden" -> 403, "not found" -> 404, "timeout" -> 408), so variants
//! render the exact messages the gateway has always produced.

use std::sync::Arc;

/// Errors produced by any gateway subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse magnet: {reason}")]
    MagnetParse { reason: String },

    #[error("failed to parse torrent: {reason}")]
    TorrentParse { reason: String },

    #[error("failed to parse {what}, should be {requirement}")]
    QueryParse {
        what: &'static str,
        requirement: &'static str,
    },

    #[error("failed to parse content id {id}")]
    ContentIdParse { id: String },

    #[error("failed to parse export type \"{kind}\"")]
    ExportTypeParse { kind: String },

    #[error("failed to parse token: {reason}")]
    TokenParse { reason: String },

    #[error("unexpected signing method={alg}")]
    SigningMethod { alg: String },

    #[error("failed to parse hex from infohash={infohash}")]
    InfohashParse { infohash: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("not found sha1={id}")]
    Sha1NotFound { id: String },

    #[error("content with id {id} not found")]
    ContentNotFound { id: String },

    #[error("magnet timeout: {reason}")]
    MagnetTimeout { reason: String },

    #[error("torrent store {op} timeout")]
    StoreTimeout { op: &'static str },

    #[error("invalid export domain: {0}")]
    Domain(#[from] url::ParseError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Grpc(#[from] tonic::Status),

    /// Failures from downstream collaborators that carry no special
    /// status mapping.
    #[error("{0}")]
    Backend(String),

    /// An error produced once and handed to every coalesced waiter.
    #[error("{0}")]
    Shared(Arc<Error>),
}

/// Convenience alias used throughout the gateway.
pub type Result<T> = std::result::Result<T, Error>;
