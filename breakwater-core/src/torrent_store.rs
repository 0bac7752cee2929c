//! gRPC client for the torrent store.

use std::sync::OnceLock;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::pb::torrentstore::torrent_store_client::TorrentStoreClient;
use crate::pb::torrentstore::{PullRequest, PushRequest, TouchRequest};

/// Failure modes of torrent store calls. The status codes the resolver
/// dispatches on are lifted into their own variants.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Other(Status),
}

impl StoreError {
    pub(crate) fn from_status(status: Status) -> Self {
        match status.code() {
            Code::NotFound => StoreError::NotFound,
            Code::PermissionDenied => StoreError::PermissionDenied(status.message().to_string()),
            _ => StoreError::Other(status),
        }
    }
}

/// Torrent metadata store: lease refresh, fetch and publish.
#[async_trait]
pub trait TorrentStore: Send + Sync {
    /// Refreshes the store lease for `info_hash`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when the torrent is not cached yet
    /// - [`StoreError::PermissionDenied`] when the store rejects the hash
    async fn touch(&self, info_hash: &str) -> Result<(), StoreError>;

    /// Fetches the bencoded torrent bytes for `info_hash`.
    async fn pull(&self, info_hash: &str) -> Result<Vec<u8>, StoreError>;

    /// Publishes torrent bytes to the store.
    async fn push(&self, torrent: Vec<u8>) -> Result<(), StoreError>;
}

/// Production client; dials lazily and memoizes the channel (or the dial
/// error) for the life of the process.
pub struct GrpcTorrentStore {
    endpoint: String,
    channel: OnceLock<Result<Channel, String>>,
}

impl GrpcTorrentStore {
    /// Creates a client for the store at `host:port`. No connection is made
    /// until the first call.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            endpoint: format!("http://{host}:{port}"),
            channel: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<TorrentStoreClient<Channel>, StoreError> {
        let channel = self.channel.get_or_init(|| {
            tracing::info!(endpoint = %self.endpoint, "initializing torrent store client");
            Endpoint::from_shared(self.endpoint.clone())
                .map(|endpoint| endpoint.connect_lazy())
                .map_err(|e| e.to_string())
        });
        match channel {
            Ok(channel) => Ok(TorrentStoreClient::new(channel.clone())),
            Err(reason) => Err(StoreError::Other(Status::unavailable(format!(
                "failed to dial torrent store addr={}: {reason}",
                self.endpoint
            )))),
        }
    }
}

#[async_trait]
impl TorrentStore for GrpcTorrentStore {
    async fn touch(&self, info_hash: &str) -> Result<(), StoreError> {
        let mut client = self.client()?;
        client
            .touch(TouchRequest {
                info_hash: info_hash.to_string(),
            })
            .await
            .map(|_| ())
            .map_err(StoreError::from_status)
    }

    async fn pull(&self, info_hash: &str) -> Result<Vec<u8>, StoreError> {
        let mut client = self.client()?;
        let reply = client
            .pull(PullRequest {
                info_hash: info_hash.to_string(),
            })
            .await
            .map_err(StoreError::from_status)?;
        Ok(reply.into_inner().torrent)
    }

    async fn push(&self, torrent: Vec<u8>) -> Result<(), StoreError> {
        let mut client = self.client()?;
        client
            .push(PushRequest { torrent })
            .await
            .map(|_| ())
            .map_err(StoreError::from_status)
    }
}
