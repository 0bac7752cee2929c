//! gRPC client for the magnet-to-torrent resolver.

use std::sync::OnceLock;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use crate::error::{Error, Result};
use crate::pb::magnet2torrent::magnet2_torrent_client::Magnet2TorrentClient;
use crate::pb::magnet2torrent::Magnet2TorrentRequest;

/// Resolves a magnet URI to full torrent bytes.
#[async_trait]
pub trait MagnetResolver: Send + Sync {
    /// Fetches torrent bytes for `magnet` from the BitTorrent network.
    async fn resolve(&self, magnet: &str) -> Result<Vec<u8>>;
}

/// Production client; dials lazily and memoizes the channel (or the dial
/// error) for the life of the process.
pub struct GrpcMagnetResolver {
    endpoint: String,
    channel: OnceLock<std::result::Result<Channel, String>>,
}

impl GrpcMagnetResolver {
    /// Creates a client for the resolver at `host:port`. No connection is
    /// made until the first call.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            endpoint: format!("http://{host}:{port}"),
            channel: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<Magnet2TorrentClient<Channel>> {
        let channel = self.channel.get_or_init(|| {
            tracing::info!(endpoint = %self.endpoint, "initializing magnet resolver client");
            Endpoint::from_shared(self.endpoint.clone())
                .map(|endpoint| endpoint.connect_lazy())
                .map_err(|e| e.to_string())
        });
        match channel {
            Ok(channel) => Ok(Magnet2TorrentClient::new(channel.clone())),
            Err(reason) => Err(Error::Backend(format!(
                "failed to dial magnet resolver addr={}: {reason}",
                self.endpoint
            ))),
        }
    }
}

#[async_trait]
impl MagnetResolver for GrpcMagnetResolver {
    async fn resolve(&self, magnet: &str) -> Result<Vec<u8>> {
        let mut client = self.client()?;
        let reply = client
            .magnet2_torrent(Magnet2TorrentRequest {
                magnet: magnet.to_string(),
            })
            .await
            .map_err(Error::Grpc)?;
        Ok(reply.into_inner().torrent)
    }
}
