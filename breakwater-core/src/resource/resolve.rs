//! Resource resolution against the torrent store and magnet resolver.
//!
//! Resolution is coalesced per info-hash: however many clients race for the
//! same resource, at most one Touch/Pull/Push/Magnet chain runs at a time,
//! and the outcome is cached for the resource TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::{bencode, parse, Resource, ResourceKind};
use crate::coalesce::{CoalescingConfig, CoalescingMap};
use crate::error::{Error, Result};
use crate::magnet2torrent::MagnetResolver;
use crate::torrent_store::{StoreError, TorrentStore};

const STORE_TIMEOUT: Duration = Duration::from_secs(10);
const MAGNET_TIMEOUT: Duration = Duration::from_secs(180);
const RESOLVE_CONCURRENCY: usize = 100;
const RESOLVE_CAPACITY: usize = 1000;
const RESOLVE_EXPIRE: Duration = Duration::from_secs(600);
const RESOLVE_ERROR_EXPIRE: Duration = Duration::from_secs(5);

/// Turns raw client input into a fully materialized [`Resource`],
/// coordinating with the torrent store and the magnet resolver.
pub struct ResourceResolver {
    map: CoalescingMap<Arc<Resource>>,
    store: Arc<dyn TorrentStore>,
    magnet: Arc<dyn MagnetResolver>,
    store_timeout: Duration,
    magnet_timeout: Duration,
}

impl ResourceResolver {
    /// Creates a resolver over the given backends with production cache and
    /// timeout settings.
    pub fn new(store: Arc<dyn TorrentStore>, magnet: Arc<dyn MagnetResolver>) -> Self {
        Self {
            map: CoalescingMap::new(CoalescingConfig {
                concurrency: RESOLVE_CONCURRENCY,
                capacity: RESOLVE_CAPACITY,
                expire: RESOLVE_EXPIRE,
                error_expire: RESOLVE_ERROR_EXPIRE,
            }),
            store,
            magnet,
            store_timeout: STORE_TIMEOUT,
            magnet_timeout: MAGNET_TIMEOUT,
        }
    }

    /// Overrides the per-call backend deadlines.
    pub fn with_timeouts(mut self, store_timeout: Duration, magnet_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self.magnet_timeout = magnet_timeout;
        self
    }

    /// Resolves `input` (hash, magnet URI or torrent bytes) into a resource.
    ///
    /// # Errors
    /// - parse errors for malformed input
    /// - [`Error::Forbidden`] when the store denies the hash
    /// - [`Error::Sha1NotFound`] for hashes unknown to the store
    /// - [`Error::MagnetTimeout`] when magnet resolution misses its deadline
    pub async fn resolve(&self, input: &[u8]) -> Result<Arc<Resource>> {
        let shallow = parse(input)?;
        let id = shallow.id.clone();
        let input = input.to_vec();
        self.map
            .get(&id, || async move {
                self.build(shallow, input).await.map(Arc::new)
            })
            .await
    }

    async fn build(&self, shallow: Resource, input: Vec<u8>) -> Result<Resource> {
        tracing::debug!(id = %shallow.id, kind = ?shallow.kind, "resolving resource");
        let mut found = true;
        match timeout(self.store_timeout, self.store.touch(&shallow.id)).await {
            Err(_) => return Err(Error::StoreTimeout { op: "touch" }),
            Ok(Err(StoreError::PermissionDenied(reason))) => {
                return Err(Error::Forbidden { reason })
            }
            Ok(Err(StoreError::NotFound)) => found = false,
            Ok(Err(StoreError::Other(status))) => return Err(Error::Grpc(status)),
            Ok(Ok(())) => {}
        }
        if found {
            if shallow.kind == ResourceKind::Torrent {
                return Ok(shallow);
            }
            let torrent = timeout(self.store_timeout, self.store.pull(&shallow.id))
                .await
                .map_err(|_| Error::StoreTimeout { op: "pull" })?
                .map_err(store_error)?;
            return bencode::parse_torrent(&torrent);
        }
        match shallow.kind {
            ResourceKind::Sha1 | ResourceKind::Hash => {
                Err(Error::Sha1NotFound { id: shallow.id })
            }
            ResourceKind::Torrent => {
                timeout(self.store_timeout, self.store.push(input))
                    .await
                    .map_err(|_| Error::StoreTimeout { op: "push" })?
                    .map_err(store_error)?;
                Ok(shallow)
            }
            ResourceKind::Magnet => {
                let magnet_uri = String::from_utf8_lossy(&input).into_owned();
                let torrent =
                    match timeout(self.magnet_timeout, self.magnet.resolve(&magnet_uri)).await {
                        Err(_) => {
                            return Err(Error::MagnetTimeout {
                                reason: "deadline exceeded".to_string(),
                            })
                        }
                        Ok(result) => result?,
                    };
                // This push runs under the caller's deadline, not the store
                // timeout.
                self.store.push(torrent.clone()).await.map_err(store_error)?;
                bencode::parse_torrent(&torrent)
            }
        }
    }
}

fn store_error(err: StoreError) -> Error {
    match err {
        StoreError::NotFound => Error::Backend("not found".to_string()),
        StoreError::PermissionDenied(reason) => Error::Forbidden { reason },
        StoreError::Other(status) => Error::Grpc(status),
    }
}
