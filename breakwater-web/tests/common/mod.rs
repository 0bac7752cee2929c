//! Full-stack test harness: gRPC doubles behind a live gateway server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use breakwater_core::cluster::ClusterClient;
use breakwater_core::config::{ClusterConfig, ExportConfig, ProbeConfig};
use breakwater_core::export::Export;
use breakwater_core::listing::List;
use breakwater_core::magnet2torrent::GrpcMagnetResolver;
use breakwater_core::nodes::NodeInventory;
use breakwater_core::pb::magnet2torrent::magnet2_torrent_server::{
    Magnet2Torrent, Magnet2TorrentServer,
};
use breakwater_core::pb::magnet2torrent::{Magnet2TorrentReply, Magnet2TorrentRequest};
use breakwater_core::pb::torrentstore::torrent_store_server::{TorrentStore, TorrentStoreServer};
use breakwater_core::pb::torrentstore::{
    PullReply, PullRequest, PushReply, PushRequest, TouchReply, TouchRequest,
};
use breakwater_core::probe::CacheProbe;
use breakwater_core::subdomains::SubdomainSelector;
use breakwater_core::tags::TagBuilder;
use breakwater_core::torrent_store::GrpcTorrentStore;
use breakwater_core::urls::UrlBuilder;
use breakwater_core::ResourceResolver;
use breakwater_web::{router, AppState};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

fn benc_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{}:", data.len()).into_bytes();
    out.extend_from_slice(data);
    out
}

fn benc_str(s: &str) -> Vec<u8> {
    benc_bytes(s.as_bytes())
}

fn benc_int(value: i64) -> Vec<u8> {
    format!("i{value}e").into_bytes()
}

fn benc_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![b'l'];
    for item in items {
        out.extend_from_slice(item);
    }
    out.push(b'e');
    out
}

fn benc_dict(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![b'd'];
    for (key, value) in entries {
        out.extend_from_slice(&benc_str(key));
        out.extend_from_slice(value);
    }
    out.push(b'e');
    out
}

fn file_entry(length: i64, path: &[&str]) -> Vec<u8> {
    let segments: Vec<Vec<u8>> = path.iter().map(|s| benc_str(s)).collect();
    benc_dict(&[("length", benc_int(length)), ("path", benc_list(&segments))])
}

/// Multi-file torrent "Voyage" used across the API scenarios.
pub fn sample_torrent() -> Vec<u8> {
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
    benc_dict(&[
        ("announce", benc_str("udp://tracker.example.com:1337/announce")),
        ("info", info),
    ])
}

/// Programmable torrent-store double with call counters.
#[derive(Default)]
pub struct StoreState {
    pub touch_status: Mutex<Option<Status>>,
    pub pull_reply: Mutex<Option<Vec<u8>>>,
    pub touches: AtomicUsize,
    pub pushes: AtomicUsize,
}

#[derive(Clone)]
struct MockStore(Arc<StoreState>);

#[tonic::async_trait]
impl TorrentStore for MockStore {
    async fn touch(
        &self,
        _request: Request<TouchRequest>,
    ) -> Result<Response<TouchReply>, Status> {
        self.0.touches.fetch_add(1, Ordering::SeqCst);
        match self.0.touch_status.lock().unwrap().clone() {
            Some(status) => Err(status),
            None => Ok(Response::new(TouchReply {})),
        }
    }

    async fn pull(&self, _request: Request<PullRequest>) -> Result<Response<PullReply>, Status> {
        match self.0.pull_reply.lock().unwrap().clone() {
            Some(torrent) => Ok(Response::new(PullReply { torrent })),
            None => Err(Status::not_found("not found")),
        }
    }

    async fn push(&self, _request: Request<PushRequest>) -> Result<Response<PushReply>, Status> {
        self.0.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(PushReply {}))
    }
}

/// Programmable magnet-resolver double with an optional delay.
#[derive(Default)]
pub struct MagnetState {
    pub reply: Mutex<Option<Vec<u8>>>,
    pub delay: Mutex<Duration>,
}

#[derive(Clone)]
struct MockMagnet(Arc<MagnetState>);

#[tonic::async_trait]
impl Magnet2Torrent for MockMagnet {
    async fn magnet2_torrent(
        &self,
        _request: Request<Magnet2TorrentRequest>,
    ) -> Result<Response<Magnet2TorrentReply>, Status> {
        let delay = *self.0.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.0.reply.lock().unwrap().clone() {
            Some(torrent) => Ok(Response::new(Magnet2TorrentReply { torrent })),
            None => Err(Status::not_found("no metadata")),
        }
    }
}

/// A live gateway instance wired to fresh doubles.
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<StoreState>,
    pub magnet: Arc<MagnetState>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_magnet_timeout(Duration::from_secs(30)).await
}

pub async fn spawn_app_with_magnet_timeout(magnet_timeout: Duration) -> TestApp {
    let store = Arc::new(StoreState::default());
    let magnet = Arc::new(MagnetState::default());

    let store_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let store_port = store_listener.local_addr().unwrap().port();
    let store_service = MockStore(store.clone());
    tokio::spawn(async move {
        Server::builder()
            .add_service(TorrentStoreServer::new(store_service))
            .serve_with_incoming(TcpListenerStream::new(store_listener))
            .await
            .unwrap();
    });

    let magnet_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let magnet_port = magnet_listener.local_addr().unwrap().port();
    let magnet_service = MockMagnet(magnet.clone());
    tokio::spawn(async move {
        Server::builder()
            .add_service(Magnet2TorrentServer::new(magnet_service))
            .serve_with_incoming(TcpListenerStream::new(magnet_listener))
            .await
            .unwrap();
    });

    let resolver = Arc::new(
        ResourceResolver::new(
            Arc::new(GrpcTorrentStore::new("127.0.0.1", store_port)),
            Arc::new(GrpcMagnetResolver::new("127.0.0.1", magnet_port)),
        )
        .with_timeouts(Duration::from_secs(10), magnet_timeout),
    );
    let inventory = Arc::new(NodeInventory::new(
        Arc::new(ClusterClient::new(ClusterConfig::default())),
        "webtor.io/".to_string(),
    ));
    let urls = Arc::new(UrlBuilder::new(
        ExportConfig::default(),
        Arc::new(SubdomainSelector::new(inventory)),
        Arc::new(CacheProbe::new(ProbeConfig::default())),
    ));
    let tags = Arc::new(TagBuilder::new(urls.clone(), List));
    let export = Arc::new(Export::standard(urls, tags, false));
    let state = AppState {
        resolver,
        list: List,
        export,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{addr}"),
        store,
        magnet,
    }
}
