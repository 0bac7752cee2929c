//! Generated gRPC bindings for the torrent-store and magnet-resolver
//! services. Server-side code is generated too so tests can stand up
//! in-process doubles.

#[allow(missing_docs)]
pub mod torrentstore {
    tonic::include_proto!("torrentstore");
}

#[allow(missing_docs)]
pub mod magnet2torrent {
    tonic::include_proto!("magnet2torrent");
}
