//! Breakwater core — resource resolution and export URL synthesis.
//!
//! This crate holds everything behind the HTTP surface of the gateway:
//! coalesced caches, torrent/magnet parsing, resolution against the torrent
//! store and magnet resolver, cluster node inventory, infohash-affine
//! subdomain selection, listing views, and the per-export-type URL and tag
//! builders.

pub mod auth;
pub mod cluster;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod export;
pub mod listing;
pub mod magnet2torrent;
pub mod media;
pub mod models;
pub mod nodes;
pub mod params;
pub mod pb;
pub mod probe;
pub mod resource;
pub mod subdomains;
pub mod tags;
pub mod torrent_store;
pub mod tracing_setup;
pub mod urls;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use resource::resolve::ResourceResolver;
pub use resource::{Resource, ResourceKind};
pub use tracing_setup::{init_tracing, CliLogLevel};
