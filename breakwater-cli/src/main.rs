//! Breakwater CLI - serves the gateway API.

use std::sync::Arc;

use breakwater_core::cluster::ClusterClient;
use breakwater_core::export::Export;
use breakwater_core::listing::List;
use breakwater_core::magnet2torrent::GrpcMagnetResolver;
use breakwater_core::nodes::NodeInventory;
use breakwater_core::probe::CacheProbe;
use breakwater_core::subdomains::SubdomainSelector;
use breakwater_core::tags::TagBuilder;
use breakwater_core::torrent_store::GrpcTorrentStore;
use breakwater_core::urls::UrlBuilder;
use breakwater_core::{init_tracing, CliLogLevel, GatewayConfig, ResourceResolver};
use breakwater_web::{run_server, AppState};
use clap::Parser;

#[derive(Parser)]
#[command(name = "breakwater")]
#[command(about = "REST gateway for BitTorrent resource export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the gateway web server
    Serve {
        /// Host to bind to; overrides WEB_HOST
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to; overrides WEB_PORT
        #[arg(short, long)]
        port: Option<u16>,
        /// Console log level
        #[arg(long, default_value = "info")]
        log_level: CliLogLevel,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            host,
            port,
            log_level,
        } => {
            init_tracing(log_level.as_tracing_level());
            let mut config = GatewayConfig::from_env();
            if let Some(host) = host {
                config.web.host = host;
            }
            if let Some(port) = port {
                config.web.port = port;
            }
            serve(config).await
        }
    }
}

async fn serve(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(GrpcTorrentStore::new(
        &config.backend.torrent_store_host,
        config.backend.torrent_store_port,
    ));
    let magnet = Arc::new(GrpcMagnetResolver::new(
        &config.backend.magnet2torrent_host,
        config.backend.magnet2torrent_port,
    ));
    let resolver = Arc::new(ResourceResolver::new(store, magnet));

    let probe = Arc::new(CacheProbe::new(config.probe.clone()));
    let cluster = Arc::new(ClusterClient::new(config.cluster.clone()));
    let inventory = Arc::new(NodeInventory::new(
        cluster,
        config.cluster.node_label_prefix.clone(),
    ));
    let subdomains = Arc::new(SubdomainSelector::new(inventory));
    let urls = Arc::new(UrlBuilder::new(config.export.clone(), subdomains, probe));
    let tags = Arc::new(TagBuilder::new(urls.clone(), List));
    let export = Arc::new(Export::standard(urls, tags, config.video_info_configured()));

    let state = AppState {
        resolver,
        list: List,
        export,
    };
    run_server(&config.web, state).await
}
