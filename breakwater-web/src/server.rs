//! Router and listener for the gateway API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use breakwater_core::config::WebConfig;
use breakwater_core::export::Export;
use breakwater_core::listing::List;
use breakwater_core::ResourceResolver;
use tower_http::cors::CorsLayer;

use crate::handlers::{get_export, get_list, get_resource, post_resource};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ResourceResolver>,
    pub list: List,
    pub export: Arc<Export>,
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/resource/", post(post_resource))
        .route("/resource/{resource_id}", get(get_resource))
        .route("/resource/{resource_id}/list", get(get_list))
        .route(
            "/resource/{resource_id}/export/{content_id}",
            get(get_export),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves until interrupted.
///
/// # Errors
/// Returns bind and serve failures.
pub async fn run_server(
    config: &WebConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = if config.host.is_empty() {
        "0.0.0.0"
    } else {
        config.host.as_str()
    };
    let listener = tokio::net::TcpListener::bind(format!("{host}:{}", config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving web");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
