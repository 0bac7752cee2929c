//! HTTP request handlers.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json, Response};
use breakwater_core::export::ExportArgs;
use breakwater_core::listing::ListArgs;
use breakwater_core::models::{ExportResponse, ListResponse, ResourceResponse};
use breakwater_core::params::RequestParams;
use breakwater_core::resource::is_sha1_hex;
use breakwater_core::{Error, Resource};

use crate::error::ApiError;
use crate::server::AppState;

fn request_params(query: HashMap<String, String>, headers: &HeaderMap) -> RequestParams {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    RequestParams::new(query, headers)
}

fn resource_response(resource: &Resource) -> ResourceResponse {
    ResourceResponse {
        id: resource.id.clone(),
        name: resource.name.clone(),
        magnet_uri: resource.magnet_uri.clone(),
    }
}

/// `POST /resource/` — body is raw torrent bytes, a magnet URI or a 40-hex
/// info-hash.
pub async fn post_resource(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResourceResponse>, ApiError> {
    let resource = state.resolver.resolve(&body).await?;
    Ok(Json(resource_response(&resource)))
}

/// `GET /resource/{id}` — resource lookup; a `.torrent` suffix serves the
/// preserved bencoded bytes instead.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
) -> Result<Response, ApiError> {
    if let Some(id) = resource_id.strip_suffix(".torrent") {
        let resource = state.resolver.resolve(id.as_bytes()).await?;
        return Ok((
            [(header::CONTENT_TYPE, "application/x-bittorrent")],
            resource.torrent.clone(),
        )
            .into_response());
    }
    let resource = state.resolver.resolve(resource_id.as_bytes()).await?;
    Ok(Json(resource_response(&resource)).into_response())
}

/// `GET /resource/{id}/list` — flat or tree listing of the resource.
pub async fn get_list(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    let params = request_params(query, &headers);
    let args = ListArgs::from_params(&params)?;
    let resource = state.resolver.resolve(resource_id.as_bytes()).await?;
    Ok(Json(state.list.get(&resource, &args)))
}

/// `GET /resource/{id}/export/{content_id}` — export URLs for one item.
pub async fn get_export(
    State(state): State<AppState>,
    Path((resource_id, content_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<ExportResponse>, ApiError> {
    let params = request_params(query, &headers);
    let args = ExportArgs::from_params(&params)?;
    if !is_sha1_hex(content_id.as_bytes()) {
        return Err(Error::ContentIdParse { id: content_id }.into());
    }
    let resource = state.resolver.resolve(resource_id.as_bytes()).await?;
    let listing = state.list.get(&resource, &ListArgs::default());
    let item = listing
        .items
        .iter()
        .find(|item| item.id == content_id)
        .cloned()
        .or_else(|| (listing.item.id == content_id).then(|| listing.item.clone()))
        .ok_or_else(|| Error::ContentNotFound {
            id: content_id.clone(),
        })?;
    let response = state.export.get(&resource, &item, &args, &params).await?;
    Ok(Json(response))
}
