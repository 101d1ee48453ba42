//! HTTP surface of the proxy.
//!
//! ```text
//! GET   /health                     -> health
//! GET   /api/streams                -> list_streams (cached)
//! PATCH /api/streams/{id}           -> update_stream
//! POST  /api/streams/{id}/archive   -> archive_stream
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::Method;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::client::is_page_id;
use crate::error::{ProxyError, ProxyResult};
use crate::mapping::{StreamPatch, StreamRecord};
use crate::state::ProxyState;

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub data: Vec<StreamRecord>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub data: StreamRecord,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn checked_id(id: &str) -> ProxyResult<&str> {
    if is_page_id(id) {
        Ok(id)
    } else {
        Err(ProxyError::BadRequest(format!("'{id}' is not a Notion page id")))
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_streams(State(state): State<ProxyState>) -> ProxyResult<Json<StreamsResponse>> {
    if let Some(data) = state.streams.get().await {
        return Ok(Json(StreamsResponse { data, cached: true }));
    }

    let data = state.client.query_database().await?;
    tracing::info!(count = data.len(), "Fetched streams from Notion");
    state.streams.put(data.clone()).await;
    Ok(Json(StreamsResponse {
        data,
        cached: false,
    }))
}

async fn update_stream(
    State(state): State<ProxyState>,
    Path(id): Path<String>,
    body: Result<Json<StreamPatch>, JsonRejection>,
) -> ProxyResult<Json<StreamResponse>> {
    let id = checked_id(&id)?;
    let Json(patch) = body.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    let properties = patch.to_properties().map_err(ProxyError::BadRequest)?;

    let record = state.client.update_page(id, &properties).await?;
    state.streams.invalidate().await;

    tracing::info!(page_id = %id, "Stream updated in Notion");
    Ok(Json(StreamResponse { data: record }))
}

async fn archive_stream(
    State(state): State<ProxyState>,
    Path(id): Path<String>,
) -> ProxyResult<Json<StreamResponse>> {
    let id = checked_id(&id)?;
    let record = state.client.archive_page(id).await?;
    state.streams.invalidate().await;

    tracing::info!(page_id = %id, "Stream archived in Notion");
    Ok(Json(StreamResponse { data: record }))
}

/// Build the proxy router with CORS and request tracing.
pub fn build_router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PATCH, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/streams", get(list_streams))
        .route("/api/streams/{id}", patch(update_stream))
        .route("/api/streams/{id}/archive", post(archive_stream))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
