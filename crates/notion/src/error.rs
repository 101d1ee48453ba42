use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::client::NotionError;

/// Errors returned by the proxy's HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Notion(#[from] NotionError),
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ProxyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ProxyError::Notion(err) => match err {
                NotionError::Api { status: 404, .. } => {
                    (StatusCode::NOT_FOUND, "Stream not found".into())
                }
                NotionError::Api {
                    status: 401 | 403, ..
                } => (
                    StatusCode::BAD_GATEWAY,
                    "Notion rejected the proxy credentials".into(),
                ),
                NotionError::Api { status, .. } => (
                    StatusCode::BAD_GATEWAY,
                    format!("Notion rejected the request ({status})"),
                ),
                NotionError::RetriesExhausted { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Notion is unavailable, try again later".into(),
                ),
                NotionError::Request(_) | NotionError::Decode(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Invalid response from Notion".into(),
                ),
                NotionError::Config(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                ),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Notion proxy error");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
