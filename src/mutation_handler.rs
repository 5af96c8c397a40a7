//! HTTP adapter in front of [`MutationServer`].

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::*;

use crate::envelope;
use crate::error::WebhookError;
use crate::mutation::{MutationServer, MUTATE_PATH};

/// Routes every path through the review handler; only [`MUTATE_PATH`]
/// yields admission responses.
pub fn router(server: MutationServer) -> Router {
    Router::new()
        .route(MUTATE_PATH, post(handle))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(handle)
        .with_state(server)
}

pub async fn handle(
    State(server): State<MutationServer>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match serve(&server, uri.path(), &headers, &body) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!("{}", err);
            err.into_response()
        }
    }
}

fn serve(
    server: &MutationServer,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<u8>, WebhookError> {
    if body.is_empty() {
        return Err(WebhookError::EmptyBody);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_json(content_type) {
        return Err(WebhookError::InvalidContentType(content_type.to_string()));
    }

    let review = server.review(path, body);
    envelope::encode(&review)
}

/// Media type check, parameters such as `charset` are ignored.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
