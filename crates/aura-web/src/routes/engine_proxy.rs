//! Admin-only pass-through to the AI engine
//!
//! Requests and responses are forwarded verbatim: status, content type and
//! body. Trends are the exception, they are checked and replaced by the
//! fallback list when unusable.

use aura_engine::{EngineError, ForwardedBody, ForwardedResponse, Method, fallback_trends};
use aura_util_error::FmtCompact as _;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppJson;
use super::login::session::AdminSession;
use crate::{LOG_TARGET, SharedState};

#[derive(Serialize)]
struct ProxyErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn proxy_error(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        AppJson(ProxyErrorResponse {
            error: error.to_owned(),
            details,
        }),
    )
        .into_response()
}

fn forwarded_into_response(resp: ForwardedResponse) -> Response {
    let mut out = (resp.status, resp.body).into_response();
    if let Some(content_type) = resp.content_type {
        out.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    out
}

fn engine_error_response(path: &str, err: &EngineError) -> Response {
    warn!(target: LOG_TARGET, %path, err = %err.fmt_compact(), "Engine proxy failure");
    proxy_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to connect to engine",
        Some(err.to_string()),
    )
}

/// An empty body is sent as no body
fn forwarded_body(headers: &HeaderMap, body: Bytes) -> Option<ForwardedBody> {
    (!body.is_empty()).then(|| ForwardedBody {
        content_type: headers.get(CONTENT_TYPE).cloned(),
        bytes: body.to_vec(),
    })
}

async fn forward(
    state: &SharedState,
    method: Method,
    path: &str,
    body: Option<ForwardedBody>,
) -> Response {
    match state.engine.forward(method, path, body).await {
        Ok(resp) => forwarded_into_response(resp),
        Err(err) => engine_error_response(path, &err),
    }
}

#[derive(Serialize)]
struct TrendsResponse {
    keywords: Vec<String>,
}

/// Trends, or the fallback list with a 200 if the engine misbehaves
pub async fn get_trends(state: State<SharedState>, _admin: AdminSession) -> Response {
    let keywords = match state.engine.try_trends().await {
        Ok(keywords) => keywords,
        Err(err) => {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Trends failed, serving fallback");
            fallback_trends()
        }
    };
    AppJson(TrendsResponse { keywords }).into_response()
}

pub async fn post_generate(
    state: State<SharedState>,
    _admin: AdminSession,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        "/generate",
        forwarded_body(&headers, body),
    )
    .await
}

pub async fn post_generate_bulk(
    state: State<SharedState>,
    _admin: AdminSession,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        "/generate_bulk",
        forwarded_body(&headers, body),
    )
    .await
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ReviseBody {
    content: Option<String>,
    feedback: Option<String>,
}

pub async fn post_revise(
    state: State<SharedState>,
    _admin: AdminSession,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let parsed: ReviseBody = serde_json::from_slice(&body).unwrap_or_default();
    let has = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
    if !has(&parsed.content) || !has(&parsed.feedback) {
        return proxy_error(StatusCode::BAD_REQUEST, "Missing content or feedback", None);
    }
    forward(
        &state,
        Method::POST,
        "/revise",
        forwarded_body(&headers, body),
    )
    .await
}

pub async fn post_media_crawl(
    state: State<SharedState>,
    _admin: AdminSession,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        "/media/crawl",
        forwarded_body(&headers, body),
    )
    .await
}

pub async fn get_media_recommendations(
    state: State<SharedState>,
    _admin: AdminSession,
) -> Response {
    forward(&state, Method::GET, "/media/recommendations", None).await
}
