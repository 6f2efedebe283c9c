//! Key-authenticated API used by the engine to store its results
//!
//! Disabled unless an engine API key is configured.

use aura_core::{ArticleStatus, SourceId, Timestamp};
use aura_db::{ArticleRecord, NewArticle, SettingRecord, SourceRecord};
use aura_engine::API_KEY_HEADER;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use snafu::OptionExt as _;
use tracing::{debug, info};

use super::AppJson;
use crate::error::{
    ForbiddenSnafu, RequestError, RequestResult, SomethingNotFoundSnafu, UnauthorizedSnafu,
};
use crate::{LOG_TARGET, SharedState};

/// Request carrying the engine API key
pub struct EngineKey;

impl FromRequestParts<SharedState> for EngineKey {
    type Rejection = RequestError;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.opts.engine_api_key() else {
            debug!(target: LOG_TARGET, "Ingest request with no API key configured");
            return Err(ForbiddenSnafu.build().into());
        };
        let provided = req
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided.is_some_and(|provided| keys_match(provided, expected)) {
            Ok(EngineKey)
        } else {
            debug!(target: LOG_TARGET, "Ingest request with a wrong API key");
            Err(UnauthorizedSnafu.build().into())
        }
    }
}

fn keys_match(a: &str, b: &str) -> bool {
    blake3::hash(a.as_bytes()) == blake3::hash(b.as_bytes())
}

#[derive(Deserialize)]
pub struct IngestArticle {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    status: Option<ArticleStatus>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    generated_by: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    /// Category name, created if missing
    #[serde(default)]
    category: Option<String>,
}

pub async fn post_article(
    state: State<SharedState>,
    _key: EngineKey,
    AppJson(input): AppJson<IngestArticle>,
) -> RequestResult<impl IntoResponse> {
    let category_id = match input.category.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(state.db.find_or_create_category(name).await?.id),
        _ => None,
    };
    let new = NewArticle::builder()
        .title(input.title)
        .content(input.content)
        .status(input.status.unwrap_or(ArticleStatus::PendingReview))
        .maybe_category_id(category_id)
        .maybe_source_url(input.source_url)
        .maybe_thumbnail_url(input.thumbnail_url)
        .maybe_generated_by(input.generated_by)
        .maybe_summary(input.summary)
        .build();
    let article: ArticleRecord = state.db.insert_article(new).await?;
    info!(target: LOG_TARGET, id = %article.id, "Article ingested");
    Ok((StatusCode::CREATED, AppJson(article)))
}

#[derive(Serialize)]
pub struct SourcesResponse {
    sources: Vec<SourceRecord>,
}

pub async fn get_sources(
    state: State<SharedState>,
    _key: EngineKey,
) -> RequestResult<AppJson<SourcesResponse>> {
    Ok(AppJson(SourcesResponse {
        sources: state.db.list_active_sources().await?,
    }))
}

pub async fn post_source_crawled(
    state: State<SharedState>,
    _key: EngineKey,
    Path(id): Path<SourceId>,
) -> RequestResult<AppJson<SourceRecord>> {
    Ok(AppJson(
        state.db.mark_source_crawled(id, Timestamp::now()).await?,
    ))
}

pub async fn get_setting(
    state: State<SharedState>,
    _key: EngineKey,
    Path(key): Path<String>,
) -> RequestResult<AppJson<SettingRecord>> {
    Ok(AppJson(
        state
            .db
            .get_setting(&key)
            .await?
            .context(SomethingNotFoundSnafu)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::keys_match;

    #[test]
    fn key_comparison() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "Secret"));
        assert!(!keys_match("", "secret"));
    }
}
