mod admin;
mod engine_proxy;
mod ingest;
mod login;
mod public;
mod seo;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::{self, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use maud::Markup;

use super::SharedState;
use super::error::{RequestError, UserErrorResponse};
use crate::UiState;

#[derive(Clone, Debug)]
#[must_use]
pub struct Maud(pub Markup);

impl IntoResponse for Maud {
    fn into_response(self) -> Response {
        (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )],
            self.0.0,
        )
            .into_response()
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RequestError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

pub async fn cache_control(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
        const NON_CACHEABLE_CONTENT_TYPES: &[&str] = &["text/html", "application/json"];
        const SHORT_CACHE_CONTENT_TYPES: &[&str] = &[
            "application/xml",
            "application/atom+xml",
            "text/plain",
        ];

        let cache_duration_secs = if SHORT_CACHE_CONTENT_TYPES
            .iter()
            .any(|&ct| content_type.as_bytes().starts_with(ct.as_bytes()))
        {
            Some(10 * 60)
        } else if NON_CACHEABLE_CONTENT_TYPES
            .iter()
            .any(|&ct| content_type.as_bytes().starts_with(ct.as_bytes()))
        {
            None
        } else {
            Some(60 * 60)
        };

        if let Some(dur) = cache_duration_secs {
            let value = format!("public, max-age={dur}");

            response.headers_mut().insert(
                "cache-control",
                HeaderValue::from_str(&value).expect("Can't fail"),
            );
        }
    }

    response
}

pub async fn not_found(_state: State<SharedState>, _req: Request<Body>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        AppJson(UserErrorResponse {
            message: "Not Found".to_string(),
        }),
    )
}

pub fn route_handler(state: SharedState) -> Router<()> {
    Router::<Arc<UiState>>::new()
        // public site
        .route("/", get(public::get_home))
        .route("/blog", get(public::get_blog_list))
        .route("/blog/{id}", get(public::get_blog_post))
        .route("/contact", get(public::get_contact))
        .route("/go/{key}", get(public::get_go_link))
        .route("/sitemap.xml", get(seo::get_sitemap))
        .route("/robots.txt", get(seo::get_robots))
        .route("/feed.xml", get(seo::get_feed_atom))
        // admin auth
        .route("/admin", get(admin_root))
        .route("/admin/login", get(login::get).post(login::post_login))
        .route("/admin/logout", post(login::logout))
        // admin dashboard
        .route("/admin/dashboard", get(admin::dashboard::get_dashboard))
        .route(
            "/admin/dashboard/generate",
            post(admin::dashboard::post_generate),
        )
        .route(
            "/admin/dashboard/generate_bulk",
            post(admin::dashboard::post_generate_bulk),
        )
        .route(
            "/admin/dashboard/recent",
            get(admin::dashboard::get_recent_articles),
        )
        .route(
            "/api/dashboard/articles",
            get(admin::dashboard::get_articles_json),
        )
        .route(
            "/admin/dashboard/articles",
            get(admin::articles::get_article_list),
        )
        .route(
            "/admin/dashboard/articles/{id}",
            get(admin::articles::get_article),
        )
        .route(
            "/admin/dashboard/articles/{id}/status",
            post(admin::articles::post_status),
        )
        .route(
            "/admin/dashboard/articles/{id}/edit",
            post(admin::articles::post_edit),
        )
        .route(
            "/admin/dashboard/articles/{id}/category",
            post(admin::articles::post_category),
        )
        .route(
            "/admin/dashboard/articles/{id}/feedback",
            post(admin::articles::post_feedback),
        )
        .route(
            "/admin/dashboard/articles/{id}/revise",
            post(admin::articles::post_revise),
        )
        .route(
            "/admin/dashboard/articles/{id}/delete",
            post(admin::articles::post_delete),
        )
        .route(
            "/admin/dashboard/articles/{id}/restore",
            post(admin::articles::post_restore),
        )
        .route(
            "/admin/dashboard/articles/{id}/purge",
            post(admin::articles::post_purge),
        )
        .route(
            "/admin/dashboard/links",
            get(admin::links::get_links).post(admin::links::post_new_link),
        )
        .route(
            "/admin/dashboard/links/{id}",
            post(admin::links::post_update_link),
        )
        .route(
            "/admin/dashboard/links/{id}/edit",
            get(admin::links::get_edit_link),
        )
        .route(
            "/admin/dashboard/links/{id}/delete",
            post(admin::links::post_delete_link),
        )
        .route(
            "/admin/dashboard/media",
            get(admin::media::get_media).post(admin::media::post_new_source),
        )
        .route(
            "/admin/dashboard/media/crawl",
            post(admin::media::post_crawl),
        )
        .route(
            "/admin/dashboard/media/recommendations",
            get(admin::media::get_recommendations).post(admin::media::post_add_recommendation),
        )
        .route(
            "/admin/dashboard/media/{id}",
            post(admin::media::post_update_source),
        )
        .route(
            "/admin/dashboard/media/{id}/edit",
            get(admin::media::get_edit_source),
        )
        .route(
            "/admin/dashboard/media/{id}/delete",
            post(admin::media::post_delete_source),
        )
        .route(
            "/admin/dashboard/media/{id}/toggle",
            post(admin::media::post_toggle_source),
        )
        .route(
            "/admin/dashboard/ai-settings",
            get(admin::ai_settings::get_ai_settings).post(admin::ai_settings::post_ai_settings),
        )
        .route(
            "/admin/dashboard/ai-settings/reset",
            post(admin::ai_settings::post_reset),
        )
        .route(
            "/admin/dashboard/settings",
            get(admin::settings::get_settings).post(admin::settings::post_settings),
        )
        // engine
        .route("/api/engine/trends", get(engine_proxy::get_trends))
        .route("/api/engine/generate", post(engine_proxy::post_generate))
        .route(
            "/api/engine/generate_bulk",
            post(engine_proxy::post_generate_bulk),
        )
        .route("/api/engine/revise", post(engine_proxy::post_revise))
        .route("/api/engine/media/crawl", post(engine_proxy::post_media_crawl))
        .route(
            "/api/engine/media/recommendations",
            get(engine_proxy::get_media_recommendations),
        )
        .route("/api/ingest/articles", post(ingest::post_article))
        .route("/api/ingest/sources", get(ingest::get_sources))
        .route(
            "/api/ingest/sources/{id}/crawled",
            post(ingest::post_source_crawled),
        )
        .route("/api/ingest/settings/{key}", get(ingest::get_setting))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(cache_control))
}

async fn admin_root() -> Redirect {
    Redirect::to("/admin/dashboard")
}
