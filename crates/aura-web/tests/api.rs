mod common;

use aura_core::{ArticleStatus, SourceType};
use aura_db::SourceInput;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use common::{ENGINE_API_KEY, TestServer};
use serde_json::json;

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn engine_proxy_forwards_responses() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver.get("/api/engine/trends").await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["keywords"][0], "水光注射");

    let resp = driver
        .post_json("/api/engine/generate", &json!({ "keyword": "ピコシュア" }))
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["keyword"], "ピコシュア");

    let resp = driver
        .post_json(
            "/api/engine/revise",
            &json!({ "content": "元の本文", "feedback": "短く" }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(
        body["revised_content"]
            .as_str()
            .unwrap()
            .starts_with("元の本文")
    );

    let resp = driver.get("/api/engine/media/recommendations").await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn engine_proxy_passes_error_status_through() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver
        .post_json(
            "/api/engine/revise",
            &json!({ "content": "本文", "feedback": common::FAILING_FEEDBACK }),
        )
        .await;
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "model overloaded");
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn revise_proxy_requires_content_and_feedback() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    for body in [
        json!({ "content": "本文" }),
        json!({ "content": "", "feedback": "x" }),
        json!({}),
    ] {
        let resp = driver.post_json("/api/engine/revise", &body).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Missing content or feedback");
    }
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn offline_engine_uses_fallback_trends_and_reports_errors() {
    let server = TestServer::start_engine_offline().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver.get("/api/engine/trends").await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let keywords = body["keywords"].as_array().unwrap();
    assert_eq!(keywords.len(), 10);
    assert_eq!(keywords[0], "(Fallback) 韓国肌管理");

    let resp = driver
        .post_json("/api/engine/generate", &json!({ "keyword": "x" }))
        .await;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to connect to engine");
    assert!(body["details"].is_string());

    // dashboard still renders with fallback chips
    let page = driver.get_text("/admin/dashboard").await;
    assert!(page.contains("#ピコシュア"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn trends_fall_back_on_unusable_success_body() {
    let server = TestServer::start_with_engine(
        axum::Router::new().route(
            "/trends",
            get(|| async { "<html>gateway page</html>" }),
        ),
    )
    .await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver.get("/api/engine/trends").await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["keywords"][0], "(Fallback) 韓国肌管理");
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn engine_proxy_keeps_request_content_type() {
    fn content_type_of(headers: &HeaderMap) -> String {
        headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>")
            .to_owned()
    }
    let server = TestServer::start_with_engine(
        axum::Router::new()
            .route(
                "/media/crawl",
                post(|headers: HeaderMap| async move { content_type_of(&headers) }),
            )
            .route(
                "/generate_bulk",
                post(|headers: HeaderMap| async move { content_type_of(&headers) }),
            ),
    )
    .await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver
        .post_json("/api/engine/media/crawl", &json!({ "all": true }))
        .await;
    assert_eq!(resp.text().await.unwrap(), "application/json");

    // no body, no content type
    let resp = driver.post_form("/api/engine/generate_bulk", &[]).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "<none>");
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn ingest_rejects_missing_or_wrong_key() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let resp = driver.ingest_get("/api/ingest/sources", None).await;
    assert_eq!(resp.status(), 401);
    let resp = driver.ingest_get("/api/ingest/sources", Some("wrong")).await;
    assert_eq!(resp.status(), 401);

    let resp = driver
        .ingest_post(
            "/api/ingest/articles",
            Some("wrong"),
            &json!({ "title": "x", "content": "y" }),
        )
        .await;
    assert_eq!(resp.status(), 401);
    assert!(
        server
            .db()
            .list_articles(Default::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn ingest_creates_pending_review_articles() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let resp = driver
        .ingest_post(
            "/api/ingest/articles",
            Some(ENGINE_API_KEY),
            &json!({
                "title": "ポテンツァの最新情報",
                "content": "## ポテンツァとは\n\n本文",
                "source_url": "https://source.example/a",
                "generated_by": "gemini",
                "category": "Skincare",
            }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "pending_review");

    let articles = server
        .db()
        .list_articles(Default::default())
        .await
        .unwrap();
    assert_eq!(articles.len(), 1);
    let article = &articles[0];
    assert_eq!(article.status, ArticleStatus::PendingReview);
    assert_eq!(article.generated_by.as_deref(), Some("gemini"));
    assert!(article.published_at.is_none());

    let category = server
        .db()
        .get_category_by_slug("skincare")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(article.category_id, Some(category.id));

    let resp = driver
        .ingest_post(
            "/api/ingest/articles",
            Some(ENGINE_API_KEY),
            &json!({ "title": "", "content": "no title" }),
        )
        .await;
    assert_eq!(resp.status(), 400);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn ingest_sources_and_settings() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let active = server
        .db()
        .create_source(SourceInput {
            name: "Active".into(),
            url: "https://active.example/".into(),
            source_type: SourceType::JapaneseMedia,
        })
        .await
        .unwrap();
    let inactive = server
        .db()
        .create_source(SourceInput {
            name: "Inactive".into(),
            url: "https://inactive.example/".into(),
            source_type: SourceType::KoreanMedia,
        })
        .await
        .unwrap();
    server
        .db()
        .set_source_active(inactive.id, false)
        .await
        .unwrap();

    let resp = driver
        .ingest_get("/api/ingest/sources", Some(ENGINE_API_KEY))
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["name"], "Active");

    let resp = driver
        .ingest_post(
            &format!("/api/ingest/sources/{}/crawled", active.id),
            Some(ENGINE_API_KEY),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let source = server.db().get_source(active.id).await.unwrap().unwrap();
    assert!(source.last_crawled_at.is_some());

    let resp = driver
        .ingest_get(
            "/api/ingest/settings/system_prompt_misaki",
            Some(ENGINE_API_KEY),
        )
        .await;
    assert_eq!(resp.status(), 404);

    server
        .db()
        .upsert_setting("system_prompt_misaki", "prompt".into(), None)
        .await
        .unwrap();
    let resp = driver
        .ingest_get(
            "/api/ingest/settings/system_prompt_misaki",
            Some(ENGINE_API_KEY),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["value"], "prompt");
}
