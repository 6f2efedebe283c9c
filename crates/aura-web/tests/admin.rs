mod common;

use aura_core::{ArticleId, ArticleStatus, LinkType};
use aura_db::{ArticleFilter, NewArticle};
use common::{FAILING_FEEDBACK, TestServer, location};

async fn seed_article(server: &TestServer, title: &str, status: ArticleStatus) -> ArticleId {
    server
        .db()
        .insert_article(
            NewArticle::builder()
                .title(title)
                .content("## 見出し\n\n本文です。")
                .status(status)
                .build(),
        )
        .await
        .unwrap()
        .id
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn soft_delete_then_restore_returns_to_draft() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "ゴミ箱テスト", ArticleStatus::Published).await;

    let resp = driver
        .post_form(&format!("/admin/dashboard/articles/{id}/delete"), &[])
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/dashboard/articles");

    let article = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(article.status, ArticleStatus::Deleted);

    let trash = driver
        .get_text("/admin/dashboard/articles?status=deleted")
        .await;
    assert!(trash.contains("ゴミ箱テスト"));
    let drafts = driver
        .get_text("/admin/dashboard/articles?status=published")
        .await;
    assert!(!drafts.contains("ゴミ箱テスト"));

    let resp = driver
        .post_form(&format!("/admin/dashboard/articles/{id}/restore"), &[])
        .await;
    assert_eq!(resp.status(), 303);
    let article = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(article.status, ArticleStatus::Draft);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn purge_removes_the_article() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "消える記事", ArticleStatus::Deleted).await;
    let resp = driver
        .post_form(&format!("/admin/dashboard/articles/{id}/purge"), &[])
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(
        location(&resp),
        "/admin/dashboard/articles?status=deleted"
    );
    assert!(server.db().get_article(id).await.unwrap().is_none());

    let resp = driver
        .get(&format!("/admin/dashboard/articles/{id}"))
        .await;
    assert_eq!(resp.status(), 404);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn failed_revision_leaves_content_unchanged() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "修正テスト", ArticleStatus::PendingReview).await;
    let before = server.db().get_article(id).await.unwrap().unwrap();

    let resp = driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/revise"),
            &[("feedback", FAILING_FEEDBACK)],
        )
        .await;
    assert_eq!(resp.status(), 303);

    let after = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(after.content, before.content);
    assert_eq!(after.admin_feedback, None);

    let page = driver
        .get_text(&format!("/admin/dashboard/articles/{id}"))
        .await;
    assert!(page.contains("修正に失敗しました"), "{page}");
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn successful_revision_replaces_content_and_keeps_feedback() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "修正テスト", ArticleStatus::PendingReview).await;

    let resp = driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/revise"),
            &[("feedback", "もっと短く")],
        )
        .await;
    assert_eq!(resp.status(), 303);

    let after = server.db().get_article(id).await.unwrap().unwrap();
    assert!(after.content.ends_with("(revised: もっと短く)"));
    assert_eq!(after.admin_feedback.as_deref(), Some("もっと短く"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn feedback_moves_article_back_to_draft() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "フィードバック", ArticleStatus::PendingReview).await;

    let resp = driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/feedback"),
            &[("feedback", "  ")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    let page = driver
        .get_text(&format!("/admin/dashboard/articles/{id}"))
        .await;
    assert!(page.contains("修正指示を入力してください。"));

    driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/feedback"),
            &[("feedback", "出典を追加")],
        )
        .await;
    let article = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(article.status, ArticleStatus::Draft);
    assert_eq!(article.admin_feedback.as_deref(), Some("出典を追加"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn new_category_is_created_and_assigned() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let id = seed_article(&server, "カテゴリ", ArticleStatus::Draft).await;
    driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/category"),
            &[("category_id", ""), ("new_category", "Skin Care")],
        )
        .await;

    let category = server
        .db()
        .get_category_by_slug("skin-care")
        .await
        .unwrap()
        .expect("category created");
    let article = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(article.category_id, Some(category.id));

    driver
        .post_form(
            &format!("/admin/dashboard/articles/{id}/category"),
            &[("category_id", ""), ("new_category", "")],
        )
        .await;
    let article = server.db().get_article(id).await.unwrap().unwrap();
    assert_eq!(article.category_id, None);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn empty_link_key_is_stored_as_none() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    for name in ["First", "Second"] {
        let resp = driver
            .post_form(
                "/admin/dashboard/links",
                &[
                    ("name", name),
                    ("url", "https://clinic.example/"),
                    ("key", "   "),
                    ("type", "clinic"),
                ],
            )
            .await;
        assert_eq!(resp.status(), 303);
    }

    let links = server.db().list_links().await.unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|l| l.key.is_none()));
    assert!(links.iter().all(|l| l.link_type == LinkType::Clinic));

    let page = driver.get_text("/admin/dashboard/links").await;
    assert!(page.contains("Created successfully"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn link_without_url_is_rejected_with_notice() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver
        .post_form(
            "/admin/dashboard/links",
            &[("name", "No url"), ("url", ""), ("type", "affiliate")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert!(server.db().list_links().await.unwrap().is_empty());

    let page = driver.get_text("/admin/dashboard/links").await;
    assert!(page.contains("Name and URL are required"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn media_source_lifecycle() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver
        .post_form(
            "/admin/dashboard/media",
            &[("name", ""), ("url", ""), ("type", "japanese_media")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    let page = driver.get_text("/admin/dashboard/media").await;
    assert!(page.contains("名称とURLは必須です"));

    driver
        .post_form(
            "/admin/dashboard/media",
            &[
                ("name", "Korea Beauty"),
                ("url", "https://korea-beauty.example/"),
                ("type", "korean_media"),
            ],
        )
        .await;
    let sources = server.db().list_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    let id = sources[0].id;
    assert!(sources[0].is_active);

    driver
        .post_form(&format!("/admin/dashboard/media/{id}/toggle"), &[])
        .await;
    assert!(!server.db().get_source(id).await.unwrap().unwrap().is_active);
    assert!(server.db().list_active_sources().await.unwrap().is_empty());

    let page = driver.get_text("/admin/dashboard/media").await;
    assert!(page.contains("KOREA"));

    driver
        .post_form(&format!("/admin/dashboard/media/{id}/delete"), &[])
        .await;
    assert!(server.db().list_sources().await.unwrap().is_empty());
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn recommendations_hide_registered_urls_and_can_be_added() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let page = driver
        .get_text("/admin/dashboard/media/recommendations")
        .await;
    assert!(page.contains("Beauty Times"));
    assert!(page.contains("Keyword: 美容 ニュース"));

    let resp = driver
        .post_form(
            "/admin/dashboard/media/recommendations",
            &[("name", "Beauty Times"), ("url", "https://beauty-times.example/")],
        )
        .await;
    assert_eq!(resp.status(), 303);
    let sources = server.db().list_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].is_active);

    let page = driver
        .get_text("/admin/dashboard/media/recommendations")
        .await;
    assert!(page.contains("Skin Lab"));
    assert!(!page.contains("Keyword: 美容 ニュース"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn crawl_flashes_engine_message() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let resp = driver.post_form("/admin/dashboard/media/crawl", &[]).await;
    assert_eq!(resp.status(), 303);
    let page = driver.get_text("/admin/dashboard/media").await;
    assert!(page.contains("開始しました: crawl queued"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn persona_prompt_save_and_reset() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    let page = driver.get_text("/admin/dashboard/ai-settings").await;
    assert!(page.contains("Never"));

    driver
        .post_form(
            "/admin/dashboard/ai-settings",
            &[("prompt", "あなたはテスト編集長です。{keyword}")],
        )
        .await;
    assert_eq!(
        server.db().get_persona_prompt().await.unwrap(),
        "あなたはテスト編集長です。{keyword}"
    );
    let page = driver.get_text("/admin/dashboard/ai-settings").await;
    assert!(page.contains("次回の記事生成から反映されます"));

    let resp = driver
        .post_form("/admin/dashboard/ai-settings/reset", &[])
        .await;
    assert_eq!(resp.status(), 200);
    let page = resp.text().await.unwrap();
    assert!(page.contains("編集長「美咲（みさき）」"));
    // not saved
    assert_eq!(
        server.db().get_persona_prompt().await.unwrap(),
        "あなたはテスト編集長です。{keyword}"
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn site_settings_feed_the_public_head() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    driver
        .post_form(
            "/admin/dashboard/settings",
            &[
                ("title", "AURA Staging"),
                ("description", "テスト用の説明"),
                ("og_image", "https://img.example/og.png"),
                ("twitter_handle", "@aura_staging"),
            ],
        )
        .await;

    let record = server
        .db()
        .get_setting("site_settings")
        .await
        .unwrap()
        .unwrap();
    assert!(record.value.contains("\"twitterHandle\":\"@aura_staging\""));
    assert_eq!(
        record.description.as_deref(),
        Some("サイト全体の設定（SEO, Meta）")
    );

    let home = server.driver().get_text("/").await;
    assert!(home.contains("<title>AURA Staging</title>"));
    assert!(home.contains("https://img.example/og.png"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dashboard_generate_requires_keyword() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    driver
        .post_form("/admin/dashboard/generate", &[("keyword", " ")])
        .await;
    let page = driver.get_text("/admin/dashboard").await;
    assert!(page.contains("エラーが発生しました"));

    driver
        .post_form("/admin/dashboard/generate", &[("keyword", "水光注射")])
        .await;
    let page = driver.get_text("/admin/dashboard").await;
    assert!(page.contains("生成を開始しました: 水光注射"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn recent_articles_json_lists_newest_ten() {
    let server = TestServer::start().await;
    let driver = server.driver();
    driver.login().await;

    for i in 0..12 {
        seed_article(&server, &format!("記事 {i}"), ArticleStatus::PendingReview).await;
    }

    let resp = driver.get("/api/dashboard/articles").await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 10);
    assert_eq!(articles[0]["title"], "記事 11");
    assert_eq!(articles[0]["status"], "pending_review");

    let fragment = driver.get_text("/admin/dashboard/recent").await;
    assert_eq!(fragment.matches("o-recentArticles__item").count(), 5);

    let all = server
        .db()
        .list_articles(ArticleFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 12);
}
