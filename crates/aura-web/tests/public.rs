mod common;

use aura_core::{ArticleId, ArticleStatus, LinkType};
use aura_db::{ArticleUpdate, LinkInput, NewArticle};
use common::{TestServer, location};

async fn edit(server: &TestServer, id: ArticleId, content: &str) {
    let article = server.db().get_article(id).await.unwrap().unwrap();
    server
        .db()
        .update_article(
            id,
            ArticleUpdate {
                title: article.title,
                content: content.into(),
                thumbnail_url: article.thumbnail_url,
                source_url: article.source_url,
                summary: article.summary,
            },
        )
        .await
        .unwrap();
}

async fn seed(
    server: &TestServer,
    title: &str,
    status: ArticleStatus,
    category: Option<&str>,
) -> ArticleId {
    let category_id = match category {
        Some(name) => Some(
            server
                .db()
                .find_or_create_category(name)
                .await
                .unwrap()
                .id,
        ),
        None => None,
    };
    server
        .db()
        .insert_article(
            NewArticle::builder()
                .title(title)
                .content(format!("# {title}\n\n<script>alert(1)</script>本文"))
                .status(status)
                .maybe_category_id(category_id)
                .build(),
        )
        .await
        .unwrap()
        .id
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn home_lists_only_published_articles() {
    let server = TestServer::start().await;
    let driver = server.driver();

    seed(&server, "公開記事", ArticleStatus::Published, Some("Skincare")).await;
    seed(&server, "承認済み記事", ArticleStatus::Approved, None).await;
    seed(&server, "下書き記事", ArticleStatus::Draft, None).await;

    let body = driver.get_text("/").await;
    assert!(body.contains("BIKATSU CLUB"));
    assert!(body.contains("latest-topics-section"));
    assert!(body.contains("公開記事"));
    assert!(!body.contains("承認済み記事"));
    assert!(!body.contains("下書き記事"));
    assert!(body.contains("/blog?category=skincare"));
    // no clinic link yet
    assert!(body.contains("href=\"/clinics\""));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn blog_detail_hides_unpublished_from_visitors() {
    let server = TestServer::start().await;
    let visitor = server.driver();
    let admin = server.driver();
    admin.login().await;

    let draft = seed(&server, "非公開", ArticleStatus::PendingReview, None).await;
    let published = seed(&server, "公開中", ArticleStatus::Published, None).await;

    assert_eq!(visitor.get(&format!("/blog/{draft}")).await.status(), 404);
    assert_eq!(visitor.get("/blog/999999").await.status(), 404);

    let preview = admin.get_text(&format!("/blog/{draft}")).await;
    assert!(preview.contains("プレビュー表示中"));

    let page = visitor.get_text(&format!("/blog/{published}")).await;
    assert!(!page.contains("プレビュー表示中"));
    assert!(page.contains("公開中"));
    // fallbacks
    assert!(page.contains("Beauty"));
    assert!(page.contains("/assets/article_header_water_glow.svg"));
    assert!(page.contains("https://line.me/"));
    // raw html is not passed through
    assert!(!page.contains("<script>alert(1)</script>"));
    assert!(page.contains("og:title"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn blog_list_filters_by_category() {
    let server = TestServer::start().await;
    let driver = server.driver();

    seed(&server, "スキンケア記事", ArticleStatus::Published, Some("Skincare")).await;
    seed(&server, "ダイエット記事", ArticleStatus::Published, Some("Diet")).await;

    let all = driver.get_text("/blog").await;
    assert!(all.contains("スキンケア記事"));
    assert!(all.contains("ダイエット記事"));

    let filtered = driver.get_text("/blog?category=diet").await;
    assert!(filtered.contains("ダイエット記事"));
    assert!(!filtered.contains("スキンケア記事"));

    let unknown = driver.get_text("/blog?category=nope").await;
    assert!(!unknown.contains("スキンケア記事"));
    assert!(!unknown.contains("ダイエット記事"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn go_link_redirects_and_counts_clicks() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let link = server
        .db()
        .create_link(LinkInput {
            name: "LINE".into(),
            url: "https://line.example/aura".into(),
            key: Some("line-main".into()),
            link_type: LinkType::Line,
        })
        .await
        .unwrap();

    for _ in 0..2 {
        let resp = driver.get("/go/line-main").await;
        assert_eq!(resp.status(), 303);
        assert_eq!(location(&resp), "https://line.example/aura");
    }
    let link = server.db().get_link(link.id).await.unwrap().unwrap();
    assert_eq!(link.clicks, 2);

    assert_eq!(driver.get("/go/missing").await.status(), 404);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn conversion_banners_use_newest_links() {
    let server = TestServer::start().await;
    let driver = server.driver();

    for (name, url) in [
        ("old clinic", "https://clinic-old.example/"),
        ("new clinic", "https://clinic-new.example/"),
    ] {
        server
            .db()
            .create_link(LinkInput {
                name: name.into(),
                url: url.into(),
                key: None,
                link_type: LinkType::Clinic,
            })
            .await
            .unwrap();
    }

    let home = driver.get_text("/").await;
    assert!(home.contains("https://clinic-new.example/"));
    assert!(!home.contains("https://clinic-old.example/"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sitemap_contains_exactly_published_articles() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let published = seed(&server, "公開", ArticleStatus::Published, None).await;
    let approved = seed(&server, "承認", ArticleStatus::Approved, None).await;
    let deleted = seed(&server, "削除", ArticleStatus::Deleted, None).await;

    let resp = driver.get("/sitemap.xml").await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/xml")
    );
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<loc>https://aura.test</loc>"));
    assert!(body.contains("<loc>https://aura.test/#latest-topics-section</loc>"));
    assert!(body.contains(&format!("<loc>https://aura.test/blog/{published}</loc>")));
    assert!(!body.contains(&format!("/blog/{approved}<")));
    assert!(!body.contains(&format!("/blog/{deleted}<")));
    assert_eq!(body.matches("<changefreq>weekly</changefreq>").count(), 1);

    let article = server.db().get_article(published).await.unwrap().unwrap();
    assert!(body.contains(&format!(
        "<lastmod>{}</lastmod>",
        article.updated_at.to_rfc3339()
    )));

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    edit(&server, published, "改訂された本文").await;
    let edited = server.db().get_article(published).await.unwrap().unwrap();
    assert!(edited.updated_at > article.updated_at);

    let body = driver.get_text("/sitemap.xml").await;
    assert!(body.contains(&format!(
        "<lastmod>{}</lastmod>",
        edited.updated_at.to_rfc3339()
    )));
    assert!(!body.contains(&format!(
        "<lastmod>{}</lastmod>",
        article.updated_at.to_rfc3339()
    )));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn robots_and_feed() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let robots = driver.get_text("/robots.txt").await;
    assert!(robots.contains("Disallow: /admin/"));
    assert!(robots.contains("Disallow: /api/"));
    assert!(robots.contains("Sitemap: https://aura.test/sitemap.xml"));

    seed(&server, "フィード記事", ArticleStatus::Published, None).await;
    seed(&server, "下書き", ArticleStatus::Draft, None).await;
    let resp = driver.get("/feed.xml").await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/atom+xml")
    );
    let feed = resp.text().await.unwrap();
    assert!(feed.contains("フィード記事"));
    assert!(!feed.contains("下書き"));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn feed_updated_follows_latest_edit() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let older = seed(&server, "古い記事", ArticleStatus::Published, None).await;
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    seed(&server, "新しい記事", ArticleStatus::Published, None).await;
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    edit(&server, older, "追記しました").await;

    let older = server.db().get_article(older).await.unwrap().unwrap();
    let feed = driver.get_text("/feed.xml").await;
    let head = &feed[..feed.find("<entry").expect("Has entries")];
    assert!(
        head.contains(&format!("<updated>{}</updated>", older.updated_at.to_rfc3339())),
        "Feed head: {head}"
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn unknown_route_is_json_404() {
    let server = TestServer::start().await;
    let resp = server.driver().get("/no/such/page").await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Not Found");
}
