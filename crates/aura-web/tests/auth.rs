mod common;

use common::{ADMIN_PASSWORD, TestServer, location};

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dashboard_redirects_to_login_without_session() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let resp = driver.get("/admin/dashboard/articles?status=draft").await;
    assert_eq!(resp.status(), 303);
    let location = location(&resp);
    assert!(
        location.starts_with("/admin/login?redirect="),
        "Expected redirect to login, got {location}"
    );
    assert!(location.contains("%2Fadmin%2Fdashboard%2Farticles"));

    server.shutdown().await;
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn json_routes_answer_401_without_session() {
    let server = TestServer::start().await;
    let driver = server.driver();

    for path in ["/api/dashboard/articles", "/api/engine/trends"] {
        let resp = driver.get(path).await;
        assert_eq!(resp.status(), 401, "GET {path}");
    }
    let resp = driver
        .post_json("/api/engine/generate", &serde_json::json!({ "keyword": "x" }))
        .await;
    assert_eq!(resp.status(), 401);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn wrong_password_rerenders_form() {
    let server = TestServer::start().await;
    let driver = server.driver();

    let resp = driver
        .post_form("/admin/login", &[("password", "not it")])
        .await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Password Incorrect"));

    let resp = driver.get("/admin/dashboard").await;
    assert_eq!(resp.status(), 303);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn login_follows_safe_redirect_only() {
    let server = TestServer::start().await;

    let driver = server.driver();
    let resp = driver
        .post_form(
            "/admin/login",
            &[
                ("password", ADMIN_PASSWORD),
                ("redirect", "/admin/dashboard/links"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/dashboard/links");

    let driver = server.driver();
    let resp = driver
        .post_form(
            "/admin/login",
            &[
                ("password", ADMIN_PASSWORD),
                ("redirect", "https://evil.example/"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/dashboard");
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn logout_ends_the_session() {
    let server = TestServer::start().await;
    let driver = server.driver();

    driver.login().await;
    let body = driver.get_text("/admin/dashboard").await;
    assert!(body.contains("ログアウト"));
    // trends from the fake engine
    assert!(body.contains("#水光注射"));

    let resp = driver.post_form("/admin/logout", &[]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/login");

    let resp = driver.get("/admin/dashboard").await;
    assert_eq!(resp.status(), 303);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sessions_are_independent() {
    let server = TestServer::start().await;
    let admin = server.driver();
    let visitor = server.driver();

    admin.login().await;
    assert_eq!(admin.get("/admin/dashboard/links").await.status(), 200);
    assert_eq!(visitor.get("/admin/dashboard/links").await.status(), 303);
}
