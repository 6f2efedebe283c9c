#![allow(dead_code)]

use std::net::SocketAddr;

use aura_db::Database;
use aura_web::{AdminCredentials, Opts, UiServer};
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const ENGINE_API_KEY: &str = "engine-test-key";

/// Feedback that makes the fake engine fail a revision
pub const FAILING_FEEDBACK: &str = "please fail";

/// An in-process stand-in for the AI engine
pub struct FakeEngine {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// Routes answering like a healthy engine
pub fn fake_engine_router() -> axum::Router {
    axum::Router::new()
        .route(
            "/trends",
            get(|| async { Json(json!({ "keywords": ["水光注射", "ダーマペン"] })) }),
        )
        .route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "status": "started", "keyword": body["keyword"] }))
            }),
        )
        .route(
            "/generate_bulk",
            post(|| async {
                Json(json!({ "status": "started", "keywords": ["水光注射", "ダーマペン"] }))
            }),
        )
        .route("/revise", post(fake_revise))
        .route(
            "/media/crawl",
            post(|| async { Json(json!({ "message": "crawl queued" })) }),
        )
        .route(
            "/media/recommendations",
            get(|| async {
                Json(json!({
                    "recommendations": [
                        { "name": "Beauty Times", "url": "https://beauty-times.example/", "query_used": "美容 ニュース" },
                        { "name": "Skin Lab", "url": "https://skinlab.example/" }
                    ]
                }))
            }),
        )
}

impl FakeEngine {
    pub async fn start(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake engine");
        let addr = listener.local_addr().expect("Can't fail");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake engine failed");
        });

        Self { addr, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn fake_revise(Json(body): Json<Value>) -> axum::response::Response {
    let feedback = body["feedback"].as_str().unwrap_or_default();
    if feedback == FAILING_FEEDBACK {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded").into_response();
    }
    let content = body["content"].as_str().unwrap_or_default();
    Json(json!({ "revised_content": format!("{content}\n\n(revised: {feedback})") }))
        .into_response()
}

/// A test web server running on a random port with ephemeral storage.
pub struct TestServer {
    server: UiServer,
    engine: Option<FakeEngine>,
    _temp_dir: TempDir,
    base_url: String,
}

impl TestServer {
    /// Start with a working fake engine
    pub async fn start() -> Self {
        Self::start_with_engine(fake_engine_router()).await
    }

    /// Start with a fake engine serving `engine_routes`
    pub async fn start_with_engine(engine_routes: axum::Router) -> Self {
        let engine = FakeEngine::start(engine_routes).await;
        let engine_url = engine.url();
        Self::start_with(Some(engine), engine_url).await
    }

    /// Start with the engine pointing at a port nothing listens on
    pub async fn start_engine_offline() -> Self {
        let unused = std::net::TcpListener::bind("127.0.0.1:0")
            .expect("Failed to bind")
            .local_addr()
            .expect("Can't fail");
        Self::start_with(None, format!("http://{unused}")).await
    }

    async fn start_with(engine: Option<FakeEngine>, engine_url: String) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let opts = Opts::builder()
            .listen("127.0.0.1:0")
            .data_dir(temp_dir.path().to_path_buf())
            .base_url("https://aura.test")
            .engine_url(engine_url)
            .engine_api_key(ENGINE_API_KEY.to_string())
            .admin(AdminCredentials::new(None, ADMIN_PASSWORD))
            .build();

        let server = aura_web::start_ui(opts)
            .await
            .expect("Failed to start test server");
        let base_url = format!("http://{}", server.local_addr());

        Self {
            server,
            engine,
            _temp_dir: temp_dir,
            base_url,
        }
    }

    pub fn db(&self) -> &Database {
        self.server.state().db()
    }

    /// Create a new `UiDriver` with its own cookie jar (independent session).
    pub fn driver(&self) -> UiDriver {
        UiDriver::new(self.base_url.clone())
    }

    pub async fn shutdown(self) {
        self.server
            .shutdown()
            .await
            .expect("Server shutdown failed");
    }
}

/// HTTP client driver for interacting with the site in tests.
///
/// Each `UiDriver` maintains its own cookie jar, so it represents
/// an independent browser session.
pub struct UiDriver {
    client: reqwest::Client,
    base_url: String,
}

impl UiDriver {
    fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            // Don't auto-follow redirects, tests assert on redirect targets.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in as the admin and check we land on the dashboard
    pub async fn login(&self) {
        let resp = self
            .post_form("/admin/login", &[("password", ADMIN_PASSWORD)])
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/admin/dashboard");
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn get_text(&self, path: &str) -> String {
        let resp = self.get(path).await;
        assert_eq!(resp.status(), 200, "GET {path}");
        resp.text().await.expect("Failed to read body")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn ingest_get(&self, path: &str, api_key: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(api_key) = api_key {
            req = req.header("x-api-key", api_key);
        }
        req.send().await.expect("GET request failed")
    }

    pub async fn ingest_post(
        &self,
        path: &str,
        api_key: Option<&str>,
        body: &Value,
    ) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(api_key) = api_key {
            req = req.header("x-api-key", api_key);
        }
        req.send().await.expect("POST request failed")
    }
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .expect("Missing Location header")
        .to_str()
        .expect("Invalid Location header")
        .to_string()
}
