//! Client for the AI article engine
//!
//! The engine is an external HTTP service doing all the "smart" work: trend
//! detection, article generation and revision, media crawling and media
//! recommendations. This crate wraps each of its endpoints in a single HTTP
//! call. Nothing is retried or queued.

use std::time::Duration;

use aura_util_error::FmtCompact as _;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
pub use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};
use tracing::{debug, warn};
use url::Url;

const LOG_TARGET: &str = "aura::engine";

pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:8000";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Keywords shown when the engine can't be reached for trends
pub const FALLBACK_TRENDS: [&str; 10] = [
    "(Fallback) 韓国肌管理",
    "ピコシュア",
    "ポテンツァ",
    "リジュラン",
    "脂肪吸引注射",
    "白玉点滴",
    "エクソソーム",
    "ショートスレッド",
    "GLP-1ダイエット",
    "眉アートメイク",
];

pub fn fallback_trends() -> Vec<String> {
    FALLBACK_TRENDS.iter().map(|s| (*s).to_owned()).collect()
}

#[derive(Debug, Snafu)]
pub enum EngineError {
    #[snafu(display("Invalid engine url"))]
    InvalidUrl { source: url::ParseError },
    #[snafu(display("Failed to build HTTP client"))]
    ClientBuild { source: reqwest::Error },
    #[snafu(display("Failed to connect to engine"))]
    Connect { source: reqwest::Error },
    #[snafu(display("Engine returned {status}: {body}"))]
    Status { status: StatusCode, body: String },
    #[snafu(display("Invalid engine JSON"))]
    Json { source: serde_json::Error },
    #[snafu(display("{message}"))]
    InvalidInput { message: &'static str },
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Raw engine response, passed through to callers unchanged
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Vec<u8>,
}

/// Request body sent to the engine, with the content type it was given
#[derive(Debug, Clone)]
pub struct ForwardedBody {
    pub content_type: Option<HeaderValue>,
    pub bytes: Vec<u8>,
}

impl ForwardedBody {
    pub fn json(bytes: Vec<u8>) -> Self {
        Self {
            content_type: Some(HeaderValue::from_static("application/json")),
            bytes,
        }
    }
}

impl ForwardedResponse {
    fn into_json<T: DeserializeOwned>(self) -> EngineResult<T> {
        if !self.status.is_success() {
            return StatusSnafu {
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            }
            .fail();
        }
        serde_json::from_slice(&self.body).context(JsonSnafu)
    }
}

/// Acknowledgement of a background job started by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineAck {
    pub status: Option<String>,
    pub message: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrendsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviseRequest {
    pub content: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviseResponse {
    pub revised_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRecommendation {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub query_used: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<MediaRecommendation>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EngineClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[bon::bon]
impl EngineClient {
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        api_key: Option<String>,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
    ) -> EngineResult<Self> {
        let mut base_url = Url::parse(&base_url).context(InvalidUrlSnafu)?;
        // Endpoints are joined relative to the base, so it must look like a
        // directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("aura/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

impl EngineClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> EngineResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .context(InvalidUrlSnafu)
    }

    /// Send a request to the engine and return its response verbatim
    ///
    /// Only the API key header is added, when one is configured.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        body: Option<ForwardedBody>,
    ) -> EngineResult<ForwardedResponse> {
        let url = self.endpoint(path)?;
        debug!(target: LOG_TARGET, %method, %url, "Engine request");

        let mut req = self.client.request(method, url);
        if let Some(api_key) = self.api_key.as_deref() {
            req = req.header(API_KEY_HEADER, api_key);
        }
        if let Some(body) = body {
            if let Some(content_type) = body.content_type {
                req = req.header(CONTENT_TYPE, content_type);
            }
            req = req.body(body.bytes);
        }

        let resp = req.send().await.context(ConnectSnafu)?;
        let status = resp.status();
        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        let body = resp.bytes().await.context(ConnectSnafu)?.to_vec();

        if !status.is_success() {
            warn!(
                target: LOG_TARGET,
                %status,
                body = %String::from_utf8_lossy(&body),
                "Engine returned an error"
            );
        }

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        self.forward(Method::GET, path, None).await?.into_json()
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> EngineResult<T> {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .context(JsonSnafu)?
            .map(ForwardedBody::json);
        self.forward(Method::POST, path, body).await?.into_json()
    }

    pub async fn try_trends(&self) -> EngineResult<Vec<String>> {
        Ok(self.get_json::<TrendsResponse>("/trends").await?.keywords)
    }

    /// Trending keywords, or [`FALLBACK_TRENDS`] if the engine fails
    pub async fn trends(&self) -> Vec<String> {
        match self.try_trends().await {
            Ok(keywords) => keywords,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Trends unavailable, using fallback");
                fallback_trends()
            }
        }
    }

    /// Start generating an article about `keyword`
    pub async fn generate(&self, keyword: &str) -> EngineResult<EngineAck> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return InvalidInputSnafu {
                message: "Keyword is required",
            }
            .fail();
        }
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            keyword: &'a str,
        }
        self.post_json("/generate", Some(&GenerateRequest { keyword }))
            .await
    }

    /// Start generating articles for the top trending keywords
    pub async fn generate_bulk(&self) -> EngineResult<EngineAck> {
        self.post_json::<(), _>("/generate_bulk", None).await
    }

    /// Rewrite `content` following the reviewer `feedback`
    pub async fn revise(&self, content: &str, feedback: &str) -> EngineResult<String> {
        if content.trim().is_empty() || feedback.trim().is_empty() {
            return InvalidInputSnafu {
                message: "Missing content or feedback",
            }
            .fail();
        }
        let resp: ReviseResponse = self
            .post_json(
                "/revise",
                Some(&ReviseRequest {
                    content: content.to_owned(),
                    feedback: feedback.to_owned(),
                }),
            )
            .await?;
        Ok(resp.revised_content)
    }

    /// Ask the engine to crawl all active media sources
    pub async fn crawl_media(&self) -> EngineResult<EngineAck> {
        self.post_json::<(), _>("/media/crawl", None).await
    }

    pub async fn recommendations(&self) -> EngineResult<Vec<MediaRecommendation>> {
        Ok(self
            .get_json::<RecommendationsResponse>("/media/recommendations")
            .await?
            .recommendations)
    }
}
