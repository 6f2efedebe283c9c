mod error;
mod layout;
mod markdown;
mod routes;
mod serde_util;
mod session_store;

use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;
use std::{future, io};

use aura_db::{Database, DbError};
use aura_engine::{EngineClient, EngineError};
use aura_util_error::WhateverResult;
use axum::Router;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use snafu::{ResultExt as _, Snafu, Whatever};
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tower_http::CompressionLevel;
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::SizeAbove;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_core::ExpiredDeletion as _;
use tracing::{info, warn};

use crate::session_store::DbSessionStore;

const LOG_TARGET: &str = "aura::web";

pub const SESSION_COOKIE_NAME: &str = "aura_session";

fn default_aura_assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

/// Credentials of the single admin account
#[derive(Clone)]
pub struct AdminCredentials {
    /// When set, the login form must provide this email too
    pub email: Option<String>,
    password_hash: blake3::Hash,
}

impl AdminCredentials {
    pub fn new(email: Option<String>, password: &str) -> Self {
        Self {
            email: email
                .map(|e| e.trim().to_owned())
                .filter(|e| !e.is_empty()),
            password_hash: blake3::hash(password.as_bytes()),
        }
    }

    /// Compare credentials; the password comparison is constant-time
    pub fn verify(&self, email: Option<&str>, password: &str) -> bool {
        let email_ok = match self.email.as_deref() {
            Some(expected) => email.is_some_and(|e| e.trim().eq_ignore_ascii_case(expected)),
            None => true,
        };
        let password_ok = blake3::hash(password.as_bytes()) == self.password_hash;
        email_ok && password_ok
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, bon::Builder)]
pub struct Opts {
    #[builder(into)]
    pub listen: String,
    pub cors_origin: Option<String>,
    #[builder(default = default_aura_assets_dir())]
    assets_dir: PathBuf,
    #[builder(default)]
    pub reuseport: bool,
    pub data_dir: PathBuf,
    /// Public URL of the site, used in the sitemap, feed and robots.txt
    #[builder(into, default = "https://aura-beauty.jp".to_string())]
    pub base_url: String,
    #[builder(into, default = aura_engine::DEFAULT_ENGINE_URL.to_string())]
    pub engine_url: String,
    /// Sent to the engine, and required from it on the ingest API
    pub engine_api_key: Option<String>,
    #[builder(default = aura_engine::DEFAULT_TIMEOUT)]
    pub engine_timeout: Duration,
    pub admin: AdminCredentials,
}

impl Opts {
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Base URL without a trailing `/`
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn engine_api_key(&self) -> Option<&str> {
        self.engine_api_key.as_deref().filter(|k| !k.is_empty())
    }
}

pub struct UiState {
    db: Arc<Database>,
    engine: EngineClient,
    opts: Opts,
}

impl UiState {
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &EngineClient {
        &self.engine
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }
}

pub type SharedState = Arc<UiState>;

pub struct Server {
    listener: TcpListener,
    session_store: DbSessionStore,
    state: SharedState,
    opts: Opts,
}

#[derive(Debug, Snafu)]
pub enum WebUiServerError {
    #[snafu(transparent)]
    IO {
        source: io::Error,
    },

    ListenAddr {
        source: AddrParseError,
    },

    Cors {
        source: Whatever,
    },

    Database {
        source: DbError,
    },

    Engine {
        source: EngineError,
    },

    Join {
        source: JoinError,
    },
}

pub type ServerResult<T> = std::result::Result<T, WebUiServerError>;

impl Server {
    pub async fn init(opts: Opts) -> ServerResult<Server> {
        let listener = Self::get_listener(&opts).await?;

        let db = Database::open(Database::mk_db_path(&opts.data_dir).await?)
            .await
            .context(DatabaseSnafu)?;
        let db = Arc::new(db);

        let engine = EngineClient::builder()
            .base_url(opts.engine_url.clone())
            .maybe_api_key(opts.engine_api_key.clone())
            .timeout(opts.engine_timeout)
            .build()
            .context(EngineSnafu)?;

        let state = Arc::new(UiState {
            db: db.clone(),
            engine,
            opts: opts.clone(),
        });

        info!(target: LOG_TARGET, addr = %listener.local_addr()?, "Listening");
        Ok(Self {
            listener,
            session_store: DbSessionStore::new(db),
            state,
            opts,
        })
    }

    pub async fn get_listener(opts: &Opts) -> ServerResult<TcpListener> {
        let socket = {
            let addr = SocketAddr::from_str(&opts.listen).context(ListenAddrSnafu)?;

            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            if opts.reuseport {
                #[cfg(unix)]
                socket.set_reuseport(true)?;
            }
            socket.set_nodelay(true)?;

            socket.bind(addr)?;

            socket
        };

        Ok(socket.listen(1024)?)
    }

    pub fn addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    fn router(&self) -> ServerResult<Router> {
        let listen = self.addr()?;
        let session_layer = SessionManagerLayer::new(self.session_store.clone())
            .with_name(SESSION_COOKIE_NAME)
            .with_secure(false)
            .with_expiry(Expiry::OnInactivity(time::Duration::days(7)));

        Ok(Router::new()
            .merge(routes::route_handler(self.state.clone()))
            .nest_service("/assets", ServeDir::new(self.opts.assets_dir()))
            .layer(session_layer)
            .layer(cors_layer(&self.opts, listen)?)
            .layer(compression_layer()))
    }

    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    pub async fn run_with_shutdown(
        self,
        shutdown: impl future::Future<Output = ()> + Send + 'static,
    ) -> ServerResult<()> {
        let router = self.router()?;

        let deletion_task = tokio::task::spawn(
            self.session_store
                .clone()
                .continuously_delete_expired(Duration::from_secs(60 * 60)),
        );

        info!(target: LOG_TARGET, "Starting server");
        let res = axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        deletion_task.abort();
        if let Ok(Err(err)) = deletion_task.await {
            warn!(target: LOG_TARGET, %err, "Session cleanup task failed");
        }

        Ok(res?)
    }
}

/// A server running in the background
///
/// Mostly useful in tests, where it binds to an ephemeral port.
pub struct UiServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<ServerResult<()>>,
}

impl UiServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub async fn shutdown(self) -> ServerResult<()> {
        let _ = self.shutdown_tx.send(());
        self.handle.await.context(JoinSnafu)?
    }
}

pub async fn start_ui(opts: Opts) -> ServerResult<UiServer> {
    let server = Server::init(opts).await?;
    let addr = server.addr()?;
    let state = server.state().clone();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_with_shutdown(async move {
        let _ = shutdown_rx.await;
    }));

    Ok(UiServer {
        addr,
        state,
        shutdown_tx,
        handle,
    })
}

fn compression_layer() -> CompressionLayer<SizeAbove> {
    CompressionLayer::new()
        .quality(CompressionLevel::Precise(4))
        .compress_when(SizeAbove::new(512))
}

fn cors_layer(opts: &Opts, listen: SocketAddr) -> ServerResult<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(aura_engine::API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(86400))
        .allow_origin(opts.cors_origin(listen).context(CorsSnafu)?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
            Method::PATCH,
        ]))
}

impl Opts {
    pub fn cors_origin(&self, listen: SocketAddr) -> WhateverResult<HeaderValue> {
        self.cors_origin
            .clone()
            .unwrap_or_else(|| format!("http://{listen}"))
            .parse()
            .whatever_context("cors_origin does not parse as an http value")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target: LOG_TARGET, %err, "Failed to install Ctrl+C handler");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(target: LOG_TARGET, %err, "Failed to install SIGTERM handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
