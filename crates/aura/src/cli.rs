use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use aura_core::ArticleId;
use clap::{Args, Parser, Subcommand};

/// Command line options for the AURA site server
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding the database
    #[arg(env = "AURA_DATA_DIR", long)]
    pub data_dir: Option<PathBuf>,
}

static PROJECTS_DIR: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("jp", "Aura", "aura").expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECTS_DIR
                .state_dir()
                .unwrap_or_else(|| PROJECTS_DIR.data_local_dir())
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Run the public site, the admin dashboard and the APIs
    Serve(ServeOpts),

    /// Mark an article as published
    Publish {
        #[arg(long)]
        id: ArticleId,
    },

    /// Development and debugging commands
    #[command(subcommand)]
    Dev(DevCmd),
}

#[derive(Debug, Args)]
pub struct ServeOpts {
    /// Listen address
    #[arg(long, short, default_value = "127.0.0.1:3000", env = "AURA_LISTEN")]
    pub listen: String,

    /// Set SO_REUSEPORT
    #[arg(long, env = "AURA_REUSEPORT")]
    pub reuseport: bool,

    /// Cors origin settings
    #[arg(long, env = "AURA_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Root directory of the assets dir
    #[arg(long, env = "AURA_ASSETS_DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Public URL of the site
    #[arg(long, default_value = "https://aura-beauty.jp", env = "AURA_BASE_URL")]
    pub base_url: String,

    /// Base URL of the article engine
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "AURA_ENGINE_URL")]
    pub engine_url: String,

    /// Shared key between the engine and the ingest API
    #[arg(long, env = "AURA_ENGINE_API_KEY", hide_env_values = true)]
    pub engine_api_key: Option<String>,

    /// Admin login email; when unset only the password is checked
    #[arg(long, env = "AURA_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "AURA_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,
}

pub fn make_web_opts(data_dir: &Path, opts: &ServeOpts) -> aura_web::Opts {
    aura_web::Opts::builder()
        .listen(opts.listen.clone())
        .maybe_cors_origin(opts.cors_origin.clone())
        .maybe_assets_dir(opts.assets_dir.clone())
        .reuseport(opts.reuseport)
        .data_dir(data_dir.to_owned())
        .base_url(opts.base_url.clone())
        .engine_url(opts.engine_url.clone())
        .maybe_engine_api_key(opts.engine_api_key.clone())
        .admin(aura_web::AdminCredentials::new(
            opts.admin_email.clone(),
            &opts.admin_password,
        ))
        .build()
}

#[derive(Debug, Subcommand)]
pub enum DevCmd {
    /// Print every entry of a database table
    DbDump {
        #[arg(long)]
        table: String,
    },
    /// List the names accepted by `db-dump`
    Tables,
}
