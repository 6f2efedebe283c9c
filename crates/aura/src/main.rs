mod cli;

use std::io;

use aura_core::ArticleStatus;
use aura_db::{Database, DbError};
use aura_web::{Server, WebUiServerError};
use clap::Parser;
use cli::{Opts, make_web_opts};
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "aura::cli";

type WhateverResult<T> = std::result::Result<T, snafu::Whatever>;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("WebUI Server error: {source}"))]
    WebUiServer { source: WebUiServerError },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
    #[snafu(display("Data dir error: {source:?}"))]
    DataDir { source: io::Error },
    #[snafu(display("Database error: {source}"))]
    Database { source: DbError },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let v = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
    Ok(())
}

async fn open_db(opts: &Opts) -> CliResult<Database> {
    let db_path = Database::mk_db_path(opts.global.data_dir())
        .await
        .context(DataDirSnafu)?;
    Database::open(db_path).await.context(DatabaseSnafu)
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    Ok(match opts.cmd {
        cli::OptsCmd::Serve(ref serve_opts) => {
            let server = Server::init(make_web_opts(opts.global.data_dir(), serve_opts))
                .await
                .context(WebUiServerSnafu)?;

            info!(
                target: LOG_TARGET,
                url = %format!("http://{}", server.addr().context(WebUiServerSnafu)?),
                "Site available"
            );

            server.run().await.context(WebUiServerSnafu)?;

            serde_json::Value::Null
        }
        cli::OptsCmd::Publish { id } => {
            let db = open_db(&opts).await?;
            let article = db
                .set_article_status(id, ArticleStatus::Published)
                .await
                .context(DatabaseSnafu)?;

            serde_json::json!({
                "id": article.id,
                "title": article.title,
                "status": article.status.as_str(),
            })
        }
        cli::OptsCmd::Dev(ref cmd) => match cmd {
            cli::DevCmd::DbDump { table } => {
                let db = open_db(&opts).await?;
                let lines = db.dump_table(table).await.context(DatabaseSnafu)?;
                serde_json::to_value(lines).expect("Can't fail")
            }
            cli::DevCmd::Tables => {
                serde_json::to_value(Database::TABLE_NAMES).expect("Can't fail")
            }
        },
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
