mod article_ops;
mod category_ops;
mod link_ops;
mod migration_ops;
mod session_ops;
mod setting_ops;
mod source_ops;
mod table_ops;
mod tables;

use std::io;
use std::path::{Path, PathBuf};

use aura_core::{ArticleStatus, CategoryId, LinkType, SourceType};
use aura_util_error::BoxedError;
use redb_bincode::{ReadTransaction, WriteTransaction};
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
use tokio::task::JoinError;
use tracing::{debug, instrument};

pub use self::tables::*;

const LOG_TARGET: &str = "aura::db";

#[derive(Debug, Snafu)]
pub enum DbError {
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        source: redb::TransactionError,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
    DbVersionTooHigh {
        db_ver: u64,
        code_ver: u64,
        #[snafu(implicit)]
        location: Location,
    },
    Join {
        source: JoinError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    DbTxLogic {
        source: BoxedError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(visibility(pub))]
    #[snafu(display("{kind} {id} not found"))]
    NotFound {
        kind: &'static str,
        id: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(visibility(pub))]
    #[snafu(display("Link key already in use: {key}"))]
    LinkKeyTaken { key: String },
    #[snafu(visibility(pub))]
    #[snafu(display("{message}"))]
    InvalidInput { message: String },
    #[snafu(display("Unknown table: {name}"))]
    UnknownTable { name: String },
    Overflow,
}
pub type DbResult<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Errors caused by the caller's input rather than the storage itself
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. } | DbError::LinkKeyTaken { .. } | DbError::InvalidInput { .. }
        )
    }
}

/// Article fields provided on creation
#[derive(Debug, Clone, bon::Builder)]
pub struct NewArticle {
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub content: String,
    #[builder(default = ArticleStatus::PendingReview)]
    pub status: ArticleStatus,
    pub category_id: Option<CategoryId>,
    pub thumbnail_url: Option<String>,
    pub source_url: Option<String>,
    pub generated_by: Option<String>,
    pub summary: Option<String>,
}

/// Admin-editable article fields
#[derive(Debug, Clone)]
pub struct ArticleUpdate {
    pub title: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub source_url: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ArticleFilter {
    /// `None` lists everything except soft-deleted articles
    pub status: Option<ArticleStatus>,
    pub limit: usize,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: usize::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkInput {
    pub name: String,
    pub url: String,
    pub key: Option<String>,
    pub link_type: LinkType,
}

#[derive(Debug, Clone)]
pub struct SourceInput {
    pub name: String,
    pub url: String,
    pub source_type: SourceType,
}

#[derive(Debug)]
pub struct Database {
    inner: redb_bincode::Database,
}

impl Database {
    pub async fn mk_db_path(data_dir: &Path) -> std::result::Result<PathBuf, io::Error> {
        tokio::fs::create_dir_all(&data_dir).await?;
        Ok(data_dir.join("aura.redb"))
    }

    #[instrument(skip_all)]
    pub async fn open(path: impl Into<PathBuf>) -> DbResult<Database> {
        let path = path.into();
        debug!(target: LOG_TARGET, path = %path.display(), "Opening database");
        let inner = tokio::task::spawn_blocking(move || redb_bincode::Database::create(path))
            .await
            .context(JoinSnafu)?
            .context(DatabaseSnafu)?;

        Self::write_with_inner(&inner, |tx| {
            Self::init_tables_tx(tx)?;
            Self::handle_db_ver_migrations(tx)?;
            Ok(())
        })
        .await?;

        Ok(Self { inner })
    }

    pub async fn write_with_inner<T>(
        inner: &redb_bincode::Database,
        f: impl FnOnce(&'_ WriteTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        tokio::task::block_in_place(|| {
            let dbtx = inner.begin_write().context(TransactionSnafu)?;
            let res = f(&dbtx)?;

            dbtx.commit().context(CommitSnafu)?;

            Ok(res)
        })
    }

    pub async fn write_with<T>(
        &self,
        f: impl FnOnce(&'_ WriteTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        Self::write_with_inner(&self.inner, f).await
    }

    pub async fn read_with_inner<T>(
        inner: &redb_bincode::Database,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        tokio::task::block_in_place(|| {
            let dbtx = inner.begin_read().context(TransactionSnafu)?;

            f(&dbtx)
        })
    }

    pub async fn read_with<T>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        Self::read_with_inner(&self.inner, f).await
    }

    /// Allocate the next id in the named sequence
    pub(crate) fn next_id_tx(
        sequence: &'static str,
        id_sequences_tbl: &mut id_sequences::Table,
    ) -> DbResult<u64> {
        let key = sequence.to_owned();
        let next = id_sequences_tbl
            .get(&key)?
            .map(|g| g.value())
            .unwrap_or_default()
            .checked_add(1)
            .context(OverflowSnafu)?;
        id_sequences_tbl.insert(&key, &next)?;
        Ok(next)
    }
}

/// Trim a required text field, failing with `message` when it ends up empty
pub(crate) fn required_field(value: &str, message: &str) -> DbResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return InvalidInputSnafu { message }.fail();
    }
    Ok(value.to_owned())
}

/// Normalize an optional text field: trimmed, with blank meaning `None`
pub(crate) fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
