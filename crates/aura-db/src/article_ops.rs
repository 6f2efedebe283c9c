use aura_core::{ArticleId, ArticleStatus, CategoryId, Timestamp};
use redb_bincode::{ReadableTable as _, WriteTransaction};
use snafu::OptionExt as _;
use tracing::info;

use crate::{
    ArticleFilter, ArticleRecord, ArticleUpdate, Database, DbResult, LOG_TARGET, NewArticle,
    NotFoundSnafu, articles, articles_by_created, articles_published, id_sequences,
    optional_field, required_field,
};

const ARTICLES_SEQ: &str = "articles";

impl Database {
    pub async fn insert_article(&self, new: NewArticle) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            let mut id_sequences_tbl = tx.open_table(&id_sequences::TABLE)?;
            let mut articles_tbl = tx.open_table(&articles::TABLE)?;
            let mut articles_by_created_tbl = tx.open_table(&articles_by_created::TABLE)?;
            let mut articles_published_tbl = tx.open_table(&articles_published::TABLE)?;

            let id = ArticleId::from(Self::next_id_tx(ARTICLES_SEQ, &mut id_sequences_tbl)?);
            let now = Timestamp::now();
            let record = ArticleRecord {
                id,
                title: required_field(&new.title, "Title is required")?,
                content: new.content,
                status: new.status,
                category_id: new.category_id,
                thumbnail_url: optional_field(new.thumbnail_url),
                source_url: optional_field(new.source_url),
                admin_feedback: None,
                generated_by: optional_field(new.generated_by),
                summary: optional_field(new.summary),
                created_at: now,
                updated_at: now,
                published_at: (new.status == ArticleStatus::Published).then_some(now),
            };

            articles_tbl.insert(&id, &record)?;
            articles_by_created_tbl.insert(&(now, id), &())?;
            Self::reindex_published_tx(None, Some(&record), &mut articles_published_tbl)?;

            info!(target: LOG_TARGET, %id, status = %record.status, "Article inserted");
            Ok(record)
        })
        .await
    }

    pub async fn get_article(&self, id: ArticleId) -> DbResult<Option<ArticleRecord>> {
        self.read_with(|tx| {
            let articles_tbl = tx.open_table(&articles::TABLE)?;
            Self::get_article_tx(id, &articles_tbl)
        })
        .await
    }

    pub(crate) fn get_article_tx(
        id: ArticleId,
        articles_tbl: &impl articles::ReadableTable,
    ) -> DbResult<Option<ArticleRecord>> {
        Ok(articles_tbl.get(&id)?.map(|g| g.value()))
    }

    /// Articles, newest created first
    pub async fn list_articles(&self, filter: ArticleFilter) -> DbResult<Vec<ArticleRecord>> {
        self.read_with(|tx| {
            let articles_tbl = tx.open_table(&articles::TABLE)?;
            let articles_by_created_tbl = tx.open_table(&articles_by_created::TABLE)?;

            let mut ret = vec![];
            for entry in articles_by_created_tbl.range(..)?.rev() {
                if filter.limit <= ret.len() {
                    break;
                }
                let (k, _) = entry?;
                let (_, id) = k.value();
                let Some(article) = Self::get_article_tx(id, &articles_tbl)? else {
                    continue;
                };
                let matches = match filter.status {
                    Some(status) => article.status == status,
                    None => article.status != ArticleStatus::Deleted,
                };
                if matches {
                    ret.push(article);
                }
            }
            Ok(ret)
        })
        .await
    }

    /// Published articles, most recently published first
    pub async fn list_published_articles(
        &self,
        category_id: Option<CategoryId>,
        limit: usize,
    ) -> DbResult<Vec<ArticleRecord>> {
        self.read_with(|tx| {
            let articles_tbl = tx.open_table(&articles::TABLE)?;
            let articles_published_tbl = tx.open_table(&articles_published::TABLE)?;

            let mut ret = vec![];
            for entry in articles_published_tbl.range(..)?.rev() {
                if limit <= ret.len() {
                    break;
                }
                let (k, _) = entry?;
                let (_, id) = k.value();
                let Some(article) = Self::get_article_tx(id, &articles_tbl)? else {
                    continue;
                };
                if category_id.is_some_and(|c| article.category_id != Some(c)) {
                    continue;
                }
                ret.push(article);
            }
            Ok(ret)
        })
        .await
    }

    pub async fn set_article_status(
        &self,
        id: ArticleId,
        status: ArticleStatus,
    ) -> DbResult<ArticleRecord> {
        let record = self
            .write_with(|tx| {
                Self::modify_article_tx(id, tx, |article| {
                    article.status = status;
                    Ok(())
                })
            })
            .await?;
        info!(target: LOG_TARGET, %id, %status, "Article status changed");
        Ok(record)
    }

    /// Mark as deleted, keeping the row
    pub async fn soft_delete_article(&self, id: ArticleId) -> DbResult<ArticleRecord> {
        self.set_article_status(id, ArticleStatus::Deleted).await
    }

    /// Bring an article back to `draft`, from the trash or anywhere else
    pub async fn restore_article(&self, id: ArticleId) -> DbResult<ArticleRecord> {
        self.set_article_status(id, ArticleStatus::Draft).await
    }

    /// Remove the row and its index entries
    pub async fn delete_article_permanently(&self, id: ArticleId) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            let mut articles_tbl = tx.open_table(&articles::TABLE)?;
            let mut articles_by_created_tbl = tx.open_table(&articles_by_created::TABLE)?;
            let mut articles_published_tbl = tx.open_table(&articles_published::TABLE)?;

            let record = articles_tbl
                .remove(&id)?
                .map(|g| g.value())
                .context(NotFoundSnafu {
                    kind: "Article",
                    id: id.to_string(),
                })?;
            articles_by_created_tbl.remove(&(record.created_at, id))?;
            Self::reindex_published_tx(Some(&record), None, &mut articles_published_tbl)?;

            info!(target: LOG_TARGET, %id, "Article permanently deleted");
            Ok(record)
        })
        .await
    }

    pub async fn update_article(
        &self,
        id: ArticleId,
        update: ArticleUpdate,
    ) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            Self::modify_article_tx(id, tx, |article| {
                article.title = required_field(&update.title, "Title is required")?;
                article.content = update.content;
                article.thumbnail_url = optional_field(update.thumbnail_url);
                article.source_url = optional_field(update.source_url);
                article.summary = optional_field(update.summary);
                Ok(())
            })
        })
        .await
    }

    /// Replace the content with a revised version, remembering the feedback
    /// that produced it
    pub async fn replace_article_content(
        &self,
        id: ArticleId,
        content: String,
        feedback: Option<String>,
    ) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            Self::modify_article_tx(id, tx, |article| {
                article.content = content;
                if let Some(feedback) = optional_field(feedback) {
                    article.admin_feedback = Some(feedback);
                }
                Ok(())
            })
        })
        .await
    }

    /// Store reviewer feedback and send the article back to `draft`
    pub async fn record_article_feedback(
        &self,
        id: ArticleId,
        feedback: &str,
    ) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            Self::modify_article_tx(id, tx, |article| {
                article.admin_feedback =
                    Some(required_field(feedback, "Feedback is required")?);
                article.status = ArticleStatus::Draft;
                Ok(())
            })
        })
        .await
    }

    pub async fn set_article_category(
        &self,
        id: ArticleId,
        category_id: Option<CategoryId>,
    ) -> DbResult<ArticleRecord> {
        self.write_with(|tx| {
            Self::modify_article_tx(id, tx, |article| {
                article.category_id = category_id;
                Ok(())
            })
        })
        .await
    }

    /// Load, modify and store an article, keeping timestamps and indices in
    /// sync
    fn modify_article_tx(
        id: ArticleId,
        tx: &WriteTransaction,
        f: impl FnOnce(&mut ArticleRecord) -> DbResult<()>,
    ) -> DbResult<ArticleRecord> {
        let mut articles_tbl = tx.open_table(&articles::TABLE)?;
        let mut articles_published_tbl = tx.open_table(&articles_published::TABLE)?;

        let old = Self::get_article_tx(id, &articles_tbl)?.context(NotFoundSnafu {
            kind: "Article",
            id: id.to_string(),
        })?;

        let mut new = old.clone();
        f(&mut new)?;
        new.updated_at = Timestamp::now();
        if new.status == ArticleStatus::Published && new.published_at.is_none() {
            new.published_at = Some(new.updated_at);
        }

        articles_tbl.insert(&id, &new)?;
        Self::reindex_published_tx(Some(&old), Some(&new), &mut articles_published_tbl)?;

        Ok(new)
    }

    fn reindex_published_tx(
        old: Option<&ArticleRecord>,
        new: Option<&ArticleRecord>,
        articles_published_tbl: &mut articles_published::Table,
    ) -> DbResult<()> {
        fn index_key(article: &ArticleRecord) -> Option<(Timestamp, ArticleId)> {
            if article.status != ArticleStatus::Published {
                return None;
            }
            article.published_at.map(|ts| (ts, article.id))
        }

        if let Some(key) = old.and_then(index_key) {
            articles_published_tbl.remove(&key)?;
        }
        if let Some(key) = new.and_then(index_key) {
            articles_published_tbl.insert(&key, &())?;
        }
        Ok(())
    }
}
