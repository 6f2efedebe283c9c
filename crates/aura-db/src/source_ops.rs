use aura_core::{SourceId, Timestamp};
use redb_bincode::{ReadableTable as _, WriteTransaction};
use snafu::OptionExt as _;
use tracing::info;

use crate::{
    Database, DbResult, LOG_TARGET, NotFoundSnafu, SourceInput, SourceRecord, id_sequences,
    required_field, sources,
};

const SOURCES_SEQ: &str = "sources";
const SOURCE_REQUIRED_MSG: &str = "名称とURLは必須です";

impl Database {
    /// All sources, newest first
    pub async fn list_sources(&self) -> DbResult<Vec<SourceRecord>> {
        self.read_with(|tx| {
            let sources_tbl = tx.open_table(&sources::TABLE)?;
            let mut ret = vec![];
            for entry in sources_tbl.range(..)?.rev() {
                let (_, v) = entry?;
                ret.push(v.value());
            }
            Ok(ret)
        })
        .await
    }

    pub async fn list_active_sources(&self) -> DbResult<Vec<SourceRecord>> {
        Ok(self
            .list_sources()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect())
    }

    pub async fn get_source(&self, id: SourceId) -> DbResult<Option<SourceRecord>> {
        self.read_with(|tx| {
            let sources_tbl = tx.open_table(&sources::TABLE)?;
            Ok(sources_tbl.get(&id)?.map(|g| g.value()))
        })
        .await
    }

    /// Register a new, active source
    pub async fn create_source(&self, input: SourceInput) -> DbResult<SourceRecord> {
        let name = required_field(&input.name, SOURCE_REQUIRED_MSG)?;
        let url = required_field(&input.url, SOURCE_REQUIRED_MSG)?;

        self.write_with(|tx| {
            let mut id_sequences_tbl = tx.open_table(&id_sequences::TABLE)?;
            let mut sources_tbl = tx.open_table(&sources::TABLE)?;

            let id = SourceId::from(Self::next_id_tx(SOURCES_SEQ, &mut id_sequences_tbl)?);
            let record = SourceRecord {
                id,
                name,
                url,
                source_type: input.source_type,
                is_active: true,
                last_crawled_at: None,
                created_at: Timestamp::now(),
            };
            sources_tbl.insert(&id, &record)?;
            info!(target: LOG_TARGET, %id, url = %record.url, "Source created");
            Ok(record)
        })
        .await
    }

    pub async fn update_source(&self, id: SourceId, input: SourceInput) -> DbResult<SourceRecord> {
        let name = required_field(&input.name, SOURCE_REQUIRED_MSG)?;
        let url = required_field(&input.url, SOURCE_REQUIRED_MSG)?;

        self.write_with(|tx| {
            Self::modify_source_tx(id, tx, |source| {
                source.name = name;
                source.url = url;
                source.source_type = input.source_type;
            })
        })
        .await
    }

    pub async fn set_source_active(&self, id: SourceId, is_active: bool) -> DbResult<SourceRecord> {
        self.write_with(|tx| Self::modify_source_tx(id, tx, |source| source.is_active = is_active))
            .await
    }

    pub async fn mark_source_crawled(&self, id: SourceId, ts: Timestamp) -> DbResult<SourceRecord> {
        self.write_with(|tx| {
            Self::modify_source_tx(id, tx, |source| source.last_crawled_at = Some(ts))
        })
        .await
    }

    pub async fn delete_source(&self, id: SourceId) -> DbResult<SourceRecord> {
        self.write_with(|tx| {
            let mut sources_tbl = tx.open_table(&sources::TABLE)?;
            let record = sources_tbl
                .remove(&id)?
                .map(|g| g.value())
                .context(NotFoundSnafu {
                    kind: "Source",
                    id: id.to_string(),
                })?;
            info!(target: LOG_TARGET, %id, "Source deleted");
            Ok(record)
        })
        .await
    }

    fn modify_source_tx(
        id: SourceId,
        tx: &WriteTransaction,
        f: impl FnOnce(&mut SourceRecord),
    ) -> DbResult<SourceRecord> {
        let mut sources_tbl = tx.open_table(&sources::TABLE)?;
        let mut record = sources_tbl
            .get(&id)?
            .map(|g| g.value())
            .context(NotFoundSnafu {
                kind: "Source",
                id: id.to_string(),
            })?;
        f(&mut record);
        sources_tbl.insert(&id, &record)?;
        Ok(record)
    }
}
