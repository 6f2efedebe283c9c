use aura_core::link::normalize_link_key;
use aura_core::{LinkId, LinkType, Timestamp};
use redb_bincode::ReadableTable as _;
use snafu::OptionExt as _;
use tracing::{debug, info};

use crate::{
    Database, DbResult, LOG_TARGET, LinkInput, LinkKeyTakenSnafu, LinkRecord, NotFoundSnafu,
    id_sequences, links, links_by_key, required_field,
};

const LINKS_SEQ: &str = "links";
const LINK_REQUIRED_MSG: &str = "Name and URL are required";

impl Database {
    /// All links, newest first
    pub async fn list_links(&self) -> DbResult<Vec<LinkRecord>> {
        self.read_with(|tx| {
            let links_tbl = tx.open_table(&links::TABLE)?;
            let mut ret = vec![];
            for entry in links_tbl.range(..)?.rev() {
                let (_, v) = entry?;
                ret.push(v.value());
            }
            Ok(ret)
        })
        .await
    }

    pub async fn get_link(&self, id: LinkId) -> DbResult<Option<LinkRecord>> {
        self.read_with(|tx| {
            let links_tbl = tx.open_table(&links::TABLE)?;
            Ok(links_tbl.get(&id)?.map(|g| g.value()))
        })
        .await
    }

    pub async fn create_link(&self, input: LinkInput) -> DbResult<LinkRecord> {
        let name = required_field(&input.name, LINK_REQUIRED_MSG)?;
        let url = required_field(&input.url, LINK_REQUIRED_MSG)?;
        let key = normalize_link_key(input.key.as_deref());

        self.write_with(|tx| {
            let mut id_sequences_tbl = tx.open_table(&id_sequences::TABLE)?;
            let mut links_tbl = tx.open_table(&links::TABLE)?;
            let mut links_by_key_tbl = tx.open_table(&links_by_key::TABLE)?;

            if let Some(key) = key.as_ref() {
                if links_by_key_tbl.get(key)?.is_some() {
                    return LinkKeyTakenSnafu { key: key.clone() }.fail();
                }
            }

            let id = LinkId::from(Self::next_id_tx(LINKS_SEQ, &mut id_sequences_tbl)?);
            let now = Timestamp::now();
            let record = LinkRecord {
                id,
                name,
                url,
                key,
                link_type: input.link_type,
                clicks: 0,
                created_at: now,
                updated_at: now,
            };
            links_tbl.insert(&id, &record)?;
            if let Some(key) = record.key.as_ref() {
                links_by_key_tbl.insert(key, &id)?;
            }

            info!(target: LOG_TARGET, %id, key = ?record.key, "Link created");
            Ok(record)
        })
        .await
    }

    pub async fn update_link(&self, id: LinkId, input: LinkInput) -> DbResult<LinkRecord> {
        let name = required_field(&input.name, LINK_REQUIRED_MSG)?;
        let url = required_field(&input.url, LINK_REQUIRED_MSG)?;
        let key = normalize_link_key(input.key.as_deref());

        self.write_with(|tx| {
            let mut links_tbl = tx.open_table(&links::TABLE)?;
            let mut links_by_key_tbl = tx.open_table(&links_by_key::TABLE)?;

            let old = links_tbl
                .get(&id)?
                .map(|g| g.value())
                .context(NotFoundSnafu {
                    kind: "Link",
                    id: id.to_string(),
                })?;

            if let Some(key) = key.as_ref() {
                if let Some(owner) = links_by_key_tbl.get(key)?.map(|g| g.value()) {
                    if owner != id {
                        return LinkKeyTakenSnafu { key: key.clone() }.fail();
                    }
                }
            }

            if let Some(old_key) = old.key.as_ref() {
                links_by_key_tbl.remove(old_key)?;
            }
            if let Some(key) = key.as_ref() {
                links_by_key_tbl.insert(key, &id)?;
            }

            let record = LinkRecord {
                name,
                url,
                key,
                link_type: input.link_type,
                updated_at: Timestamp::now(),
                ..old
            };
            links_tbl.insert(&id, &record)?;
            Ok(record)
        })
        .await
    }

    pub async fn delete_link(&self, id: LinkId) -> DbResult<LinkRecord> {
        self.write_with(|tx| {
            let mut links_tbl = tx.open_table(&links::TABLE)?;
            let mut links_by_key_tbl = tx.open_table(&links_by_key::TABLE)?;

            let record = links_tbl
                .remove(&id)?
                .map(|g| g.value())
                .context(NotFoundSnafu {
                    kind: "Link",
                    id: id.to_string(),
                })?;
            if let Some(key) = record.key.as_ref() {
                links_by_key_tbl.remove(key)?;
            }
            info!(target: LOG_TARGET, %id, "Link deleted");
            Ok(record)
        })
        .await
    }

    /// The most recently created link of a given type
    ///
    /// Used to pick the target of conversion banners.
    pub async fn latest_link_by_type(&self, link_type: LinkType) -> DbResult<Option<LinkRecord>> {
        self.read_with(|tx| {
            let links_tbl = tx.open_table(&links::TABLE)?;
            for entry in links_tbl.range(..)?.rev() {
                let (_, v) = entry?;
                let link = v.value();
                if link.link_type == link_type {
                    return Ok(Some(link));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Count a click on the link with this key and return it
    pub async fn register_link_click(&self, key: &str) -> DbResult<Option<LinkRecord>> {
        let Some(key) = normalize_link_key(Some(key)) else {
            return Ok(None);
        };
        self.write_with(|tx| {
            let links_by_key_tbl = tx.open_table(&links_by_key::TABLE)?;
            let mut links_tbl = tx.open_table(&links::TABLE)?;

            let Some(id) = links_by_key_tbl.get(&key)?.map(|g| g.value()) else {
                return Ok(None);
            };
            let Some(mut link) = links_tbl.get(&id)?.map(|g| g.value()) else {
                return Ok(None);
            };
            link.clicks = link.clicks.saturating_add(1);
            links_tbl.insert(&id, &link)?;
            debug!(target: LOG_TARGET, %id, clicks = link.clicks, "Link click");
            Ok(Some(link))
        })
        .await
    }
}
