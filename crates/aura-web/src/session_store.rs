//! Admin sessions persisted in the main database, so logins survive restarts

use std::sync::Arc;

use async_trait::async_trait;
use aura_db::{Database, SessionRecord};
use time::OffsetDateTime;
use tower_sessions_core::ExpiredDeletion;
use tower_sessions_core::session::{Id, Record};
use tower_sessions_core::session_store::{self, SessionStore};
use tracing::debug;

use crate::LOG_TARGET;

fn backend_err(err: impl std::fmt::Display) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

fn to_stored(record: &Record) -> session_store::Result<SessionRecord> {
    Ok(SessionRecord {
        data: serde_json::to_vec(&record.data).map_err(backend_err)?,
        expiry_unix: record.expiry_date.unix_timestamp(),
    })
}

fn from_stored(id: Id, stored: SessionRecord) -> session_store::Result<Record> {
    Ok(Record {
        id,
        data: serde_json::from_slice(&stored.data).map_err(backend_err)?,
        expiry_date: OffsetDateTime::from_unix_timestamp(stored.expiry_unix)
            .map_err(backend_err)?,
    })
}

#[derive(Debug, Clone)]
pub struct DbSessionStore {
    db: Arc<Database>,
}

impl DbSessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        // Ids are random i128s; regenerate on the unlikely collision
        while self
            .db
            .load_session(record.id.0, i64::MIN)
            .await
            .map_err(backend_err)?
            .is_some()
        {
            record.id = Id::default();
        }
        self.save(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.db
            .save_session(record.id.0, to_stored(record)?)
            .await
            .map_err(backend_err)
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.db
            .load_session(session_id.0, now)
            .await
            .map_err(backend_err)?
            .map(|stored| from_stored(*session_id, stored))
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.db
            .delete_session(session_id.0)
            .await
            .map_err(backend_err)
    }
}

#[async_trait]
impl ExpiredDeletion for DbSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let count = self
            .db
            .delete_expired_sessions(now)
            .await
            .map_err(backend_err)?;
        if 0 < count {
            debug!(target: LOG_TARGET, count, "Deleted expired sessions");
        }
        Ok(())
    }
}
