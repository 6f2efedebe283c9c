use redb_bincode::ReadableTable as _;

use crate::{Database, DbResult, SessionRecord, sessions};

impl Database {
    pub async fn save_session(&self, id: i128, record: SessionRecord) -> DbResult<()> {
        self.write_with(|tx| {
            let mut sessions_tbl = tx.open_table(&sessions::TABLE)?;
            sessions_tbl.insert(&id, &record)?;
            Ok(())
        })
        .await
    }

    /// Load a session, ignoring it if it expired before `now_unix`
    pub async fn load_session(&self, id: i128, now_unix: i64) -> DbResult<Option<SessionRecord>> {
        self.read_with(|tx| {
            let sessions_tbl = tx.open_table(&sessions::TABLE)?;
            Ok(sessions_tbl
                .get(&id)?
                .map(|g| g.value())
                .filter(|record| now_unix <= record.expiry_unix))
        })
        .await
    }

    pub async fn delete_session(&self, id: i128) -> DbResult<()> {
        self.write_with(|tx| {
            let mut sessions_tbl = tx.open_table(&sessions::TABLE)?;
            sessions_tbl.remove(&id)?;
            Ok(())
        })
        .await
    }

    /// Drop all sessions that expired before `now_unix`, returning how many
    pub async fn delete_expired_sessions(&self, now_unix: i64) -> DbResult<usize> {
        self.write_with(|tx| {
            let mut sessions_tbl = tx.open_table(&sessions::TABLE)?;
            let mut expired = vec![];
            for entry in sessions_tbl.range(..)? {
                let (k, v) = entry?;
                if v.value().expiry_unix < now_unix {
                    expired.push(k.value());
                }
            }
            for id in &expired {
                sessions_tbl.remove(id)?;
            }
            Ok(expired.len())
        })
        .await
    }
}
