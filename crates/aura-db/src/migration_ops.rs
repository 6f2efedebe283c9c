use redb_bincode::{ReadableTable as _, WriteTransaction};
use tracing::{debug, info};

use crate::{
    Database, DbResult, DbVersionTooHighSnafu, LOG_TARGET, articles, articles_by_created,
    articles_published, categories, categories_by_name, db_version, id_sequences, links,
    links_by_key, sessions, settings, sources,
};

impl Database {
    pub(crate) fn init_tables_tx(tx: &WriteTransaction) -> DbResult<()> {
        tx.open_table(&db_version::TABLE)?;
        tx.open_table(&id_sequences::TABLE)?;

        tx.open_table(&articles::TABLE)?;
        tx.open_table(&articles_by_created::TABLE)?;
        tx.open_table(&articles_published::TABLE)?;

        tx.open_table(&categories::TABLE)?;
        tx.open_table(&categories_by_name::TABLE)?;

        tx.open_table(&links::TABLE)?;
        tx.open_table(&links_by_key::TABLE)?;

        tx.open_table(&sources::TABLE)?;
        tx.open_table(&settings::TABLE)?;
        tx.open_table(&sessions::TABLE)?;
        Ok(())
    }

    pub(crate) fn handle_db_ver_migrations(dbtx: &WriteTransaction) -> DbResult<()> {
        const DB_VER: u64 = 0;

        let mut table_db_ver = dbtx.open_table(&db_version::TABLE)?;

        let Some(cur_db_ver) = table_db_ver.first()?.map(|g| g.1.value()) else {
            info!(target: LOG_TARGET, "Initializing new database");
            table_db_ver.insert(&(), &DB_VER)?;

            return Ok(());
        };

        if DB_VER < cur_db_ver {
            return DbVersionTooHighSnafu {
                db_ver: cur_db_ver,
                code_ver: DB_VER,
            }
            .fail();
        }

        // Forward migrations go here, one step per version, once `DB_VER` is
        // bumped.

        table_db_ver.insert(&(), &DB_VER)?;
        debug!(target: LOG_TARGET, db_ver = DB_VER, "Db version");

        Ok(())
    }
}
