use redb_bincode::{ReadTransaction, ReadableTable as _};

use crate::{
    Database, DbResult, UnknownTableSnafu, articles, articles_by_created, articles_published,
    categories, categories_by_name, db_version, id_sequences, links, links_by_key, sessions,
    settings, sources,
};

impl Database {
    pub const TABLE_NAMES: &[&str] = &[
        "db_version",
        "id_sequences",
        "articles",
        "articles_by_created",
        "articles_published",
        "categories",
        "categories_by_name",
        "links",
        "links_by_key",
        "sources",
        "settings",
        "sessions",
    ];

    /// Render every row of a table as `key => value` JSON lines
    pub async fn dump_table(&self, name: &str) -> DbResult<Vec<String>> {
        self.read_with(|tx| match name {
            "db_version" => Self::dump_table_dbtx(tx, &db_version::TABLE),
            "id_sequences" => Self::dump_table_dbtx(tx, &id_sequences::TABLE),
            "articles" => Self::dump_table_dbtx(tx, &articles::TABLE),
            "articles_by_created" => Self::dump_table_dbtx(tx, &articles_by_created::TABLE),
            "articles_published" => Self::dump_table_dbtx(tx, &articles_published::TABLE),
            "categories" => Self::dump_table_dbtx(tx, &categories::TABLE),
            "categories_by_name" => Self::dump_table_dbtx(tx, &categories_by_name::TABLE),
            "links" => Self::dump_table_dbtx(tx, &links::TABLE),
            "links_by_key" => Self::dump_table_dbtx(tx, &links_by_key::TABLE),
            "sources" => Self::dump_table_dbtx(tx, &sources::TABLE),
            "settings" => Self::dump_table_dbtx(tx, &settings::TABLE),
            "sessions" => Self::dump_table_dbtx(tx, &sessions::TABLE),
            _ => UnknownTableSnafu { name }.fail(),
        })
        .await
    }

    pub(crate) fn dump_table_dbtx<K, V>(
        dbtx: &ReadTransaction,
        def: &redb_bincode::TableDefinition<'_, K, V>,
    ) -> DbResult<Vec<String>>
    where
        V: bincode::Decode<()> + bincode::Encode + serde::Serialize,
        K: bincode::Decode<()> + bincode::Encode + serde::Serialize,
    {
        let tbl = dbtx.open_table(def)?;
        let mut ret = vec![];
        for record in tbl.range(..)? {
            let (k, v) = record?;
            ret.push(format!(
                "{} => {}",
                serde_json::to_string(&k.value()).expect("Can't fail"),
                serde_json::to_string(&v.value()).expect("Can't fail")
            ));
        }
        Ok(ret)
    }
}
