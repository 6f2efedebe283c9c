use aura_core::{CategoryId, Timestamp};
use redb_bincode::ReadableTable as _;
use tracing::info;

use crate::{
    CategoryRecord, Database, DbResult, LOG_TARGET, categories, categories_by_name, id_sequences,
    required_field,
};

const CATEGORIES_SEQ: &str = "categories";

impl Database {
    /// All categories, sorted by name
    pub async fn list_categories(&self) -> DbResult<Vec<CategoryRecord>> {
        let mut ret = self
            .read_with(|tx| {
                let categories_tbl = tx.open_table(&categories::TABLE)?;
                let mut ret = vec![];
                for entry in categories_tbl.range(..)? {
                    let (_, v) = entry?;
                    ret.push(v.value());
                }
                Ok(ret)
            })
            .await?;
        ret.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(ret)
    }

    pub async fn get_category(&self, id: CategoryId) -> DbResult<Option<CategoryRecord>> {
        self.read_with(|tx| {
            let categories_tbl = tx.open_table(&categories::TABLE)?;
            Ok(categories_tbl.get(&id)?.map(|g| g.value()))
        })
        .await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> DbResult<Option<CategoryRecord>> {
        self.read_with(|tx| {
            let categories_tbl = tx.open_table(&categories::TABLE)?;
            for entry in categories_tbl.range(..)? {
                let (_, v) = entry?;
                let category = v.value();
                if category.slug == slug {
                    return Ok(Some(category));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Return the category with this name (compared case-insensitively), or
    /// create it
    pub async fn find_or_create_category(&self, name: &str) -> DbResult<CategoryRecord> {
        let name = required_field(name, "Category name is required")?;
        let name_key = name.to_lowercase();

        self.write_with(|tx| {
            let mut id_sequences_tbl = tx.open_table(&id_sequences::TABLE)?;
            let mut categories_tbl = tx.open_table(&categories::TABLE)?;
            let mut categories_by_name_tbl = tx.open_table(&categories_by_name::TABLE)?;

            if let Some(existing_id) = categories_by_name_tbl.get(&name_key)?.map(|g| g.value()) {
                if let Some(existing) = categories_tbl.get(&existing_id)?.map(|g| g.value()) {
                    return Ok(existing);
                }
            }

            let id = CategoryId::from(Self::next_id_tx(CATEGORIES_SEQ, &mut id_sequences_tbl)?);

            let mut slug = slug::slugify(&name);
            let slug_taken = {
                let mut taken = false;
                for entry in categories_tbl.range(..)? {
                    let (_, v) = entry?;
                    if v.value().slug == slug {
                        taken = true;
                        break;
                    }
                }
                taken
            };
            if slug.is_empty() || slug_taken {
                slug = if slug.is_empty() {
                    format!("category-{id}")
                } else {
                    format!("{slug}-{id}")
                };
            }

            let record = CategoryRecord {
                id,
                name,
                slug,
                created_at: Timestamp::now(),
            };
            categories_tbl.insert(&id, &record)?;
            categories_by_name_tbl.insert(&name_key, &id)?;

            info!(target: LOG_TARGET, %id, name = %record.name, "Category created");
            Ok(record)
        })
        .await
    }
}
