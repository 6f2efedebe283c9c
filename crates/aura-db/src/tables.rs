use aura_core::{
    ArticleId, ArticleStatus, CategoryId, LinkId, LinkType, SourceId, SourceType, Timestamp,
};
use bincode::{Decode, Encode};
use serde::Serialize;

#[macro_export]
macro_rules! def_table {
    ($(#[$outer:meta])*
        $name:ident : $k:ty => $v:ty) => {
        #[allow(unused)]
        $(#[$outer])*
        pub mod $name {
            use super::*;
            pub type Key = $k;
            pub type Value = $v;
            pub type Definition<'a> = redb_bincode::TableDefinition<'a, Key, Value>;
            pub trait ReadableTable: redb_bincode::ReadableTable<Key, Value> {}
            impl<RT> ReadableTable for RT where RT: redb_bincode::ReadableTable<Key, Value> {}
            pub type Table<'a> = redb_bincode::Table<'a, Key, Value>;
            pub const TABLE: Definition = redb_bincode::TableDefinition::new(stringify!($name));
        }
    };
}

def_table! {
    /// Tracks database/schema version
    db_version: () => u64
}

def_table! {
    /// Last id handed out, per table name
    ///
    /// Ids are never reused, even after a row is permanently deleted.
    id_sequences: String => u64
}

// ARTICLES
def_table!(articles: ArticleId => ArticleRecord);
def_table!(articles_by_created: (Timestamp, ArticleId) => ());
def_table! {
    /// Index of articles with `published` status, by their publication time
    articles_published: (Timestamp, ArticleId) => ()
}

// CATEGORIES
def_table!(categories: CategoryId => CategoryRecord);
def_table! {
    /// Lowercased, trimmed category name to its id
    categories_by_name: String => CategoryId
}

// LINKS
def_table!(links: LinkId => LinkRecord);
def_table! {
    /// Non-empty link keys, unique across all links
    links_by_key: String => LinkId
}

// SOURCES
def_table!(sources: SourceId => SourceRecord);

// SETTINGS
def_table!(settings: String => SettingRecord);

// SESSIONS
def_table! {
    /// Admin web sessions, keyed by the session id
    sessions: i128 => SessionRecord
}

#[derive(Debug, Encode, Decode, Clone, Serialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub title: String,
    /// Markdown
    pub content: String,
    pub status: ArticleStatus,
    pub category_id: Option<CategoryId>,
    pub thumbnail_url: Option<String>,
    pub source_url: Option<String>,
    pub admin_feedback: Option<String>,
    pub generated_by: Option<String>,
    pub summary: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub published_at: Option<Timestamp>,
}

#[derive(Debug, Encode, Decode, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Encode, Decode, Clone, Serialize, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: LinkId,
    pub name: String,
    pub url: String,
    /// Never `Some("")`
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub clicks: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Encode, Decode, Clone, Serialize, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: SourceId,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub is_active: bool,
    pub last_crawled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Encode, Decode, Clone, Serialize, PartialEq, Eq)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: Timestamp,
}

#[derive(Debug, Encode, Decode, Clone, Serialize)]
pub struct SessionRecord {
    /// Session data as JSON
    pub data: Vec<u8>,
    /// Unix timestamp (seconds)
    pub expiry_unix: i64,
}
