use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Lifecycle status of an article
///
/// Transitions are not checked: any status can be set from any other one.
/// `Deleted` is a soft-delete marker, the row itself stays in the store until
/// it is removed permanently.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[default]
    Draft,
    PendingReview,
    Approved,
    Published,
    Deleted,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 5] = [
        ArticleStatus::Draft,
        ArticleStatus::PendingReview,
        ArticleStatus::Approved,
        ArticleStatus::Published,
        ArticleStatus::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::PendingReview => "pending_review",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Published => "published",
            ArticleStatus::Deleted => "deleted",
        }
    }

    /// Label used in the admin UI
    pub fn label(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "下書き",
            ArticleStatus::PendingReview => "レビュー待ち",
            ArticleStatus::Approved => "承認済み",
            ArticleStatus::Published => "公開中",
            ArticleStatus::Deleted => "ゴミ箱",
        }
    }

    /// Only published articles are visible to the public
    pub fn is_public(self) -> bool {
        self == ArticleStatus::Published
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown article status: {value}"))]
pub struct UnknownStatusError {
    value: String,
}

impl FromStr for ArticleStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatusSnafu { value: s }.build())
    }
}

/// Fallback summary: the first 100 characters of the content, followed by
/// `...`
pub fn summarize(content: &str) -> String {
    let mut summary: String = content.chars().take(100).collect();
    summary.push_str("...");
    summary
}
