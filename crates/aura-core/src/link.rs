use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Kind of a managed outbound link
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Affiliate,
    Line,
    Clinic,
}

impl LinkType {
    pub const ALL: [LinkType; 3] = [LinkType::Affiliate, LinkType::Line, LinkType::Clinic];

    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Affiliate => "affiliate",
            LinkType::Line => "line",
            LinkType::Clinic => "clinic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LinkType::Affiliate => "アフィリエイト",
            LinkType::Line => "LINE公式",
            LinkType::Clinic => "クリニック",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown link type: {value}"))]
pub struct UnknownLinkTypeError {
    value: String,
}

impl FromStr for LinkType {
    type Err = UnknownLinkTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownLinkTypeSnafu { value: s }.build())
    }
}

/// Normalize a user-provided link key
///
/// Keys are trimmed, and an empty key means "no key".
pub fn normalize_link_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
}
