use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Kind of a media source the engine crawls
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    JapaneseMedia,
    KoreanMedia,
}

impl SourceType {
    pub const ALL: [SourceType; 2] = [SourceType::JapaneseMedia, SourceType::KoreanMedia];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::JapaneseMedia => "japanese_media",
            SourceType::KoreanMedia => "korean_media",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceType::JapaneseMedia => "国内メディア",
            SourceType::KoreanMedia => "韓国メディア",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown source type: {value}"))]
pub struct UnknownSourceTypeError {
    value: String,
}

impl FromStr for SourceType {
    type Err = UnknownSourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSourceTypeSnafu { value: s }.build())
    }
}
