pub mod article;
pub mod link;
pub mod settings;
pub mod source;
mod timestamp;

pub use self::article::ArticleStatus;
pub use self::link::LinkType;
pub use self::settings::SiteSettings;
pub use self::source::SourceType;
pub use self::timestamp::Timestamp;

/// Define a `u64` row id newtype
///
/// Row ids are assigned by the store, never reused, and rendered as plain
/// decimal numbers in URLs and JSON.
#[macro_export]
macro_rules! define_id_type {
    (
        $(#[$outer:meta])*
        struct $t:ident
    ) => {
        $(#[$outer])*
        #[derive(
            Copy,
            Clone,
            Debug,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            ::bincode::Encode,
            ::bincode::Decode,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(u64);

        impl $t {
            pub const ZERO: Self = Self(0);
            pub const MAX: Self = Self(u64::MAX);

            pub const fn new(v: u64) -> Self {
                Self(v)
            }

            pub const fn to_u64(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $t {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }

        impl From<$t> for u64 {
            fn from(v: $t) -> Self {
                v.0
            }
        }

        impl ::std::fmt::Display for $t {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::str::FromStr for $t {
            type Err = ::std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id_type!(
    /// Id of a row in the `articles` table
    struct ArticleId
);
define_id_type!(
    /// Id of a row in the `categories` table
    struct CategoryId
);
define_id_type!(
    /// Id of a row in the `links` table
    struct LinkId
);
define_id_type!(
    /// Id of a row in the `sources` table
    struct SourceId
);
