use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bincode::{Decode, Encode};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Seconds since the Unix epoch, UTC
///
/// Serialized as an RFC 3339 string in human readable formats (JSON), and as
/// a plain integer otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub fn now() -> Self {
        Self(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        )
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn secs(self) -> u64 {
        self.0
    }

    pub fn to_offset_date_time(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(i64::try_from(self.0).ok()?).ok()
    }

    pub fn from_offset_date_time(dt: OffsetDateTime) -> Self {
        Self(u64::try_from(dt.unix_timestamp()).unwrap_or_default())
    }

    pub fn to_rfc3339(self) -> String {
        self.to_offset_date_time()
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, time::error::Parse> {
        Ok(Self::from_offset_date_time(OffsetDateTime::parse(
            s, &Rfc3339,
        )?))
    }

    /// `YYYY-MM-DD HH:MM` in UTC, for admin tables
    pub fn to_short_display(self) -> String {
        let dt = self.to_offset_date_time().unwrap_or(OffsetDateTime::UNIX_EPOCH);
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute()
        )
    }

    /// `YYYY.MM.DD`, as shown on public article cards
    pub fn to_date_display(self) -> String {
        let dt = self.to_offset_date_time().unwrap_or(OffsetDateTime::UNIX_EPOCH);
        format!("{:04}.{:02}.{:02}", dt.year(), u8::from(dt.month()), dt.day())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(dt: OffsetDateTime) -> Self {
        Self::from_offset_date_time(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if s.is_human_readable() {
            s.serialize_str(&self.to_rfc3339())
        } else {
            s.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Self::parse_rfc3339(&s).map_err(D::Error::custom)
        } else {
            Ok(Self(u64::deserialize(d)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_formatting() {
        let ts = Timestamp::from_secs(1_700_000_000);
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20Z");
        assert_eq!(Timestamp::parse_rfc3339("2023-11-14T22:13:20Z").unwrap(), ts);
        assert_eq!(ts.to_date_display(), "2023.11.14");
        assert_eq!(ts.to_short_display(), "2023-11-14 22:13");
    }

    #[test]
    fn json_uses_rfc3339() {
        let ts = Timestamp::from_secs(0);
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            "\"1970-01-01T00:00:00Z\""
        );
    }
}
