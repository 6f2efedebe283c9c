use serde::de::IntoDeserializer as _;
use serde::{Deserialize, Deserializer};

/// Treat a blank form/query field as missing
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    if let Some(str) = Option::<String>::deserialize(deserializer)? {
        let str = str.trim();
        if str.is_empty() {
            Ok(None)
        } else {
            T::deserialize(str.into_deserializer()).map(Some)
        }
    } else {
        Ok(None)
    }
}

/// An HTML checkbox: present (with any value) means `true`
pub(crate) fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.is_some())
}
