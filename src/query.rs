//! Helpers for reading filter values from query strings.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, de};

/// Deserialize an optional query value, treating a missing or empty value as `None`.
///
/// Filter forms send every select element, so "no filter" arrives as `pet_id=`.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value: Option<String> = Option::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}
