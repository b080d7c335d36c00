//! Lenient serde helpers for loosely-specified provider responses.
//!
//! Providers send numbers as strings, booleans as 0/1 and `null` for
//! anything unknown. These helpers map all of that onto `Option`s so one odd
//! field never fails a whole document.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use steamstats_core::AppId;

/// Any JSON scalar; containers land in `Other`
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Scalar {
    fn into_i64(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            Self::Float(x) => Some(x.round() as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(b) => Some(i64::from(b)),
            Self::Other(_) => None,
        }
    }

    fn into_f64(self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(n as f64),
            Self::Float(x) => Some(x),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Other(_) => None,
        }
    }

    fn into_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Int(n) => Some(n != 0),
            Self::Text(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Self::Float(_) | Self::Other(_) => None,
        }
    }

    fn into_string(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(x) => Some(x.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Other(_) => None,
        }
    }
}

/// Integer; accepts numeric strings and rounds floats
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_i64))
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_f64))
}

/// Boolean; accepts 0/1 and "true"/"false"
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_bool))
}

/// String (numbers and booleans rendered as text)
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_string))
}

/// Positive identifier; anything else is `None`
pub fn lenient_appid<'de, D>(deserializer: D) -> Result<Option<AppId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(deserializer)?
        .and_then(|n| AppId::try_from(n).ok())
        .filter(|id| *id > 0))
}

/// Deserialize null as empty String
pub fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .and_then(Scalar::into_string)
        .unwrap_or_default())
}

/// Deserialize null as empty Vec (for optional Vec fields)
pub fn null_to_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// Nested object that falls back to its default when null or mistyped
pub fn lenient_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        log::debug!("ignoring malformed object: {e}");
        T::default()
    }))
}

/// Join names into one ", "-delimited string, blanks skipped
pub fn join_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Round to one decimal place
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
