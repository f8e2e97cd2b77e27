//! Entity models
//!
//! Four persisted entity kinds share the [`Record`] identity contract: an
//! opaque string id assigned at first save, an owning student, and an
//! optional `updated_at` the store refreshes on every write.

pub mod feedback;
pub mod progress;
pub mod roadmap;
pub mod student;

pub use feedback::Feedback;
pub use progress::{AssessmentResult, Progress};
pub use roadmap::Roadmap;
pub use student::{Goals, Performance, Student};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::EntityKind;

/// Identity and ownership rules every persisted entity follows
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Filename prefix and error label
    const KIND: EntityKind;

    /// Identifier, `None` until first save
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// Student this record belongs to (a student owns itself)
    fn owner_id(&self) -> Option<&str>;

    /// Refresh the store-owned modification time; no-op for kinds without one
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Timestamp used to pick the "latest" record of a student
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Accept either a bare string or a full mapping for free-form profile fields.
///
/// Forms submit plain text ("JEE prep") while stored records carry a mapping,
/// so a string is lifted into the type's `summary` field.
pub(crate) fn text_or_map<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned + Default + From<String>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::String(s) => Ok(T::from(s)),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// Read `null` the same as an absent field.
///
/// Older records write `"grade": null` or `"content": null` for blank values.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept RFC 3339 timestamps and offset-less ISO 8601 ones, read as UTC.
/// `null` reads as the Unix epoch so such records sort oldest.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(DateTime::<Utc>::default()),
        Some(raw) => parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render a JSON value as plain text for prompts
pub(crate) fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
