//! Study roadmap document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, timestamp, Record};
use crate::types::EntityKind;

/// A versioned study plan owned by one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    #[serde(default)]
    pub id: Option<String>,
    pub student_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub approved_by: Option<String>,
}

fn first_version() -> u32 {
    1
}

impl Roadmap {
    pub fn new(student_id: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            student_id: student_id.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            version: first_version(),
            approved_by: None,
        }
    }

    /// Version the next revision will carry, or `None` once the counter is exhausted
    pub fn next_version(&self) -> Option<u32> {
        self.version.checked_add(1)
    }

    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }
}

impl Record for Roadmap {
    const KIND: EntityKind = EntityKind::Roadmap;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.student_id)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}
