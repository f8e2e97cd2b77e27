//! Stakeholder feedback on a roadmap

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, timestamp, Record};
use crate::types::{EntityKind, SourceType};

/// Feedback from a teacher, parent or the student themselves.
///
/// Append-only: reconciliation never rewrites an existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub id: Option<String>,
    pub student_id: String,
    pub roadmap_id: String,
    pub source_type: SourceType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub response: Option<String>,
}

impl Feedback {
    pub fn new(
        student_id: impl Into<String>,
        roadmap_id: impl Into<String>,
        source_type: SourceType,
        source_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            student_id: student_id.into(),
            roadmap_id: roadmap_id.into(),
            source_type,
            source_id: source_id.into(),
            content: content.into(),
            created_at: Utc::now(),
            processed: false,
            response: None,
        }
    }

    /// Attach the generated reply and mark processed
    pub fn respond(&mut self, response: String) {
        self.response = Some(response);
        self.processed = true;
    }
}

impl Record for Feedback {
    const KIND: EntityKind = EntityKind::Feedback;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.student_id)
    }
}
