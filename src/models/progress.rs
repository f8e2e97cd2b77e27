//! Reported study progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{null_as_default, timestamp, Record};
use crate::types::EntityKind;

/// One progress submission for a (student, roadmap) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub id: Option<String>,
    pub student_id: String,
    pub roadmap_id: String,
    /// task id -> done
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_tasks: BTreeMap<String, bool>,
    /// subject -> minutes
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_spent: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assessment_results: Vec<AssessmentResult>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A quiz, test or practice score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AssessmentResult {
    pub fn new(name: impl Into<String>, score: f64, max_score: f64) -> Self {
        Self {
            name: name.into(),
            score: Some(score),
            max_score: Some(max_score),
            extra: BTreeMap::new(),
        }
    }

    /// Score as a percentage; a missing maximum is read as 100
    pub fn percentage(&self) -> Option<f64> {
        let score = self.score?;
        let max = self.max_score.unwrap_or(100.0);
        if max <= 0.0 {
            return None;
        }
        Some(score / max * 100.0)
    }
}

impl Progress {
    pub fn new(student_id: impl Into<String>, roadmap_id: impl Into<String>) -> Self {
        Self {
            id: None,
            student_id: student_id.into(),
            roadmap_id: roadmap_id.into(),
            completed_tasks: BTreeMap::new(),
            time_spent: BTreeMap::new(),
            assessment_results: Vec::new(),
            notes: None,
            updated_at: Utc::now(),
        }
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed_tasks
            .iter()
            .filter(|(_, done)| **done)
            .map(|(task, _)| task.as_str())
    }

    /// Markdown list of completed tasks, empty when none
    pub fn completed_summary(&self) -> String {
        self.completed()
            .map(|task| format!("- {}", task))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn time_summary(&self) -> String {
        self.time_spent
            .iter()
            .map(|(subject, minutes)| format!("- {}: {} min", subject, minutes))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn assessment_summary(&self) -> String {
        self.assessment_results
            .iter()
            .map(|a| match (a.score, a.percentage()) {
                (Some(score), Some(pct)) => format!(
                    "- {}: {} / {} ({:.0}%)",
                    a.name,
                    score,
                    a.max_score.unwrap_or(100.0),
                    pct
                ),
                _ => format!("- {}: no score", a.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Assessments scored under the given percentage
    pub fn below(&self, threshold: f64) -> Vec<&AssessmentResult> {
        self.assessment_results
            .iter()
            .filter(|a| a.percentage().map(|p| p < threshold).unwrap_or(false))
            .collect()
    }
}

impl Record for Progress {
    const KIND: EntityKind = EntityKind::Progress;

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
