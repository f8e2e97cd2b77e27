//! Student profile

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{null_as_default, text_or_map, value_text, Record};
use crate::types::EntityKind;

/// A registered student and the profile roadmaps are generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub grade: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subjects: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weaknesses: Vec<String>,
    #[serde(default, deserialize_with = "text_or_map")]
    pub goals: Goals,
    #[serde(default, deserialize_with = "text_or_map")]
    pub performance: Performance,
}

/// Academic goals: known fields plus whatever else the profile form sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_exam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_score: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Current performance: known fields plus per-subject or other extras
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Overall completion percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_progress: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl From<String> for Goals {
    fn from(summary: String) -> Self {
        Self {
            summary: Some(summary),
            ..Default::default()
        }
    }
}

impl From<String> for Performance {
    fn from(summary: String) -> Self {
        Self {
            summary: Some(summary),
            ..Default::default()
        }
    }
}

impl Goals {
    /// One-line description for prompts and templates
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(summary) = &self.summary {
            parts.push(summary.clone());
        }
        if let Some(exam) = &self.target_exam {
            parts.push(format!("target exam: {}", exam));
        }
        if let Some(score) = &self.target_score {
            parts.push(format!("target score: {}", score));
        }
        for (key, value) in &self.extra {
            parts.push(format!("{}: {}", key, value_text(value)));
        }
        if parts.is_empty() {
            "Not specified".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Performance {
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(summary) = &self.summary {
            parts.push(summary.clone());
        }
        if let Some(progress) = self.current_progress {
            parts.push(format!("overall progress {}%", progress));
        }
        for (key, value) in &self.extra {
            parts.push(format!("{}: {}", key, value_text(value)));
        }
        if parts.is_empty() {
            "Not specified".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Student {
    pub fn new(name: impl Into<String>, grade: impl Into<String>, subjects: Vec<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            grade: grade.into(),
            subjects,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            goals: Goals::default(),
            performance: Performance::default(),
        }
    }

    pub fn with_goals(mut self, goals: impl Into<String>) -> Self {
        self.goals = Goals::from(goals.into());
        self
    }

    pub fn with_strengths(mut self, strengths: Vec<String>) -> Self {
        self.strengths = strengths;
        self
    }

    pub fn with_weaknesses(mut self, weaknesses: Vec<String>) -> Self {
        self.weaknesses = weaknesses;
        self
    }

    /// Flatten the profile into template/prompt variables
    pub fn to_variables(&self) -> BTreeMap<String, String> {
        let join_or = |items: &[String]| {
            if items.is_empty() {
                "Not specified".to_string()
            } else {
                items.join(", ")
            }
        };

        let mut vars = BTreeMap::new();
        vars.insert("name".to_string(), self.display_name().to_string());
        vars.insert(
            "grade".to_string(),
            if self.grade.trim().is_empty() { "N/A".to_string() } else { self.grade.clone() },
        );
        vars.insert("subjects".to_string(), self.subjects.join(", "));
        vars.insert("strengths".to_string(), join_or(&self.strengths));
        vars.insert("weaknesses".to_string(), join_or(&self.weaknesses));
        vars.insert("goals".to_string(), self.goals.describe());
        vars.insert("performance".to_string(), self.performance.describe());
        vars
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Student"
        } else {
            &self.name
        }
    }
}

impl Record for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn owner_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
