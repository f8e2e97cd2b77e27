//! Shared types used across modules
//!
//! This module contains types that are used by the models, the record store
//! and the lifecycle coordinator to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Kind of a persisted entity; doubles as the record filename prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Roadmap,
    Progress,
    Feedback,
}

impl EntityKind {
    /// Storage prefix used in `<kind>_<id>.json`
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Roadmap => "roadmap",
            EntityKind::Progress => "progress",
            EntityKind::Feedback => "feedback",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stakeholder that authored a piece of feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Teacher,
    Parent,
    Student,
}

impl SourceType {
    /// Parse from the lowercase wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "teacher" => Some(SourceType::Teacher),
            "parent" => Some(SourceType::Parent),
            "student" => Some(SourceType::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Teacher => "teacher",
            SourceType::Parent => "parent",
            SourceType::Student => "student",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Teacher => write!(f, "Teacher"),
            SourceType::Parent => write!(f, "Parent"),
            SourceType::Student => write!(f, "Student"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::parse(s).ok_or_else(|| {
            format!("unknown source type '{}' (expected teacher, parent or student)", s)
        })
    }
}
