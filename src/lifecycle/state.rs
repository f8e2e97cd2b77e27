//! Roadmap review state, derived from stored records

use serde::Serialize;

use crate::models::{Feedback, Roadmap};
use crate::types::SourceType;

/// Where a roadmap is in its review cycle. There is no terminal state; a
/// roadmap keeps accumulating revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapState {
    /// Freshly generated, no review feedback since
    Draft,
    /// Teacher or parent feedback arrived after the last save
    UnderReview,
    /// Content has been updated at least once and nothing is pending
    Revised,
}

impl RoadmapState {
    /// Derive the state from the roadmap and the feedback recorded against it.
    ///
    /// Only teacher and parent feedback put a roadmap under review; a
    /// student's own notes do not.
    pub fn derive(roadmap: &Roadmap, feedback: &[Feedback]) -> Self {
        let pending_review = feedback.iter().any(|f| {
            f.roadmap_id.as_str() == roadmap.id.as_deref().unwrap_or_default()
                && matches!(f.source_type, SourceType::Teacher | SourceType::Parent)
                && f.created_at > roadmap.updated_at
        });

        if pending_review {
            RoadmapState::UnderReview
        } else if roadmap.version > 1 {
            RoadmapState::Revised
        } else {
            RoadmapState::Draft
        }
    }
}

impl std::fmt::Display for RoadmapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoadmapState::Draft => write!(f, "draft"),
            RoadmapState::UnderReview => write!(f, "under review"),
            RoadmapState::Revised => write!(f, "revised"),
        }
    }
}
