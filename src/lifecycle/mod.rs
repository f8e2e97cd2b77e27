//! Lifecycle Coordinator - create, review, reconcile and revise roadmaps
//!
//! Every operation follows the same order: validate inputs against the
//! store, call the generation backend, and only then persist. A backend
//! failure therefore leaves every record exactly as it was.

pub mod state;

pub use state::RoadmapState;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::agent::{prompts, select_backends, Backends, GenerationError};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Feedback, Progress, Roadmap, Student};
use crate::store::RecordStore;
use crate::types::{EntityKind, SourceType};

/// A reconciled recommendation. Not persisted and not applied to the
/// roadmap; callers pass `content` to [`Coordinator::apply_update`] if wanted.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub roadmap_id: String,
    pub teacher_feedback_id: Option<String>,
    pub parent_feedback_id: Option<String>,
    pub student_input: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A stored progress submission and its analysis
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub progress: Progress,
    pub analysis: String,
}

/// What prompted a roadmap update; shown in the appended section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Progress,
    Feedback(SourceType),
    Reconciliation,
    Manual,
}

impl std::fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateSource::Progress => write!(f, "your progress"),
            UpdateSource::Feedback(source) => write!(f, "{} feedback", source.as_str()),
            UpdateSource::Reconciliation => write!(f, "reconciled feedback"),
            UpdateSource::Manual => write!(f, "a manual update"),
        }
    }
}

/// Runs roadmap lifecycle operations against a record store
pub struct Coordinator {
    store: RecordStore,
    backends: Backends,
}

impl Coordinator {
    pub fn new(store: RecordStore, backends: Backends) -> Self {
        Self { store, backends }
    }

    /// Build the store and backends from configuration and the stored API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let backends = select_backends(
            &config.generation,
            crate::security::keyring::get_api_key(),
        )?;
        Ok(Self::new(RecordStore::from_config(config), backends))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Save or update a student profile
    pub fn register_student(&self, student: &mut Student) -> Result<String> {
        let id = self.store.save(student)?;
        info!("Registered student {} ({})", student.display_name(), id);
        Ok(id)
    }

    /// Generate a new draft roadmap for a student.
    ///
    /// An unsaved profile is saved after generation succeeds.
    pub async fn generate(&self, student: &mut Student) -> Result<Roadmap> {
        let request = prompts::roadmap_request(student);
        let content = self
            .backends
            .text
            .generate_text(&request)
            .await
            .map_err(|e| generation_failed("roadmap generation", e))?;

        let student_id = match student.id.clone() {
            Some(id) => id,
            None => self.register_student(student)?,
        };

        let mut roadmap = Roadmap::new(student_id, content);
        let id = self.store.save(&mut roadmap)?;
        info!("Generated roadmap {} for {}", id, student.display_name());
        Ok(roadmap)
    }

    /// Generate a fresh roadmap from the stored profile
    pub async fn regenerate(&self, student_id: &str) -> Result<Roadmap> {
        let mut student: Student = self.store.get(student_id)?;
        self.generate(&mut student).await
    }

    /// Record one stakeholder's feedback together with a generated reply.
    ///
    /// Each item is answered on its own; the roadmap itself is not changed.
    pub async fn submit_feedback(
        &self,
        roadmap_id: &str,
        source_type: SourceType,
        source_id: &str,
        content: &str,
    ) -> Result<Feedback> {
        if content.trim().is_empty() {
            return Err(Error::MissingInput(format!(
                "{} feedback text for roadmap {}",
                source_type.as_str(),
                roadmap_id
            )));
        }

        let roadmap: Roadmap = self.store.get(roadmap_id)?;
        let mut feedback = Feedback::new(
            roadmap.student_id.clone(),
            roadmap_id,
            source_type,
            source_id,
            content.trim(),
        );

        let request = prompts::feedback_request(&roadmap, &feedback);
        let response = self
            .backends
            .text
            .generate_text(&request)
            .await
            .map_err(|e| generation_failed("feedback processing", e))?;

        feedback.respond(response);
        let id = self.store.save(&mut feedback)?;
        info!("Recorded {} feedback {} on roadmap {}", source_type.as_str(), id, roadmap_id);
        Ok(feedback)
    }

    /// Store a progress submission and analyse it.
    ///
    /// A blank `student_id` is taken from the roadmap; a roadmap owned by a
    /// different student is reported as not found.
    pub async fn submit_progress(&self, mut progress: Progress) -> Result<ProgressReport> {
        let roadmap: Roadmap = self.store.get(&progress.roadmap_id)?;
        if progress.student_id.trim().is_empty() {
            progress.student_id = roadmap.student_id.clone();
        } else if roadmap.student_id != progress.student_id {
            return Err(Error::NotFound {
                kind: EntityKind::Roadmap,
                id: progress.roadmap_id.clone(),
            });
        }

        let request = prompts::progress_request(&roadmap, &progress);
        let analysis = self
            .backends
            .analysis
            .generate_text(&request)
            .await
            .map_err(|e| generation_failed("progress analysis", e))?;

        let id = self.store.save(&mut progress)?;
        info!("Recorded progress {} for roadmap {}", id, progress.roadmap_id);
        Ok(ProgressReport { progress, analysis })
    }

    /// Balance the latest teacher and parent feedback with the student's input.
    ///
    /// Fails with `MissingInput` unless both teacher and parent feedback exist.
    pub async fn reconcile(&self, roadmap_id: &str, student_input: &str) -> Result<Reconciliation> {
        // NotFound for an unknown roadmap rather than a misleading MissingInput
        let _roadmap: Roadmap = self.store.get(roadmap_id)?;
        let feedback = self.store.feedback_for_roadmap(roadmap_id)?;

        let latest = |source: SourceType| feedback.iter().rev().find(|f| f.source_type == source);
        let (teacher, parent) = match (latest(SourceType::Teacher), latest(SourceType::Parent)) {
            (Some(t), Some(p)) => (t, p),
            (t, p) => {
                let missing = match (t.is_none(), p.is_none()) {
                    (true, true) => "teacher and parent feedback",
                    (true, false) => "teacher feedback",
                    _ => "parent feedback",
                };
                warn!("Reconcile refused for roadmap {}: no {}", roadmap_id, missing);
                return Err(Error::MissingInput(format!(
                    "{} for roadmap {}",
                    missing, roadmap_id
                )));
            }
        };

        let request = prompts::reconcile_request(teacher, parent, student_input);
        let content = self
            .backends
            .text
            .generate_text(&request)
            .await
            .map_err(|e| generation_failed("feedback reconciliation", e))?;

        info!("Reconciled feedback for roadmap {}", roadmap_id);
        Ok(Reconciliation {
            roadmap_id: roadmap_id.to_string(),
            teacher_feedback_id: teacher.id.clone(),
            parent_feedback_id: parent.id.clone(),
            student_input: request.var("student_input").to_string(),
            content,
            created_at: Utc::now(),
        })
    }

    /// Append an update section to the roadmap and save it as a new version.
    ///
    /// The existing content is kept verbatim as a prefix.
    pub fn apply_update(&self, roadmap_id: &str, source: UpdateSource, text: &str) -> Result<Roadmap> {
        if text.trim().is_empty() {
            return Err(Error::MissingInput(format!("update text for roadmap {}", roadmap_id)));
        }

        let mut roadmap: Roadmap = self.store.get(roadmap_id)?;
        let next = roadmap.next_version().ok_or_else(|| Error::VersionLimit {
            id: roadmap_id.to_string(),
            version: roadmap.version,
        })?;
        let section = crate::agent::template::update_section(
            next,
            &source.to_string(),
            text,
        );
        roadmap.content.push_str(&section);
        self.store.save_revision(&mut roadmap)?;
        Ok(roadmap)
    }

    /// Mark a roadmap as approved by a stakeholder
    ///
    /// Approval is a save: it refreshes `updated_at`, so the roadmap becomes the
    /// student's current one and feedback received before it no longer counts
    /// as pending review. The version is not bumped.
    pub fn approve(&self, roadmap_id: &str, approver_id: &str) -> Result<Roadmap> {
        if approver_id.trim().is_empty() {
            return Err(Error::MissingInput("approver id".to_string()));
        }
        let mut roadmap: Roadmap = self.store.get(roadmap_id)?;
        roadmap.approved_by = Some(approver_id.trim().to_string());
        self.store.save(&mut roadmap)?;
        info!("Roadmap {} approved by {}", roadmap_id, approver_id);
        Ok(roadmap)
    }

    /// Current review state of a roadmap
    pub fn state(&self, roadmap_id: &str) -> Result<RoadmapState> {
        let roadmap: Roadmap = self.store.get(roadmap_id)?;
        let feedback = self.store.feedback_for_roadmap(roadmap_id)?;
        Ok(RoadmapState::derive(&roadmap, &feedback))
    }

    pub fn current_roadmap(&self, student_id: &str) -> Result<Option<Roadmap>> {
        self.store.latest_roadmap(student_id)
    }

    /// Latest progress; `None` means the student has not reported any yet
    pub fn current_progress(&self, student_id: &str) -> Result<Option<Progress>> {
        self.store.latest_progress(student_id, None)
    }

    pub fn feedback(&self, roadmap_id: &str) -> Result<Vec<Feedback>> {
        self.store.feedback_for_roadmap(roadmap_id)
    }
}

fn generation_failed(operation: &str, e: GenerationError) -> Error {
    warn!("{} failed: {}", operation, e);
    Error::Generation(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{GenerationTask, MockGenerationBackend};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn failing_backend() -> Arc<MockGenerationBackend> {
        let mut mock = MockGenerationBackend::new();
        mock.expect_generate_text()
            .returning(|_| Err(GenerationError::RateLimited("quota".into())));
        Arc::new(mock)
    }

    fn coordinator(dir: &TempDir, text: Arc<MockGenerationBackend>) -> Coordinator {
        Coordinator::new(RecordStore::new(dir.path()), Backends::with_text(text))
    }

    fn seeded_roadmap(store: &RecordStore) -> Roadmap {
        let mut student = Student::new("Aditya", "11", vec!["Math".into()]);
        let sid = store.save(&mut student).unwrap();
        let mut roadmap = Roadmap::new(sid, "# Plan");
        store.save(&mut roadmap).unwrap();
        roadmap
    }

    #[tokio::test]
    async fn test_generation_failure_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let mut student = Student::new("Aditya", "11", vec!["Math".into()]);

        let err = coord.generate(&mut student).await.unwrap_err();
        assert!(matches!(err, Error::Generation(GenerationError::RateLimited(_))));
        assert!(student.id.is_none());
        assert!(coord.store().list_all::<Student>().unwrap().is_empty());
        assert!(coord.store().list_all::<Roadmap>().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_failure_leaves_no_record() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let roadmap = seeded_roadmap(coord.store());
        let rid = roadmap.id.clone().unwrap();

        let err = coord
            .submit_feedback(&rid, SourceType::Teacher, "t1", "more mechanics practice")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert!(coord.feedback(&rid).unwrap().is_empty());
        assert_eq!(coord.state(&rid).unwrap(), RoadmapState::Draft);
    }

    #[tokio::test]
    async fn test_feedback_is_answered_individually() {
        let dir = TempDir::new().unwrap();
        let mut mock = MockGenerationBackend::new();
        mock.expect_generate_text()
            .times(2)
            .returning(|req| Ok(format!("reply to {}", req.task)));
        let coord = coordinator(&dir, Arc::new(mock));
        let roadmap = seeded_roadmap(coord.store());
        let rid = roadmap.id.clone().unwrap();

        let t = coord.submit_feedback(&rid, SourceType::Teacher, "t1", "more mechanics").await.unwrap();
        let p = coord.submit_feedback(&rid, SourceType::Parent, "p1", "less evenings").await.unwrap();

        assert!(t.processed && p.processed);
        assert_eq!(t.response.as_deref(), Some("reply to teacher_feedback"));
        assert_eq!(p.response.as_deref(), Some("reply to parent_feedback"));
        assert_eq!(t.student_id, roadmap.student_id);
    }

    #[tokio::test]
    async fn test_progress_analysis_ignores_remote_backend() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let roadmap = seeded_roadmap(coord.store());

        let mut progress = Progress::new(roadmap.student_id.clone(), roadmap.id.clone().unwrap());
        progress.completed_tasks.insert("algebra".into(), true);
        let report = coord.submit_progress(progress).await.unwrap();

        assert!(report.analysis.starts_with("# Progress Analysis"));
        assert!(report.analysis.contains("- algebra"));
        assert!(report.progress.id.is_some());
    }

    #[tokio::test]
    async fn test_reconcile_checks_inputs_before_calling_backend() {
        let dir = TempDir::new().unwrap();
        let mut mock = MockGenerationBackend::new();
        mock.expect_generate_text()
            .withf(|req| req.task != GenerationTask::Reconcile)
            .returning(|_| Ok("ok".into()));
        let coord = coordinator(&dir, Arc::new(mock));
        let roadmap = seeded_roadmap(coord.store());
        let rid = roadmap.id.clone().unwrap();

        let err = coord.reconcile(&rid, "done with algebra").await.unwrap_err();
        assert!(matches!(err, Error::MissingInput(ref m) if m.contains("teacher and parent")));

        coord.submit_feedback(&rid, SourceType::Parent, "p1", "reduce evening load").await.unwrap();
        let err = coord.reconcile(&rid, "done with algebra").await.unwrap_err();
        assert!(matches!(err, Error::MissingInput(ref m) if m.starts_with("teacher feedback")));
    }

    #[tokio::test]
    async fn test_progress_for_someone_elses_roadmap() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let roadmap = seeded_roadmap(coord.store());
        let rid = roadmap.id.clone().unwrap();

        let err = coord.submit_progress(Progress::new("intruder", rid.as_str())).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntityKind::Roadmap, .. }));

        let report = coord.submit_progress(Progress::new("", rid.as_str())).await.unwrap();
        assert_eq!(report.progress.student_id, roadmap.student_id);
    }

    #[test]
    fn test_apply_update_rejects_blank_text() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let roadmap = seeded_roadmap(coord.store());
        let err = coord
            .apply_update(roadmap.id.as_deref().unwrap(), UpdateSource::Manual, "  ")
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_apply_update_at_last_version_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let coord = coordinator(&dir, failing_backend());
        let mut roadmap = seeded_roadmap(coord.store());
        roadmap.version = u32::MAX;
        coord.store().save(&mut roadmap).unwrap();
        let rid = roadmap.id.clone().unwrap();

        let err = coord.apply_update(&rid, UpdateSource::Manual, "more practice").unwrap_err();
        assert!(matches!(err, Error::VersionLimit { .. }), "got {err}");

        let stored: Roadmap = coord.store().get(&rid).unwrap();
        assert_eq!(stored.version, u32::MAX);
        assert_eq!(stored.content, "# Plan");
    }

    #[test]
    fn test_update_source_labels() {
        assert_eq!(UpdateSource::Feedback(SourceType::Teacher).to_string(), "teacher feedback");
        assert_eq!(UpdateSource::Reconciliation.to_string(), "reconciled feedback");
    }
}
