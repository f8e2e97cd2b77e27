//! End-to-end roadmap lifecycle against a temporary record store

use roadmap_agent::{
    Backends, Coordinator, Error, Feedback, Progress, RecordStore, Roadmap, RoadmapState,
    SourceType, Student, UpdateSource,
};
use tempfile::TempDir;

fn coordinator(dir: &TempDir) -> Coordinator {
    Coordinator::new(RecordStore::new(dir.path()), Backends::templates())
}

fn aditya() -> Student {
    Student::new("Aditya Sharma", "Class 11", vec!["Math".into(), "Science".into()])
        .with_goals("JEE prep")
}

#[tokio::test]
async fn test_jee_student_full_cycle() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);

    let mut student = aditya();
    let roadmap = coord.generate(&mut student).await.unwrap();
    let student_id = student.id.clone().expect("student saved by generate");
    let roadmap_id = roadmap.id.clone().unwrap();

    assert!(roadmap.content.contains("JEE Preparation Focus"));
    assert!(roadmap.content.contains("4-Week"));
    assert_eq!(roadmap.version, 1);
    assert_eq!(roadmap.student_id, student_id);
    assert_eq!(coord.state(&roadmap_id).unwrap(), RoadmapState::Draft);

    let teacher = coord
        .submit_feedback(&roadmap_id, SourceType::Teacher, "t-1", "more mechanics practice")
        .await
        .unwrap();
    let parent = coord
        .submit_feedback(&roadmap_id, SourceType::Parent, "p-1", "reduce evening load")
        .await
        .unwrap();
    assert!(teacher.processed && parent.processed);
    assert!(teacher.response.as_deref().unwrap().contains("more mechanics practice"));
    assert_eq!(coord.state(&roadmap_id).unwrap(), RoadmapState::UnderReview);

    let reconciled = coord.reconcile(&roadmap_id, "done with algebra").await.unwrap();
    assert!(!reconciled.content.trim().is_empty());
    assert!(reconciled.content.contains("done with algebra"));
    assert_eq!(reconciled.teacher_feedback_id, teacher.id);
    assert_eq!(reconciled.parent_feedback_id, parent.id);

    // reconcile alone changes nothing
    let unchanged: Roadmap = coord.store().get(&roadmap_id).unwrap();
    assert_eq!(unchanged.content, roadmap.content);

    let revised = coord
        .apply_update(&roadmap_id, UpdateSource::Reconciliation, &reconciled.content)
        .unwrap();
    assert_eq!(revised.version, 2);
    assert!(revised.content.starts_with(&roadmap.content));
    assert!(revised.content.contains("## Updated Recommendations (version 2)"));
    assert_eq!(coord.state(&roadmap_id).unwrap(), RoadmapState::Revised);

    let current = coord.current_roadmap(&student_id).unwrap().unwrap();
    assert_eq!(current.id.as_deref(), Some(roadmap_id.as_str()));
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn test_reconcile_needs_teacher_and_parent() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let roadmap = coord.generate(&mut student).await.unwrap();
    let roadmap_id = roadmap.id.unwrap();

    coord
        .submit_feedback(&roadmap_id, SourceType::Teacher, "t-1", "more mechanics practice")
        .await
        .unwrap();
    coord
        .submit_feedback(&roadmap_id, SourceType::Student, student.id.as_deref().unwrap(), "too much optics")
        .await
        .unwrap();

    let err = coord.reconcile(&roadmap_id, "").await.unwrap_err();
    assert!(matches!(err, Error::MissingInput(_)), "got {err}");
}

#[tokio::test]
async fn test_reconcile_uses_latest_feedback_per_source() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let roadmap_id = coord.generate(&mut student).await.unwrap().id.unwrap();

    coord.submit_feedback(&roadmap_id, SourceType::Teacher, "t-1", "old advice").await.unwrap();
    let newer = coord
        .submit_feedback(&roadmap_id, SourceType::Teacher, "t-1", "newer advice")
        .await
        .unwrap();
    coord.submit_feedback(&roadmap_id, SourceType::Parent, "p-1", "weekends free").await.unwrap();

    let reconciled = coord.reconcile(&roadmap_id, "").await.unwrap();
    assert_eq!(reconciled.teacher_feedback_id, newer.id);
    assert!(reconciled.content.contains("newer advice"));
    assert!(reconciled.content.contains("No student input available"));
}

#[tokio::test]
async fn test_unknown_roadmap_is_not_found() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);

    let err = coord
        .submit_feedback("missing", SourceType::Parent, "p-1", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = coord.reconcile("missing", "x").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = coord.apply_update("missing", UpdateSource::Manual, "x").unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_apply_update_keeps_prefix() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut roadmap = Roadmap::new("s-1", "X");
    coord.store().save(&mut roadmap).unwrap();
    let id = roadmap.id.unwrap();

    let updated = coord.apply_update(&id, UpdateSource::Manual, "Y").unwrap();
    assert!(updated.content.starts_with('X'));
    assert!(updated.content.contains('Y'));
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn test_progress_submission_and_current_progress() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let roadmap = coord.generate(&mut student).await.unwrap();
    let student_id = student.id.clone().unwrap();

    assert!(coord.current_progress(&student_id).unwrap().is_none());
    assert!(coord.store().list_by_owner::<Progress>(&student_id).unwrap().is_empty());

    let progress =
        roadmap_agent::sample::sample_progress(&student_id, roadmap.id.as_deref().unwrap());
    let report = coord.submit_progress(progress).await.unwrap();
    assert!(report.analysis.contains("Physics Mock Test"));
    assert!(report.analysis.contains("Scores below 80%"));

    let current = coord.current_progress(&student_id).unwrap().unwrap();
    assert_eq!(current.id, report.progress.id);
}

#[tokio::test]
async fn test_approval_is_recorded() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let roadmap_id = coord.generate(&mut student).await.unwrap().id.unwrap();

    let approved = coord.approve(&roadmap_id, "teacher-42").unwrap();
    assert!(approved.is_approved());
    assert_eq!(approved.version, 1);

    let stored: Roadmap = coord.store().get(&roadmap_id).unwrap();
    assert_eq!(stored.approved_by.as_deref(), Some("teacher-42"));
}

#[tokio::test]
async fn test_regenerate_adds_a_new_roadmap() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let first = coord.generate(&mut student).await.unwrap();
    let second = coord.regenerate(student.id.as_deref().unwrap()).await.unwrap();

    assert_ne!(first.id, second.id);
    let all = coord
        .store()
        .list_by_owner::<Roadmap>(student.id.as_deref().unwrap())
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        coord.current_roadmap(student.id.as_deref().unwrap()).unwrap().unwrap().id,
        second.id
    );
}

#[tokio::test]
async fn test_feedback_list_is_chronological() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let roadmap_id = coord.generate(&mut student).await.unwrap().id.unwrap();

    for text in ["first", "second", "third"] {
        coord.submit_feedback(&roadmap_id, SourceType::Parent, "p-1", text).await.unwrap();
    }
    let contents: Vec<String> = coord
        .feedback(&roadmap_id)
        .unwrap()
        .into_iter()
        .map(|f: Feedback| f.content)
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_approval_counts_as_latest_touch() {
    let dir = TempDir::new().unwrap();
    let coord = coordinator(&dir);
    let mut student = aditya();
    let first = coord.generate(&mut student).await.unwrap();
    let student_id = student.id.clone().unwrap();
    let first_id = first.id.clone().unwrap();
    let second = coord.regenerate(&student_id).await.unwrap();
    assert_eq!(coord.current_roadmap(&student_id).unwrap().unwrap().id, second.id);

    coord
        .submit_feedback(&first_id, SourceType::Teacher, "t-1", "more mechanics practice")
        .await
        .unwrap();
    assert_eq!(coord.state(&first_id).unwrap(), RoadmapState::UnderReview);

    let approved = coord.approve(&first_id, "teacher-42").unwrap();
    assert_eq!(approved.version, 1);
    assert_eq!(approved.content, first.content);

    // approval settles the open review and makes the roadmap current again
    assert_eq!(coord.state(&first_id).unwrap(), RoadmapState::Draft);
    assert_eq!(
        coord.current_roadmap(&student_id).unwrap().unwrap().id.as_deref(),
        Some(first_id.as_str())
    );
}
