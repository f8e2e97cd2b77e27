//! Demo data: a Class 11 JEE aspirant

use serde_json::json;

use crate::models::{AssessmentResult, Goals, Performance, Progress, Student};

/// Profile used by `student sample` and the demo walkthrough
pub fn sample_student() -> Student {
    let mut student = Student::new(
        "Aditya Sharma",
        "Class 11",
        vec!["Physics".into(), "Chemistry".into(), "Mathematics".into()],
    )
    .with_strengths(vec![
        "Mechanics".into(),
        "Physical Chemistry".into(),
        "Algebra".into(),
        "Calculus".into(),
    ])
    .with_weaknesses(vec!["Optics".into(), "Organic Chemistry".into()]);

    student.goals = Goals {
        summary: Some("JEE preparation".into()),
        target_exam: Some("JEE".into()),
        target_score: Some("95%".into()),
        ..Default::default()
    };

    let mut performance = Performance {
        current_progress: Some(78.0),
        ..Default::default()
    };
    performance.extra.insert(
        "subject_scores".into(),
        json!({ "Physics": 82, "Chemistry": 75, "Mathematics": 88 }),
    );
    student.performance = performance;
    student
}

/// A week's progress report against a roadmap
pub fn sample_progress(student_id: &str, roadmap_id: &str) -> Progress {
    let mut progress = Progress::new(student_id, roadmap_id);
    progress.completed_tasks.insert("Chemistry Revision".into(), true);
    progress.completed_tasks.insert("Calculus Practice".into(), true);
    progress.completed_tasks.insert("Solve 20 Physics problems".into(), false);
    progress.time_spent.insert("Physics".into(), 90);
    progress.time_spent.insert("Chemistry".into(), 90);
    progress.time_spent.insert("Mathematics".into(), 120);
    progress
        .assessment_results
        .push(AssessmentResult::new("Physics Mock Test", 72.0, 100.0));
    progress
        .assessment_results
        .push(AssessmentResult::new("Calculus Quiz", 17.0, 20.0));
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_goals_select_jee_plan() {
        let student = sample_student();
        let vars = student.to_variables();
        assert!(vars["goals"].contains("JEE"));
        assert!(vars["goals"].contains("95%"));
        assert!(vars["performance"].contains("overall progress 78%"));
    }

    #[test]
    fn test_sample_progress_flags_weak_assessment() {
        let progress = sample_progress("s1", "r1");
        let weak: Vec<&str> = progress.below(80.0).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(weak, vec!["Physics Mock Test"]);
        assert_eq!(progress.completed().count(), 2);
    }
}
