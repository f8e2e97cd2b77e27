//! Role instructions and prompt templates
//!
//! Three roles talk to the model: the roadmap planner, the feedback
//! coordinator and the progress monitor. Each request carries the role's
//! fixed instructions plus a prompt template whose placeholders are filled
//! from the request variables.

use super::{GenerationRequest, GenerationTask, Variables};
use crate::models::{Feedback, Progress, Roadmap, Student};
use crate::types::SourceType;

pub const ROADMAP_INSTRUCTIONS: &str = "You are an expert educational consultant who writes personalized study roadmaps. \
Build on the student's strengths and address their weaknesses, align the plan with their academic goals, \
give a realistic weekly schedule with time allocations, and recommend concrete resources for each topic. \
Be specific and practical.";

pub const FEEDBACK_INSTRUCTIONS: &str = "You are an educational feedback coordinator. \
You process feedback from teachers, parents and students, pick out actionable insights, \
prioritize them by impact and urgency, and reply constructively with the student's success in mind.";

pub const MONITOR_INSTRUCTIONS: &str = "You monitor a student's progress against their study roadmap \
and recommend where to focus next.";

const ROADMAP_PROMPT: &str = "Create a 4-week study roadmap in markdown for this student.

Name: {name}
Grade/Year: {grade}
Subjects: {subjects}
Current performance: {performance}
Academic goals: {goals}
Strengths: {strengths}
Areas for improvement: {weaknesses}

Include a student profile section, a week-by-week plan per subject, recommended resources, \
personalized tips, a daily schedule and a progress tracking section.";

const TEACHER_FEEDBACK_PROMPT: &str = "Analyze this teacher feedback on a student's roadmap.

Roadmap:
{roadmap}

Teacher feedback:
{feedback}

Provide: 1) a summary of the teacher's key points, 2) roadmap elements that need adjustment, \
3) prioritized recommendations, 4) a short reply acknowledging the teacher's input. \
Use clear markdown with actionable next steps.";

const PARENT_FEEDBACK_PROMPT: &str = "Analyze this parent feedback on their child's roadmap.

Roadmap:
{roadmap}

Parent feedback:
{feedback}

Provide: 1) a summary of the parent's key points, 2) home-context factors that affect the roadmap, \
3) recommendations balancing academic goals with home context, 4) a short reply acknowledging the parent's input. \
Use clear markdown with actionable next steps.";

const STUDENT_FEEDBACK_PROMPT: &str = "Analyze this student's own feedback on their roadmap.

Roadmap:
{roadmap}

Student feedback:
{feedback}

Provide: 1) what the student is asking for, 2) which parts of the plan it affects, \
3) an encouraging reply addressed to the student.";

const RECONCILE_PROMPT: &str = "Reconcile feedback from the stakeholders below into one recommendation.

Teacher feedback:
{teacher_feedback}

Parent feedback:
{parent_feedback}

Student input:
{student_input}

Provide: 1) areas of agreement, 2) points of conflict or tension, \
3) balanced recommendations addressing the key concerns, 4) a prioritized list of adjustments. \
Keep the tone diplomatic and respectful of every perspective.";

const PROGRESS_PROMPT: &str = "Analyze the student's progress against the roadmap.

Roadmap:
{roadmap}

Completed tasks:
{completed_tasks}

Time spent:
{time_spent}

Assessment results:
{assessment_results}";

/// Request for a fresh roadmap from a student profile
pub fn roadmap_request(student: &Student) -> GenerationRequest {
    GenerationRequest::new(GenerationTask::Roadmap, ROADMAP_INSTRUCTIONS, ROADMAP_PROMPT)
        .with_vars(student.to_variables())
}

/// Request for a reply to one feedback item
pub fn feedback_request(roadmap: &Roadmap, feedback: &Feedback) -> GenerationRequest {
    let (task, prompt) = match feedback.source_type {
        SourceType::Teacher => (GenerationTask::TeacherFeedback, TEACHER_FEEDBACK_PROMPT),
        SourceType::Parent => (GenerationTask::ParentFeedback, PARENT_FEEDBACK_PROMPT),
        SourceType::Student => (GenerationTask::StudentFeedback, STUDENT_FEEDBACK_PROMPT),
    };
    GenerationRequest::new(task, FEEDBACK_INSTRUCTIONS, prompt)
        .with_var("roadmap", roadmap.content.as_str())
        .with_var("feedback", feedback.content.as_str())
}

/// Request to balance teacher, parent and student input
pub fn reconcile_request(
    teacher: &Feedback,
    parent: &Feedback,
    student_input: &str,
) -> GenerationRequest {
    let student_input = if student_input.trim().is_empty() {
        "No student input available"
    } else {
        student_input
    };
    GenerationRequest::new(GenerationTask::Reconcile, FEEDBACK_INSTRUCTIONS, RECONCILE_PROMPT)
        .with_var("teacher_feedback", teacher.content.as_str())
        .with_var("parent_feedback", parent.content.as_str())
        .with_var("student_input", student_input)
}

/// Request for an analysis of one progress submission
pub fn progress_request(roadmap: &Roadmap, progress: &Progress) -> GenerationRequest {
    let mut vars = Variables::new();
    vars.insert("roadmap".to_string(), roadmap.content.clone());
    vars.insert("completed_tasks".to_string(), progress.completed_summary());
    vars.insert("time_spent".to_string(), progress.time_summary());
    vars.insert("assessment_results".to_string(), progress.assessment_summary());

    let weak: Vec<&str> = progress.below(80.0).iter().map(|a| a.name.as_str()).collect();
    if !weak.is_empty() {
        vars.insert(
            "focus_areas".to_string(),
            format!("Scores below 80% in {}; revisit those topics first", weak.join(", ")),
        );
    }

    GenerationRequest::new(GenerationTask::ProgressAnalysis, MONITOR_INSTRUCTIONS, PROGRESS_PROMPT)
        .with_vars(vars)
}
