//! Template Backend - deterministic document generation
//!
//! Each task has a markdown document template; `{placeholder}` names are
//! filled from the request variables. The roadmap document branches on the
//! student's goals (JEE preparation vs. per-subject plans) so it is composed
//! in code from smaller templates. Output depends only on the request.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{GenerationBackend, GenerationError, GenerationRequest, GenerationTask, Variables};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

/// Replace `{name}` with `vars[name]`; unknown names are left as written
pub fn fill(template: &str, vars: &Variables) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Deterministic generator; needs no credential and never fails
#[derive(Debug, Clone, Default)]
pub struct TemplateBackend;

impl TemplateBackend {
    pub fn new() -> Self {
        Self
    }

    /// Render the document for a request synchronously
    pub fn render(&self, request: &GenerationRequest) -> String {
        let vars = &request.variables;
        match request.task {
            GenerationTask::Roadmap => render_roadmap(vars),
            GenerationTask::TeacherFeedback => fill(TEACHER_FEEDBACK_DOC, vars),
            GenerationTask::ParentFeedback => fill(PARENT_FEEDBACK_DOC, vars),
            GenerationTask::StudentFeedback => fill(STUDENT_FEEDBACK_DOC, vars),
            GenerationTask::Reconcile => fill(RECONCILE_DOC, vars),
            GenerationTask::ProgressAnalysis => render_progress(vars),
        }
    }
}

#[async_trait]
impl GenerationBackend for TemplateBackend {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!("Rendering {} from template", request.task);
        Ok(self.render(request))
    }
}

/// Section appended to a roadmap by an update. The prior content is kept
/// verbatim in front of it.
pub fn update_section(version: u32, source: &str, text: &str) -> String {
    let mut vars = Variables::new();
    vars.insert("version".to_string(), version.to_string());
    vars.insert("source".to_string(), source.to_string());
    vars.insert("update".to_string(), text.trim().to_string());
    fill(UPDATE_SECTION, &vars)
}

fn render_roadmap(vars: &Variables) -> String {
    let mut doc = fill(ROADMAP_HEADER, vars);

    let goals = vars.get("goals").map(String::as_str).unwrap_or("");
    if goals.to_lowercase().contains("jee") {
        doc.push_str(JEE_PLAN);
    } else {
        let subjects = vars.get("subjects").map(String::as_str).unwrap_or("");
        for subject in subjects.split(',').map(str::trim) {
            match subject {
                "Math" | "Mathematics" => doc.push_str(&fill(MATH_PLAN, vars)),
                "Science" => doc.push_str(&fill(SCIENCE_PLAN, vars)),
                "" => {}
                other => {
                    let mut subject_vars = vars.clone();
                    subject_vars.insert("subject".to_string(), other.to_string());
                    doc.push_str(&fill(GENERIC_SUBJECT_PLAN, &subject_vars));
                }
            }
        }
    }

    doc.push_str(&fill(ROADMAP_FOOTER, vars));
    doc
}

fn render_progress(vars: &Variables) -> String {
    let or_default = |key: &str, default: &str| {
        vars.get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    let mut progress_vars = Variables::new();
    progress_vars.insert(
        "completed_tasks".to_string(),
        or_default("completed_tasks", "No tasks reported as completed."),
    );
    progress_vars.insert(
        "time_spent".to_string(),
        or_default("time_spent", "No time tracking reported."),
    );
    progress_vars.insert(
        "assessment_results".to_string(),
        or_default("assessment_results", "No assessment results reported."),
    );
    progress_vars.insert(
        "focus_areas".to_string(),
        or_default("focus_areas", "Pay special attention to any topics where you scored below 80%"),
    );
    fill(PROGRESS_DOC, &progress_vars)
}

const ROADMAP_HEADER: &str = "# Personalized Study Roadmap for {name}

## Student Profile
- **Name:** {name}
- **Grade/Year:** {grade}
- **Subjects:** {subjects}
- **Current Performance:** {performance}
- **Academic Goals:** {goals}
- **Strengths:** {strengths}
- **Areas for Improvement:** {weaknesses}

## 4-Week Study Plan
";

const JEE_PLAN: &str = "
### JEE Preparation Focus

#### Week 1: Foundation Building
- **Mathematics:** algebra, trigonometry and coordinate geometry (2 hours/day); 10 basic problems daily
- **Physics:** mechanics fundamentals (1.5 hours/day); finish the NCERT textbook
- **Chemistry:** physical and organic basics, periodic table and bonding (1.5 hours/day)

#### Week 2: Concept Strengthening
- **Mathematics:** functions and introductory calculus (2 hours/day); easy previous-year JEE questions
- **Physics:** electricity and magnetism (1.5 hours/day); numerical problems
- **Chemistry:** organic reaction mechanisms and group properties (1.5 hours/day)

#### Week 3: Problem-Solving
- **Mathematics:** probability, statistics and vectors (2 hours/day); medium difficulty JEE problems
- **Physics:** optics and modern physics (1.5 hours/day); conceptual questions
- **Chemistry:** equilibrium and thermodynamics (1.5 hours/day); reaction practice

#### Week 4: Review and Assessment
- **Mathematics:** mock tests and review of weak areas (2 hours/day); timed practice
- **Physics:** full-length subject tests (1.5 hours/day); formula revision
- **Chemistry:** mock tests across all areas (1.5 hours/day); reactions and mechanisms revision

### Recommended Resources
1. **Books:** NCERT textbooks, H.C. Verma (Physics), R.D. Sharma (Mathematics), O.P. Tandon (Chemistry)
2. **Online:** concept videos, JEE Main/Advanced previous papers
3. **Practice:** daily worksheets, weekly mock tests, a monthly full JEE mock exam
";

const MATH_PLAN: &str = "
### Mathematics Focus

#### Week 1: Core Concepts
- Review fundamental concepts (1 hour/day)
- Basic problem sets (30 min/day)

#### Week 2: Advanced Applications
- Problem-solving techniques (1 hour/day)
- Word problems and a first mock test

#### Week 3: Weak Areas
- Focus on {weaknesses} (1.5 hours/day)
- Extra practice on challenging topics

#### Week 4: Review and Mastery
- Comprehensive review (1 hour/day)
- Timed practice exams and error analysis
";

const SCIENCE_PLAN: &str = "
### Science Focus

#### Week 1: Theoretical Foundations
- Review core principles (1 hour/day)
- Summary notes for key concepts

#### Week 2: Practical Applications
- Connect theory with real-world examples (1 hour/day)
- Numerical problems and self-assessment tests

#### Week 3: Deep Dive
- Complex topics (1.5 hours/day)
- Strengthen areas related to {weaknesses}

#### Week 4: Integration and Review
- Connect concepts across units (1 hour/day)
- Full-length practice exams
";

const GENERIC_SUBJECT_PLAN: &str = "
### {subject} Focus

- **Week 1:** review the fundamentals of {subject} (1 hour/day)
- **Week 2:** apply concepts through practice problems
- **Week 3:** concentrate on {weaknesses}
- **Week 4:** timed review and self-assessment
";

const ROADMAP_FOOTER: &str = "
## Personalized Tips for {name}

### Leveraging Your Strengths
- Use your strengths ({strengths}) to build condensed study notes and set ambitious daily goals

### Addressing Areas for Improvement
- To improve {weaknesses}: keep a consistent daily schedule, split large tasks into small ones and track progress

### Daily Schedule Recommendation
- **Morning (1-2 hours):** hardest subjects first
- **Afternoon (1-2 hours):** assignments and practice problems
- **Evening (1 hour):** review the day and plan tomorrow
- **Weekend:** longer review sessions and practice tests

## Progress Tracking
- Weekly self-assessment tests
- Daily completion checklist
- Review this roadmap every two weeks
";

const TEACHER_FEEDBACK_DOC: &str = "# Teacher Feedback Analysis

## Key Points
{feedback}

## Roadmap Elements to Adjust
- Sections of the current plan touched by: {feedback}

## Prioritized Recommendations
1. Apply the teacher's suggestion in the coming week
2. Re-check the affected weekly goals for realistic time allocation
3. Track the change through the next progress update

## Response to the Teacher
Thank you for your feedback. It has been recorded against this roadmap and will shape the next revision.
";

const PARENT_FEEDBACK_DOC: &str = "# Parent Feedback Analysis

## Key Points
{feedback}

## Home Context
- Consider how the schedule fits around: {feedback}

## Balanced Recommendations
1. Keep the academic goals while adjusting workload to the home context
2. Move demanding sessions to times that suit the family routine
3. Review the effect at the next progress update

## Response to the Parent
Thank you for sharing this. Your input has been recorded and will be balanced with the teacher's guidance.
";

const STUDENT_FEEDBACK_DOC: &str = "# Student Feedback Analysis

## What You Told Us
{feedback}

## Next Steps
1. Your comments will be weighed alongside teacher and parent input
2. Keep logging progress so changes can be measured

Thank you for reflecting on your plan.
";

const RECONCILE_DOC: &str = "# Reconciled Recommendations

## Stakeholder Input
- **Teacher:** {teacher_feedback}
- **Parent:** {parent_feedback}
- **Student:** {student_input}

## Areas of Agreement
- Everyone wants steady progress toward the student's goals without burnout

## Points of Tension
- Academic intensity requested by the teacher must fit the home context described by the parent

## Balanced Recommendations
1. Academic focus: {teacher_feedback}
2. Home context: {parent_feedback}
3. Build on what the student reports: {student_input}

## Prioritized Adjustments
1. Schedule the teacher's priority topics in the student's most productive hours
2. Cap daily study load in line with the parent's concern
3. Revisit the plan after the next progress update
";

const PROGRESS_DOC: &str = "# Progress Analysis

## Completed Tasks
{completed_tasks}

## Time Spent
{time_spent}

## Assessment Results
{assessment_results}

## Recommendations
1. **Continue With Your Plan:** stay consistent with your study schedule
2. **Focus Areas:** {focus_areas}
3. **Next Steps:** review challenging concepts, add practice where scores are lower, ask for help early

Keep tracking your progress and adjust your plan as needed.
";

const UPDATE_SECTION: &str = "

## Updated Recommendations (version {version})
Based on {source}:
{update}

1. Continue focusing on your core subjects
2. Address any difficulties in your areas of weakness
3. Keep tracking your progress regularly
";
