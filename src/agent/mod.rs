//! Generation backends
//!
//! Roadmaps, feedback replies, reconciliations and progress analyses are all
//! produced through one narrow text-in/text-out interface,
//! [`GenerationBackend`]. Two implementations exist:
//! - [`template::TemplateBackend`]: deterministic document templates, used
//!   when no API key is configured and always for progress analysis
//! - [`llm::RemoteBackend`]: an OpenAI-compatible chat completion call
//!
//! Which one runs is decided once, in [`select_backends`].

pub mod llm;
pub mod prompts;
pub mod template;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Placeholder name -> value
pub type Variables = BTreeMap<String, String>;

/// What a request is for; lets the template backend pick its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    Roadmap,
    TeacherFeedback,
    ParentFeedback,
    StudentFeedback,
    Reconcile,
    ProgressAnalysis,
}

impl std::fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GenerationTask::Roadmap => "roadmap",
            GenerationTask::TeacherFeedback => "teacher_feedback",
            GenerationTask::ParentFeedback => "parent_feedback",
            GenerationTask::StudentFeedback => "student_feedback",
            GenerationTask::Reconcile => "reconcile",
            GenerationTask::ProgressAnalysis => "progress_analysis",
        };
        write!(f, "{}", name)
    }
}

/// Input to a backend: fixed role instructions, a prompt template with
/// `{named}` placeholders, and the values for those placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub system_instructions: String,
    pub prompt: String,
    pub variables: Variables,
}

impl GenerationRequest {
    pub fn new(
        task: GenerationTask,
        system_instructions: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            task,
            system_instructions: system_instructions.into(),
            prompt: prompt.into(),
            variables: Variables::new(),
        }
    }

    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: Variables) -> Self {
        self.variables.extend(vars);
        self
    }

    /// Value of a variable, empty if unset
    pub fn var(&self, name: &str) -> &str {
        self.variables.get(name).map(String::as_str).unwrap_or("")
    }

    /// The prompt with placeholders filled in
    pub fn rendered_prompt(&self) -> String {
        template::fill(&self.prompt, &self.variables)
    }
}

/// Why a backend could not produce text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// No credential or endpoint available
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// The provider rejected the credential
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Quota exhausted or rate limited
    #[error("rate limited or quota exceeded: {0}")]
    RateLimited(String),

    /// The call did not finish in time
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Network failure or non-success status
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered but the body was unusable
    #[error("could not parse response: {0}")]
    Parse(String),

    /// The provider answered with no text
    #[error("empty response from model")]
    EmptyResponse,
}

/// A text generator with a blocking call/response contract from the
/// caller's point of view: one request in, one document out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// The backends the lifecycle coordinator talks to
#[derive(Clone)]
pub struct Backends {
    /// Roadmap generation, feedback replies and reconciliation
    pub text: Arc<dyn GenerationBackend>,
    /// Progress analysis
    pub analysis: Arc<dyn GenerationBackend>,
}

impl Backends {
    /// Template generation everywhere
    pub fn templates() -> Self {
        let template: Arc<dyn GenerationBackend> = Arc::new(template::TemplateBackend::new());
        Self {
            text: template.clone(),
            analysis: template,
        }
    }

    /// Use `text` for roadmap and feedback work, templates for analysis
    pub fn with_text(text: Arc<dyn GenerationBackend>) -> Self {
        Self {
            text,
            analysis: Arc::new(template::TemplateBackend::new()),
        }
    }
}

/// Pick backends from configuration: a credential selects the remote model,
/// its absence selects templates.
pub fn select_backends(
    config: &crate::config::GenerationConfig,
    api_key: Option<String>,
) -> Result<Backends, GenerationError> {
    match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            info!("Using remote generation with model {}", config.model);
            let remote = llm::RemoteBackend::from_config(config, key)?;
            Ok(Backends::with_text(Arc::new(remote)))
        }
        None => {
            info!("No API key configured; using template generation");
            Ok(Backends::templates())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_renders_prompt() {
        let request = GenerationRequest::new(GenerationTask::Reconcile, "sys", "T: {teacher} / P: {parent}")
            .with_var("teacher", "more mechanics")
            .with_var("parent", "less evening work");
        assert_eq!(request.rendered_prompt(), "T: more mechanics / P: less evening work");
        assert_eq!(request.var("missing"), "");
    }

    #[test]
    fn test_blank_key_selects_templates() {
        let config = crate::config::GenerationConfig::default();
        assert!(select_backends(&config, Some("   ".into())).is_ok());
        assert!(select_backends(&config, None).is_ok());
    }

    #[test]
    fn test_task_display_matches_serde() {
        let json = serde_json::to_string(&GenerationTask::ProgressAnalysis).unwrap();
        assert_eq!(json, format!("\"{}\"", GenerationTask::ProgressAnalysis));
    }
}
