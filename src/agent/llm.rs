//! Remote LLM backend over an OpenAI-compatible chat completion API (Groq by default)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{GenerationBackend, GenerationError, GenerationRequest};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ============ Model Selection ============

/// The models the dashboard offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelChoice {
    #[default]
    #[serde(rename = "llama3-70b-8192")]
    Llama3_70b,
    #[serde(rename = "mixtral-8x7b")]
    Mixtral8x7b,
    #[serde(rename = "gemma-7b")]
    Gemma7b,
}

impl ModelChoice {
    pub fn id(&self) -> &'static str {
        match self {
            ModelChoice::Llama3_70b => "llama3-70b-8192",
            ModelChoice::Mixtral8x7b => "mixtral-8x7b",
            ModelChoice::Gemma7b => "gemma-7b",
        }
    }

    pub fn all() -> &'static [ModelChoice] {
        &[ModelChoice::Llama3_70b, ModelChoice::Mixtral8x7b, ModelChoice::Gemma7b]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.id() == s.trim())
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ============ Provider Configuration ============

/// Where and how to reach the chat completion API
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    pub api_key: String,
}

impl ProviderConfig {
    /// Any OpenAI-compatible endpoint; Groq's unless configured otherwise
    pub fn with_url(api_key: String, base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

// ============ Wire Types ============

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// ============ Client ============

/// Chat completion client
#[derive(Clone)]
pub struct ChatClient {
    client: Arc<Client>,
    provider: ProviderConfig,
    timeout_secs: u64,
}

impl ChatClient {
    /// Build a client whose requests give up after `timeout_secs`
    pub fn new(provider: ProviderConfig, timeout_secs: u64) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::NotConfigured(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client: Arc::new(client),
            provider,
            timeout_secs,
        })
    }

    /// Send a chat completion request and return the first choice's text
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model,
            messages,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .header("Authorization", format!("Bearer {}", self.provider.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!("LLM API returned {}", status);
            return Err(classify_status(status.as_u16(), &body));
        }

        if std::env::var("DEBUG_LLM_RESPONSES").is_ok() {
            debug!("LLM response: {}", truncate_safe(&body, 2000));
        }

        parse_completion(&body)
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout_secs)
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}

/// Map a non-success HTTP status to the error the caller sees
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    let detail = format!("HTTP {}: {}", status, truncate_safe(body, 300));
    match status {
        401 | 403 => GenerationError::Auth(detail),
        429 => GenerationError::RateLimited(detail),
        408 | 504 => GenerationError::Request(format!("upstream timeout ({})", detail)),
        _ => GenerationError::Request(detail),
    }
}

/// Pull the text out of a chat completion body.
///
/// Content arrives either as a string or as an array of `{type: "text"}` parts.
pub fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let raw: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        GenerationError::Parse(format!("{} (body: {})", e, truncate_safe(body, 300)))
    })?;

    let content_value = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    let content = match content_value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    };

    if content.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content)
}

/// Cut a string to at most `max` bytes on a char boundary
fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============ Backend ============

/// Generation backend that delegates to a hosted model
#[derive(Clone)]
pub struct RemoteBackend {
    client: ChatClient,
    model: ModelChoice,
    max_tokens: u32,
}

impl RemoteBackend {
    pub fn new(client: ChatClient, model: ModelChoice, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    pub fn from_config(
        config: &crate::config::GenerationConfig,
        api_key: String,
    ) -> Result<Self, GenerationError> {
        let provider = ProviderConfig::with_url(api_key, config.base_url.clone());
        let client = ChatClient::new(provider, config.timeout_secs)?;
        Ok(Self::new(client, config.model, config.max_tokens))
    }
}

#[async_trait]
impl GenerationBackend for RemoteBackend {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let messages = [
            ChatMessage::system(request.system_instructions.as_str()),
            ChatMessage::user(request.rendered_prompt()),
        ];
        debug!("Calling {} for {}", self.model, request.task);
        self.client
            .complete(self.model.id(), &messages, Some(self.max_tokens))
            .await
    }
}
