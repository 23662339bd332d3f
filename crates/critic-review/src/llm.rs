use std::time::Duration;

use critic_core::{CriticError, LlmConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const TEMPERATURE: f64 = 0.2;

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use critic_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Review this code");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use critic_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

/// Text and usage returned by one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Content of the first choice.
    pub content: String,
    /// Total tokens reported by the provider, 0 when not reported.
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint.
///
/// # Examples
///
/// ```
/// use critic_core::LlmConfig;
/// use critic_review::llm::LlmClient;
///
/// let client = LlmClient::new(&LlmConfig::default(), "sk-test").unwrap();
/// assert_eq!(client.model(), "gpt-4");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl LlmClient {
    /// Create a new completion client.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, CriticError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CriticError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the first choice.
    ///
    /// # Errors
    ///
    /// - [`CriticError::Auth`] when the key is rejected (401/403)
    /// - [`CriticError::Transient`] on network failures, timeouts, 429 and 5xx
    /// - [`CriticError::Model`] on any other error status
    /// - [`CriticError::Parse`] when the body lacks the review text
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, CriticError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let url = format!("{base_url}/v1/chat/completions");

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CriticError::Transient(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CriticError::Transient(format!("failed to read completion: {e}")))?;
        parse_completion(&text)
    }
}

fn classify_status(status: StatusCode, body: &str) -> CriticError {
    let detail = format!("completion API error {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CriticError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => CriticError::Transient(detail),
        s if s.is_server_error() => CriticError::Transient(detail),
        _ => CriticError::Model(detail),
    }
}

/// Extract the first choice's content and the token usage from a raw
/// completion body.
///
/// # Errors
///
/// Returns [`CriticError::Parse`] if the body is not JSON of the expected
/// shape or the first choice has no content.
///
/// # Examples
///
/// ```
/// use critic_review::llm::parse_completion;
///
/// let body = r#"{"choices":[{"message":{"content":"Looks good"}}],"usage":{"total_tokens":12}}"#;
/// let completion = parse_completion(body).unwrap();
/// assert_eq!(completion.content, "Looks good");
/// assert_eq!(completion.total_tokens, 12);
/// ```
pub fn parse_completion(body: &str) -> Result<Completion, CriticError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| CriticError::Parse(format!("invalid completion response: {e}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CriticError::Parse(format!("completion has no review text: {body}")))?;

    Ok(Completion {
        content,
        total_tokens: response.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}
