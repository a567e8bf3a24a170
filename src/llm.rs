use crate::config::{Config, Credentials, ProviderKind};
use crate::error::ProviderError;
use crate::transcript::{Role, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything sent to the provider for one reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Persona entry first, then the transcript in order
    pub messages: Vec<LlmMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Message in a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl From<&Turn> for LlmMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role() {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        Self::new(role, turn.content())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Source of assistant replies.
///
/// Stateless from the caller's side: every request carries the full context.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    fn model_id(&self) -> &str;
}

/// Wire format family spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDialect {
    /// `POST /v1/chat/completions` (OpenAI, OpenRouter, xAI, Mistral)
    ChatCompletions,
    /// `POST /v1/messages`
    Anthropic,
    /// `POST /models/{model}:generateContent`
    Gemini,
}

/// HTTP client for the hosted completion APIs
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    provider: ProviderKind,
    base_url: String,
    model: String,
    api_key: Credentials,
}

impl LlmClient {
    pub fn new(config: &Config, api_key: Credentials) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        match self.provider.dialect() {
            ApiDialect::ChatCompletions => format!("{}/v1/chat/completions", self.base_url),
            ApiDialect::Anthropic => format!("{}/v1/messages", self.base_url),
            ApiDialect::Gemini => {
                format!("{}/models/{}:generateContent", self.base_url, self.model)
            }
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.api_key.expose();
        match self.provider {
            ProviderKind::OpenAi | ProviderKind::Xai | ProviderKind::Mistral => {
                builder.header("Authorization", format!("Bearer {key}"))
            }
            ProviderKind::OpenRouter => builder
                .header("Authorization", format!("Bearer {key}"))
                .header("X-Title", "voicebot"),
            ProviderKind::Anthropic => builder
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01"),
            ProviderKind::Google => builder.header("x-goog-api-key", key),
        }
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let dialect = self.provider.dialect();
        let payload = build_payload(dialect, &self.model, request);

        let response = self
            .authorize(self.client.post(self.endpoint()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(self.provider, status.as_u16(), &body));
        }

        parse_reply(dialect, &body)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ProviderError::network(format!("Connection failed: {e}"))
    } else {
        ProviderError::unknown(format!("Request failed: {e}"))
    }
}

/// Build the JSON body for `dialect`
pub fn build_payload(
    dialect: ApiDialect,
    model: &str,
    request: &CompletionRequest,
) -> serde_json::Value {
    match dialect {
        ApiDialect::ChatCompletions => serde_json::json!({
            "model": model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens
        }),
        ApiDialect::Anthropic => {
            // System entries go in the top-level field
            let (system, messages) = split_system(&request.messages);
            let messages: Vec<_> = messages
                .iter()
                .map(|msg| {
                    serde_json::json!({
                        "role": msg.role.as_str(),
                        "content": msg.content
                    })
                })
                .collect();

            let mut payload = serde_json::json!({
                "model": model,
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens
            });
            if !system.is_empty() {
                payload["system"] = serde_json::Value::String(system);
            }
            payload
        }
        ApiDialect::Gemini => {
            let (system, messages) = split_system(&request.messages);
            let contents: Vec<_> = messages
                .iter()
                .map(|msg| {
                    let role = match msg.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    };
                    serde_json::json!({
                        "role": role,
                        "parts": [{"text": msg.content}]
                    })
                })
                .collect();

            let mut payload = serde_json::json!({
                "contents": contents,
                "generationConfig": {
                    "temperature": request.temperature,
                    "maxOutputTokens": request.max_tokens
                }
            });
            if !system.is_empty() {
                payload["systemInstruction"] = serde_json::json!({
                    "parts": [{"text": system}]
                });
            }
            payload
        }
    }
}

fn split_system(messages: &[LlmMessage]) -> (String, Vec<&LlmMessage>) {
    let system = messages
        .iter()
        .filter(|msg| msg.role == MessageRole::System)
        .map(|msg| msg.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let rest = messages
        .iter()
        .filter(|msg| msg.role != MessageRole::System)
        .collect();
    (system, rest)
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// Extract the assistant text from a successful response body
pub fn parse_reply(dialect: ApiDialect, body: &str) -> Result<String, ProviderError> {
    let decode_error = |e: serde_json::Error| {
        ProviderError::malformed(format!("Could not decode response: {e}"))
    };

    let text = match dialect {
        ApiDialect::ChatCompletions => {
            let response: ChatResponse = serde_json::from_str(body).map_err(decode_error)?;
            response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::malformed("No choices in response"))?
                .message
                .content
                .unwrap_or_default()
        }
        ApiDialect::Anthropic => {
            let response: AnthropicResponse = serde_json::from_str(body).map_err(decode_error)?;
            response
                .content
                .into_iter()
                .filter(|block| block.kind == "text")
                .filter_map(|block| block.text)
                .collect::<String>()
        }
        ApiDialect::Gemini => {
            let response: GeminiResponse = serde_json::from_str(body).map_err(decode_error)?;
            response
                .candidates
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::malformed("No candidates in response"))?
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<String>()
                })
                .unwrap_or_default()
        }
    };

    if text.trim().is_empty() {
        return Err(ProviderError::malformed("Provider returned an empty reply"));
    }
    Ok(text)
}

/// Map a non-success HTTP status to a provider error
pub fn classify_status(provider: ProviderKind, status: u16, body: &str) -> ProviderError {
    let detail = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    let message = format!("{} API error (HTTP {status}): {detail}", provider.display_name());

    match status {
        401 | 403 => ProviderError::auth(message),
        429 => ProviderError::rate_limit(message),
        400..=499 => ProviderError::invalid_request(message),
        500..=599 => ProviderError::server_error(message),
        _ => ProviderError::unknown(message),
    }
}

/// `{"error": {"message": ...}}`, `{"error": "..."}` or `{"message": ...}`
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error");
    error
        .and_then(|e| e.get("message"))
        .or_else(|| error.filter(|e| e.is_string()))
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Logging wrapper for completion providers
pub struct LoggingProvider {
    inner: Arc<dyn CompletionProvider>,
    model_id: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionProvider for LoggingProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    reply_chars = reply.chars().count(),
                    "completion succeeded"
                );
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    kind = ?e.kind,
                    error = %e.message,
                    "completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
