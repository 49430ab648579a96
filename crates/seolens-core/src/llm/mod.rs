//! AI analysis/optimization gateway
//!
//! Thin wrapper around an OpenAI-compatible chat-completion endpoint
//! with the fixed prompt templates from [`prompts`]. One call, one
//! completion; failures are reported once and never retried. The
//! streaming variant yields content deltas in generation order and
//! ends when the upstream stream does.

mod config;
pub mod prompts;

use std::time::Duration;

use futures::{Stream, StreamExt, future, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_MODEL, LlmConfig};

/// Timeout for completion calls; generation is slower than a page fetch.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to initialize HTTP client: {0}")]
    Init(String),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Chat-completion client.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Init(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generic URL analysis (or SEO audit when `audit` is set),
    /// streamed as content deltas.
    pub async fn analyze_url_stream(
        &self,
        url: &str,
        audit: bool,
    ) -> Result<impl Stream<Item = Result<String, LlmError>> + Send + 'static + use<>, LlmError>
    {
        let (system, user) = if audit {
            (prompts::SEO_AUDITOR_SYSTEM, prompts::seo_audit_user(url))
        } else {
            (prompts::URL_ANALYST_SYSTEM, prompts::url_analysis_user(url))
        };
        self.chat_stream(system, &user).await
    }

    /// Critique structured data.
    pub async fn critique_structured_data(&self, data: &JsonValue) -> Result<String, LlmError> {
        self.chat(
            prompts::STRUCTURED_DATA_ANALYST_SYSTEM,
            &prompts::structured_data_analysis_user(data),
        )
        .await
    }

    /// Produce optimization suggestions for structured data, in the
    /// layout `optimize::parse_optimization_text` understands.
    pub async fn optimize_structured_data(&self, data: &JsonValue) -> Result<String, LlmError> {
        self.chat(
            prompts::STRUCTURED_DATA_OPTIMIZER_SYSTEM,
            &prompts::structured_data_optimization_user(data),
        )
        .await
    }

    /// Suggest structured data for raw page content.
    pub async fn suggest_structured_data(&self, content: &str) -> Result<String, LlmError> {
        let truncated = truncate_chars(content, self.config.max_content_chars);
        self.chat(
            prompts::STRUCTURED_DATA_SUGGESTER_SYSTEM,
            &prompts::structured_data_suggestion_user(truncated),
        )
        .await
    }

    /// One buffered chat completion; returns the first choice's text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let response = self.send_completion(system, user, false).await?;

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Parse("completion carried no content".to_string()))
    }

    /// Streaming chat completion. Content deltas are parsed from the
    /// SSE `data:` lines and yielded in generation order; the stream
    /// ends when the upstream sends `[DONE]` and closes.
    /// The returned stream owns its buffers and the underlying
    /// response, so it captures none of the argument lifetimes.
    pub async fn chat_stream(
        &self,
        system: &str,
        user: &str,
    ) -> Result<impl Stream<Item = Result<String, LlmError>> + Send + 'static + use<>, LlmError>
    {
        let response = self.send_completion(system, user, true).await?;

        let deltas = response
            .bytes_stream()
            .scan(String::new(), |buffer, chunk| {
                let out = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        let mut pieces = Vec::new();
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            if let Some(delta) = parse_stream_line(line.trim()) {
                                pieces.push(delta);
                            }
                        }
                        Ok(pieces)
                    }
                    Err(e) => Err(LlmError::Connection(e.to_string())),
                };
                future::ready(Some(out))
            })
            .flat_map(|result| match result {
                Ok(pieces) => stream::iter(pieces.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(future::ready(Err(e))).right_stream(),
            });

        Ok(deltas)
    }

    async fn send_completion(
        &self,
        system: &str,
        user: &str,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            stream,
        };

        debug!("requesting completion (model={})", self.config.model);
        let url = format!("{}/chat/completions", self.config.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {status}: {body}")));
        }

        Ok(response)
    }
}

/// Extract the content delta from one SSE line of a streaming
/// completion, if the line carries one.
fn parse_stream_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    let event: JsonValue = serde_json::from_str(data).ok()?;
    let content = event["choices"][0]["delta"]["content"].as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

/// Cut text at a UTF-8 boundary at or before `max` bytes.
fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_line_with_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_stream_line(line), Some("Hello".to_string()));
    }

    #[test]
    fn stream_line_without_space_after_colon() {
        let line = r#"data:{"choices":[{"delta":{"content":"x"}}]}"#;
        assert_eq!(parse_stream_line(line), Some("x".to_string()));
    }

    #[test]
    fn done_marker_and_noise_yield_nothing() {
        assert_eq!(parse_stream_line("data: [DONE]"), None);
        assert_eq!(parse_stream_line(""), None);
        assert_eq!(parse_stream_line(": keep-alive"), None);
        // role-only delta, no content
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_stream_line(line), None);
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_chars(text, 2);
        assert!(cut.len() <= 2);
        assert!(text.starts_with(cut));
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(LlmClient::new(LlmConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected_before_any_request() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        let err = client.chat("system", "user").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn stream_result_outlives_the_request_strings() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        // The result leaves the scope of the borrowed arguments; this
        // only compiles while the stream type captures no lifetimes.
        let result = {
            let url = String::from("https://example.com");
            client.analyze_url_stream(&url, false).await
        };
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
