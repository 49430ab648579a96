//! AI gateway configuration.

use std::env;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the chat-completion client.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub endpoint: String,
    /// API key; AI routes fail without one.
    pub api_key: Option<String>,
    /// Model used for all prompt templates.
    pub model: String,
    /// Temperature for generation (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum characters of page content forwarded to the model.
    pub max_content_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_content_chars: 12_000,
        }
    }
}

impl LlmConfig {
    /// Build a config from the environment.
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `OPENAI_MODEL`,
    /// `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(endpoint) = env::var("OPENAI_BASE_URL") {
            if !endpoint.is_empty() {
                config.endpoint = endpoint.trim_end_matches('/').to_string();
            }
        }
        config
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}
