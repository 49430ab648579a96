//! Shared per-process state handed to the route handlers.

use anyhow::Result;
use tokio::sync::Mutex;

use seolens_core::fetch;
use seolens_core::llm::{LlmClient, LlmConfig};
use seolens_core::rate_limit::RateLimiter;

pub struct AppState {
    /// Shared client for page, robots.txt and sitemap fetches.
    pub http: reqwest::Client,
    /// Chat-completion gateway.
    pub llm: LlmClient,
    /// Per-IP limiter for the AI analysis route. Explicit state, not
    /// a module-level singleton, so handlers stay testable.
    pub limiter: Mutex<RateLimiter>,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        Self::with_llm_config(LlmConfig::from_env())
    }

    pub fn with_llm_config(config: LlmConfig) -> Result<Self> {
        Ok(Self {
            http: fetch::build_client()?,
            llm: LlmClient::new(config)?,
            limiter: Mutex::new(RateLimiter::default()),
        })
    }
}
