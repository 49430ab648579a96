//! Timed HTTP fetching shared by the analysis modules

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// Timeout applied to every outbound fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status: {0}")]
    Status(u16),
}

/// Build the shared HTTP client used for page, robots.txt and sitemap
/// retrieval. Carries a browser-like User-Agent; some origins refuse
/// requests without one.
pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(format!(
            "Mozilla/5.0 (compatible; seolens/{})",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))
}

/// GET a URL and return its body as text. Non-2xx responses are errors;
/// a timeout surfaces as [`FetchError::Request`], never a panic.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))
}
