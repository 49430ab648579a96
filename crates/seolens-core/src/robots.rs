//! robots.txt retrieval and `Sitemap:` directive extraction

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::fetch::{self, FetchError};
use crate::url_utils::ensure_scheme;

static SITEMAP_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*sitemap\s*:\s*(\S+)").expect("invalid directive regex"));

/// Resolve the robots.txt location for a URL or bare domain.
pub fn robots_txt_url(input: &str) -> Result<String, FetchError> {
    let base = ensure_scheme(input);
    let parsed =
        Url::parse(&base).map_err(|e| FetchError::Request(format!("invalid URL: {e}")))?;
    let robots = parsed
        .join("/robots.txt")
        .map_err(|e| FetchError::Request(format!("invalid URL: {e}")))?;
    Ok(robots.to_string())
}

/// Fetch the robots.txt of the given site.
pub async fn fetch_robots_txt(client: &Client, input: &str) -> Result<String, FetchError> {
    let url = robots_txt_url(input)?;
    fetch::fetch_text(client, &url).await
}

/// Pull every `Sitemap:` directive out of a robots.txt body, in order
/// of appearance. Matching is case-insensitive; values are trimmed.
pub fn extract_sitemap_directives(content: &str) -> Vec<String> {
    SITEMAP_DIRECTIVE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
