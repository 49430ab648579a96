//! # seolens-core
//!
//! Core library for the seolens SEO analysis tools.
//!
//! This library provides:
//! - Sitemap discovery via robots.txt directives and well-known paths,
//!   with bounded expansion of sitemap-index documents
//! - On-page SEO heuristics (title, meta description, headings, image
//!   alt coverage, HTTPS)
//! - JSON-LD extraction and validation through JSON-LD expansion
//! - An OpenAI chat-completion gateway with fixed prompt templates,
//!   including a streaming variant
//! - A best-effort parser for the AI optimization output format
//! - An in-memory, capacity-bounded rate limiter
//!
//! ## Example
//!
//! ```no_run
//! use seolens_core::{fetch, sitemap};
//!
//! # async fn example() -> Result<(), seolens_core::fetch::FetchError> {
//! let client = fetch::build_client()?;
//! let sitemaps = sitemap::discover_sitemaps(&client, "example.com").await;
//! println!("found {} sitemaps", sitemaps.len());
//! # Ok(())
//! # }
//! ```

pub mod fetch;
pub mod llm;
pub mod optimize;
pub mod rate_limit;
pub mod robots;
pub mod seo;
pub mod sitemap;
pub mod structured_data;
pub mod url_utils;

pub use fetch::{FetchError, build_client, fetch_text};
pub use llm::{LlmClient, LlmConfig, LlmError};
pub use optimize::{OptimizationSuggestion, ParsedOptimization, parse_optimization_text};
pub use rate_limit::RateLimiter;
pub use seo::{CheckStatus, SeoReport, analyze_page};
pub use sitemap::{MAX_SITEMAPS, SitemapSet, discover_sitemaps};
pub use structured_data::{ValidationOutcome, validate_structured_data};
pub use url_utils::ensure_scheme;
